//! Leading/trailing train-test splitting of trial sets.

use crate::dataset::TrialSet;
use ndarray::s;
use thiserror::Error;

/// How many leading trials go to the training side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainSize {
    /// Absolute number of training trials.
    Trials(usize),
    /// Fraction of the set, truncated to whole trials.
    Fraction(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("train size {requested} exceeds {available} trials")]
    TooManyTrials { requested: usize, available: usize },
    #[error("train fraction {0} outside [0, 1]")]
    FractionOutOfRange(f64),
}

impl TrainSize {
    /// Resolve to a number of leading training trials out of `n_trials`.
    pub fn resolve(&self, n_trials: usize) -> Result<usize, SplitError> {
        match *self {
            TrainSize::Trials(n) if n <= n_trials => Ok(n),
            TrainSize::Trials(n) => Err(SplitError::TooManyTrials {
                requested: n,
                available: n_trials,
            }),
            TrainSize::Fraction(f) if (0.0..=1.0).contains(&f) => Ok((f * n_trials as f64) as usize),
            TrainSize::Fraction(f) => Err(SplitError::FractionOutOfRange(f)),
        }
    }
}

/// Split into leading training trials and trailing validation trials.
pub fn train_test_split(
    set: &TrialSet,
    size: TrainSize,
) -> Result<(TrialSet, TrialSet), SplitError> {
    let n_train = size.resolve(set.len())?;

    let train = TrialSet::from_parts(
        set.data().slice(s![..n_train, .., ..]).to_owned(),
        set.labels()[..n_train].to_vec(),
    );
    let valid = TrialSet::from_parts(
        set.data().slice(s![n_train.., .., ..]).to_owned(),
        set.labels()[n_train..].to_vec(),
    );
    Ok((train, valid))
}
