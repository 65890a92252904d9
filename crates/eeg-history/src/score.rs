//! Loss aggregation and best-so-far tracking.

use ndarray::{Array2, Array3, Axis};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("prediction tensor has an empty batch axis")]
    EmptyBatch,
    #[error("prediction tensor has an empty time axis")]
    EmptyTimeAxis,
    #[error("{targets} targets for a batch of {batch}")]
    TargetCountMismatch { targets: usize, batch: usize },
    #[error("target class {class} out of range for {classes} classes")]
    ClassOutOfRange { class: usize, classes: usize },
}

/// Batch-size-weighted mean loss: `sum(loss_i * size_i) / sum(size_i)`.
///
/// Returns `None` when there are no batches (or only empty ones).
pub fn weighted_mean_loss<I>(batches: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, usize)>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    for (loss, size) in batches {
        total += loss * size as f64;
        count += size;
    }
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Mean of per-timestep log-probabilities over the time axis:
/// `[batch, classes, time]` -> `[batch, classes]`.
pub fn mean_over_time(log_probs: &Array3<f64>) -> Result<Array2<f64>, ScoreError> {
    log_probs
        .mean_axis(Axis(2))
        .ok_or(ScoreError::EmptyTimeAxis)
}

/// Negative log-likelihood over time-averaged log-probabilities, averaged
/// across the batch.
///
/// `log_probs` is `[batch, classes, time]` with one target class per
/// batch entry.
pub fn cropped_nll_loss(log_probs: &Array3<f64>, targets: &[usize]) -> Result<f64, ScoreError> {
    let (batch, classes, _time) = log_probs.dim();
    if batch == 0 {
        return Err(ScoreError::EmptyBatch);
    }
    if targets.len() != batch {
        return Err(ScoreError::TargetCountMismatch {
            targets: targets.len(),
            batch,
        });
    }

    let mean = mean_over_time(log_probs)?;
    let mut total = 0.0;
    for (i, &class) in targets.iter().enumerate() {
        if class >= classes {
            return Err(ScoreError::ClassOutOfRange { class, classes });
        }
        total -= mean[[i, class]];
    }
    Ok(total / batch as f64)
}

/// Tracks the best value of a metric across epochs.
///
/// The first observation is always best; later observations only when
/// strictly better in the tracked direction. Ties are not best.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestTracker {
    lower_is_better: bool,
    best: Option<f64>,
}

impl BestTracker {
    pub fn new(lower_is_better: bool) -> Self {
        Self {
            lower_is_better,
            best: None,
        }
    }

    /// Record `value`; returns whether it is a new best.
    pub fn observe(&mut self, value: f64) -> bool {
        let improved = match self.best {
            None => true,
            Some(best) if self.lower_is_better => value < best,
            Some(best) => value > best,
        };
        if improved {
            self.best = Some(value);
        }
        improved
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}
