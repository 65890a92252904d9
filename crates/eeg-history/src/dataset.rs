//! Cropped-trial datasets.
//!
//! A trial set holds `[trials, channels, samples]` data with one label per
//! trial. Crops index a time window of a single trial, the unit a cropped
//! training iterator feeds to the model.

use ndarray::{Array3, ArrayView2, s};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("{labels} labels for {trials} trials")]
    LabelCountMismatch { labels: usize, trials: usize },
    #[error("trial {trial} out of range ({trials} trials)")]
    TrialOutOfRange { trial: usize, trials: usize },
    #[error("crop {start}..{stop} out of range for {samples} samples")]
    CropOutOfRange {
        start: usize,
        stop: usize,
        samples: usize,
    },
}

/// EEG trials with one label each.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSet {
    data: Array3<f32>,
    labels: Vec<i64>,
}

impl TrialSet {
    /// Build a trial set from `[trials, channels, samples]` data.
    pub fn new(data: Array3<f32>, labels: Vec<i64>) -> Result<Self, DatasetError> {
        if labels.len() != data.shape()[0] {
            return Err(DatasetError::LabelCountMismatch {
                labels: labels.len(),
                trials: data.shape()[0],
            });
        }
        Ok(Self { data, labels })
    }

    // shape equality already established by the caller
    pub(crate) fn from_parts(data: Array3<f32>, labels: Vec<i64>) -> Self {
        Self { data, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn n_samples(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Time window `start..stop` of one trial, shape
    /// `[channels, stop - start]`, with the trial's label.
    pub fn crop(
        &self,
        trial: usize,
        start: usize,
        stop: usize,
    ) -> Result<(ArrayView2<'_, f32>, i64), DatasetError> {
        if trial >= self.len() {
            return Err(DatasetError::TrialOutOfRange {
                trial,
                trials: self.len(),
            });
        }
        if start > stop || stop > self.n_samples() {
            return Err(DatasetError::CropOutOfRange {
                start,
                stop,
                samples: self.n_samples(),
            });
        }
        Ok((
            self.data.slice(s![trial, .., start..stop]),
            self.labels[trial],
        ))
    }
}
