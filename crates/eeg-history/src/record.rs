//! Training history records.
//!
//! Captures a normalized view of one training run — per-batch losses within
//! each epoch, per-epoch weighted aggregates, scoring-callback metrics and
//! best-so-far flags — in the flat shape expected-results fixtures use,
//! regardless of which trainer produced the run.

use crate::score::{BestTracker, weighted_mean_loss};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("epoch {epoch} has no train batches")]
    NoTrainBatches { epoch: usize },
    #[error("epoch {epoch} has no validation batches")]
    NoValidBatches { epoch: usize },
}

/// One train step or validation pass within an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Train {
        #[serde(rename = "train_loss")]
        loss: f64,
        #[serde(rename = "train_batch_size")]
        batch_size: usize,
    },
    Valid {
        #[serde(rename = "valid_loss")]
        loss: f64,
        #[serde(rename = "valid_batch_size")]
        batch_size: usize,
    },
}

/// Aggregated record of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub batches: Vec<BatchRecord>,
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_batch_count: usize,
    pub valid_batch_count: usize,
    /// Batch-size-weighted mean train loss for the epoch.
    pub train_loss: f64,
    pub train_loss_best: bool,
    pub valid_loss: f64,
    pub valid_loss_best: bool,
    /// Wall-clock duration in seconds. Stripped before comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dur: Option<f64>,
    /// Scoring-callback metrics and their `_best` flags, e.g.
    /// `train_trial_accuracy` / `train_trial_accuracy_best`.
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Value>,
}

/// A completed training run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochRecord>,
}

impl History {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// JSON view of the epoch records.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.epochs)
    }

    /// JSON view with wall-clock durations stripped, the shape used for
    /// comparison against expected results.
    pub fn to_value_without_dur(&self) -> Result<Value, serde_json::Error> {
        let stripped: Vec<EpochRecord> = self
            .epochs
            .iter()
            .cloned()
            .map(|mut record| {
                record.dur = None;
                record
            })
            .collect();
        serde_json::to_value(stripped)
    }
}

/// Accumulates batch records and staged metrics, emitting one
/// [`EpochRecord`] per [`end_epoch`](HistoryRecorder::end_epoch) call.
///
/// Best-so-far flags follow the run: the first epoch is always best, later
/// epochs only when strictly better than every epoch before them.
#[derive(Debug)]
pub struct HistoryRecorder {
    epochs: Vec<EpochRecord>,
    current: Vec<BatchRecord>,
    staged_metrics: Vec<(String, f64, bool)>,
    train_loss_best: BestTracker,
    valid_loss_best: BestTracker,
    metric_trackers: BTreeMap<String, BestTracker>,
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self {
            epochs: Vec::new(),
            current: Vec::new(),
            staged_metrics: Vec::new(),
            train_loss_best: BestTracker::new(true),
            valid_loss_best: BestTracker::new(true),
            metric_trackers: BTreeMap::new(),
        }
    }

    /// Record one optimizer step of the current epoch.
    pub fn record_train_batch(&mut self, loss: f64, batch_size: usize) {
        self.current.push(BatchRecord::Train { loss, batch_size });
    }

    /// Record one validation pass of the current epoch.
    pub fn record_valid_batch(&mut self, loss: f64, batch_size: usize) {
        self.current.push(BatchRecord::Valid { loss, batch_size });
    }

    /// Stage a scoring-callback value for the current epoch.
    ///
    /// `lower_is_better` fixes the direction of the metric's `_best`
    /// comparison the first time the metric is seen.
    pub fn record_metric(&mut self, name: &str, value: f64, lower_is_better: bool) {
        self.staged_metrics
            .push((name.to_string(), value, lower_is_better));
    }

    /// Close the current epoch: compute weighted losses, resolve best
    /// flags, and append the epoch record.
    pub fn end_epoch(&mut self) -> Result<(), HistoryError> {
        let epoch = self.epochs.len() + 1;

        let train_batches: Vec<(f64, usize)> = self
            .current
            .iter()
            .filter_map(|batch| match *batch {
                BatchRecord::Train { loss, batch_size } => Some((loss, batch_size)),
                BatchRecord::Valid { .. } => None,
            })
            .collect();
        let valid_batches: Vec<(f64, usize)> = self
            .current
            .iter()
            .filter_map(|batch| match *batch {
                BatchRecord::Valid { loss, batch_size } => Some((loss, batch_size)),
                BatchRecord::Train { .. } => None,
            })
            .collect();

        let train_loss = weighted_mean_loss(train_batches.iter().copied())
            .ok_or(HistoryError::NoTrainBatches { epoch })?;
        let valid_loss = weighted_mean_loss(valid_batches.iter().copied())
            .ok_or(HistoryError::NoValidBatches { epoch })?;

        let mut metrics = BTreeMap::new();
        for (name, value, lower_is_better) in self.staged_metrics.drain(..) {
            let tracker = self
                .metric_trackers
                .entry(name.clone())
                .or_insert_with(|| BestTracker::new(lower_is_better));
            let best = tracker.observe(value);
            metrics.insert(format!("{}_best", name), Value::from(best));
            metrics.insert(name, Value::from(value));
        }

        let record = EpochRecord {
            batches: std::mem::take(&mut self.current),
            epoch,
            train_batch_count: train_batches.len(),
            valid_batch_count: valid_batches.len(),
            train_loss,
            train_loss_best: self.train_loss_best.observe(train_loss),
            valid_loss,
            valid_loss_best: self.valid_loss_best.observe(valid_loss),
            dur: None,
            metrics,
        };
        self.epochs.push(record);
        Ok(())
    }

    pub fn epochs(&self) -> &[EpochRecord] {
        &self.epochs
    }

    pub fn finish(self) -> History {
        History {
            epochs: self.epochs,
        }
    }
}
