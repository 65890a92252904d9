//! Training-run records for EEG-classifier validation.
//!
//! Captures cropped-trial datasets, train/test splitting, loss scoring and
//! per-epoch history records in a normalized shape that can be compared
//! against expected results regardless of which trainer produced them.

pub mod dataset;
pub mod record;
pub mod score;
pub mod split;
