//! Deep structural validation for recorded EEG-classifier training runs.
//!
//! Provides tolerance-aware comparison of nested history structures with a
//! root-to-leaf trace to the first mismatch, and per-epoch validation
//! reporting.

pub mod deep;
pub mod report;
