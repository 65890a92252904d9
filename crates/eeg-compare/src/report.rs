//! Validation reporting — aggregates per-epoch comparison outcomes into
//! human-readable and machine-readable reports.

use crate::deep::{CompareError, Mismatch, Tolerance, deep_allclose_with};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary of validating a recorded training history against expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Descriptive label (e.g. "cropped training seed=20170629 4 epochs").
    pub label: String,
    /// Highest epoch number seen.
    pub total_epochs: usize,
    /// Epoch of the first mismatch (None = clean run). 1-based.
    pub first_failed_epoch: Option<usize>,
    pub epochs_with_mismatch: usize,
    /// First mismatch per failed epoch.
    pub entries: Vec<EpochEntry>,
}

/// First mismatch found in a single epoch record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochEntry {
    pub epoch: usize,
    pub error: CompareError,
}

impl ValidationReport {
    /// Create a new empty report.
    pub fn new(label: String) -> Self {
        Self {
            label,
            total_epochs: 0,
            first_failed_epoch: None,
            epochs_with_mismatch: 0,
            entries: Vec::new(),
        }
    }

    /// Record the comparison outcome for one epoch.
    pub fn add_epoch(&mut self, epoch: usize, outcome: Result<(), CompareError>) {
        self.total_epochs = self.total_epochs.max(epoch);

        if let Err(error) = outcome {
            self.epochs_with_mismatch += 1;
            if self.first_failed_epoch.is_none() {
                self.first_failed_epoch = Some(epoch);
            }
            self.entries.push(EpochEntry { epoch, error });
        }
    }

    /// True if no epoch had a mismatch.
    pub fn passed(&self) -> bool {
        self.epochs_with_mismatch == 0
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n============================================================");
        println!("Validation Report: {}", self.label);
        println!("Epochs: {}", self.total_epochs);
        println!("Result: {}", if self.passed() { "PASS" } else { "FAIL" });
        println!(
            "Epochs with mismatches: {}/{}",
            self.epochs_with_mismatch, self.total_epochs
        );

        if let Some(epoch) = self.first_failed_epoch {
            println!("First mismatch at epoch {}", epoch);
        }

        // Print first few mismatches
        let show = self.entries.len().min(10);
        if show > 0 {
            println!("\nFirst {} mismatches:", show);
            for entry in &self.entries[..show] {
                println!("  Epoch {}:", entry.epoch);
                println!("    {} [{}]", entry.error.mismatch, entry.error.path_string());
            }
            if self.entries.len() > show {
                println!("  ... and {} more", self.entries.len() - show);
            }
        }

        println!("============================================================\n");
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

/// Compare two epoch sequences one epoch at a time.
///
/// Epoch numbering is 1-based, matching recorded histories. A count
/// mismatch between the sequences is recorded against the first epoch
/// missing from the shorter side.
pub fn validate_epochs(
    label: &str,
    expected: &[Value],
    actual: &[Value],
    tol: Tolerance,
) -> ValidationReport {
    let mut report = ValidationReport::new(label.to_string());

    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        report.add_epoch(i + 1, deep_allclose_with(e, a, tol));
    }

    if expected.len() != actual.len() {
        let shared = expected.len().min(actual.len());
        report.add_epoch(
            shared + 1,
            Err(CompareError {
                mismatch: Mismatch::LengthMismatch {
                    expected: expected.len(),
                    actual: actual.len(),
                },
                path: Vec::new(),
            }),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_run_passes() {
        let epochs = vec![
            json!({"epoch": 1, "train_loss": 2.08}),
            json!({"epoch": 2, "train_loss": 1.45}),
        ];
        let report = validate_epochs("clean", &epochs, &epochs.clone(), Tolerance::default());
        assert!(report.passed());
        assert_eq!(report.total_epochs, 2);
        assert!(report.first_failed_epoch.is_none());
    }

    #[test]
    fn first_failed_epoch_is_recorded() {
        let expected = vec![
            json!({"epoch": 1, "train_loss": 2.08}),
            json!({"epoch": 2, "train_loss": 1.45}),
            json!({"epoch": 3, "train_loss": 1.45}),
        ];
        let mut actual = expected.clone();
        actual[1]["train_loss"] = json!(9.9);
        actual[2]["train_loss"] = json!(9.9);

        let report = validate_epochs("diverged", &expected, &actual, Tolerance::default());
        assert!(!report.passed());
        assert_eq!(report.first_failed_epoch, Some(2));
        assert_eq!(report.epochs_with_mismatch, 2);
        assert_eq!(report.entries[0].error.path_string(), "ROOT -> 'train_loss'");
    }

    #[test]
    fn epoch_count_mismatch_is_reported() {
        let expected = vec![json!({"epoch": 1}), json!({"epoch": 2})];
        let actual = vec![json!({"epoch": 1})];

        let report = validate_epochs("truncated", &expected, &actual, Tolerance::default());
        assert!(!report.passed());
        assert_eq!(report.first_failed_epoch, Some(2));
        assert!(matches!(
            report.entries[0].error.mismatch,
            Mismatch::LengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn report_round_trips_through_json() {
        let expected = vec![json!({"epoch": 1, "valid_loss": 1.0})];
        let actual = vec![json!({"epoch": 1, "valid_loss": 2.0})];
        let report = validate_epochs("json", &expected, &actual, Tolerance::default());

        let parsed: ValidationReport = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(parsed.epochs_with_mismatch, 1);
        assert_eq!(parsed.entries[0].epoch, 1);
    }
}
