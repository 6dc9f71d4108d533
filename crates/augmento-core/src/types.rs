//! Core data types reported by an augmentation run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One saved augmented image, as written to `manifest.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedRecord {
    /// Image id assigned at load time
    pub id: u64,

    /// Input the image was loaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Path the augmented image was written to
    pub output: PathBuf,

    pub width: u32,
    pub height: u32,

    /// Operations applied, oldest first
    pub history: Vec<String>,
}

/// Counters for a finished controller run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Path × iteration tasks enqueued
    pub total_tasks: usize,

    /// Tasks that produced an augmented image
    pub augmented: usize,

    /// Tasks that failed to load or augment
    pub failed: usize,

    /// Images written by the sink
    pub saved: usize,

    /// Images the sink failed to write
    pub save_failed: usize,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Saved images per second over the whole run.
    pub fn images_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.saved as f64 / secs
        } else {
            0.0
        }
    }

    /// True when every task was augmented and saved.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.save_failed == 0 && self.saved == self.total_tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_skips_missing_source() {
        let record = AugmentedRecord {
            id: 3,
            source: None,
            output: PathBuf::from("out/image_3.png"),
            width: 10,
            height: 8,
            history: vec!["Reflect: horizontal".to_string()],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("source"));
        assert!(json.contains("\"history\":[\"Reflect: horizontal\"]"));

        let back: AugmentedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, 3);
    }

    #[test]
    fn test_summary_rate_and_cleanliness() {
        let summary = RunSummary {
            total_tasks: 4,
            augmented: 4,
            saved: 4,
            elapsed: Duration::from_secs(2),
            ..RunSummary::default()
        };
        assert!((summary.images_per_second() - 2.0).abs() < 1e-9);
        assert!(summary.is_clean());

        let empty = RunSummary::default();
        assert_eq!(empty.images_per_second(), 0.0);
    }
}
