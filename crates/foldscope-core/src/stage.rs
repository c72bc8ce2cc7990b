//! Scan lifecycle stages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Phase of a scan, as exposed to progress observers.
///
/// Stages advance strictly forward; `Complete`, `CompletedWithWarnings` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    #[strum(serialize = "Initializing")]
    Initializing,
    #[strum(serialize = "Detecting project type")]
    DetectingProjectType,
    #[strum(serialize = "Counting files")]
    CountingFiles,
    #[strum(serialize = "Analyzing files")]
    AnalyzingFiles,
    #[strum(serialize = "Analysis complete")]
    Complete,
    #[strum(serialize = "Analysis completed with warnings")]
    CompletedWithWarnings,
    #[strum(serialize = "Cancelled")]
    Cancelled,
}

impl Stage {
    /// Check if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Stage::Complete | Stage::CompletedWithWarnings | Stage::Cancelled
        )
    }

    /// Terminal stage for a scan that ran to the end.
    pub fn finished(has_warnings: bool) -> Self {
        if has_warnings {
            Stage::CompletedWithWarnings
        } else {
            Stage::Complete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_terminal_stages() {
        let terminal: Vec<Stage> = Stage::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![Stage::Complete, Stage::CompletedWithWarnings, Stage::Cancelled]
        );
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::CountingFiles.to_string(), "Counting files");
        assert_eq!(
            Stage::finished(true).to_string(),
            "Analysis completed with warnings"
        );
        assert_eq!(Stage::finished(false), Stage::Complete);
    }
}
