use serde::Serialize;

/// Pipeline stage of a session.
///
/// `Structured` is the hold state between structuring and generation while
/// no template has been chosen. `Error` is left only through a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Parsing,
    Structuring,
    Structured,
    Generating,
    Complete,
    Error,
}

impl Stage {
    /// Progress reported on entering the stage. `Error` keeps the last value.
    pub fn progress(self) -> Option<u8> {
        match self {
            Stage::Idle => Some(0),
            Stage::Parsing => Some(10),
            Stage::Structuring => Some(33),
            Stage::Structured => Some(66),
            Stage::Generating => Some(80),
            Stage::Complete => Some(100),
            Stage::Error => None,
        }
    }

    /// A background task is working on the session.
    pub fn is_busy(self) -> bool {
        matches!(self, Stage::Parsing | Stage::Structuring | Stage::Generating)
    }

    /// A template chosen now is only recorded; generation starts later.
    pub fn accepts_early_template(self) -> bool {
        matches!(self, Stage::Idle | Stage::Parsing | Stage::Structuring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_increases_along_the_happy_path() {
        let path = [
            Stage::Idle,
            Stage::Parsing,
            Stage::Structuring,
            Stage::Structured,
            Stage::Generating,
            Stage::Complete,
        ];
        let values: Vec<u8> = path.iter().filter_map(|s| s.progress()).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(values.last(), Some(&100));
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Stage::Structured).unwrap(),
            serde_json::json!("structured")
        );
    }
}
