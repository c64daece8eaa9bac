use serde::{Deserialize, Serialize};

/// Ordered lines captured from one run.
pub type Transcript = Vec<String>;

/// Result of one run: the transcript, or a single error message. A failed run
/// never carries the output it produced before failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success { transcript: Transcript },
    Failure { message: String },
}

impl Outcome {
    pub fn success(transcript: Transcript) -> Self {
        Outcome::Success { transcript }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn transcript(&self) -> Option<&[String]> {
        match self {
            Outcome::Success { transcript } => Some(transcript),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { message } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = Outcome::success(vec!["a".to_string()]);
        assert!(ok.is_success());
        assert_eq!(ok.transcript(), Some(&["a".to_string()][..]));
        assert!(ok.error().is_none());

        let failed = Outcome::failure("boom");
        assert!(!failed.is_success());
        assert!(failed.transcript().is_none());
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(Outcome::failure("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "failure", "message": "boom" }));

        let json = serde_json::to_string(&Outcome::success(vec!["42".into()])).unwrap();
        let parsed: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.transcript(), Some(&["42".to_string()][..]));
    }
}
