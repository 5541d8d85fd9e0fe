use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of a single command run.
///
/// Exported as a number, not a label: 0=fail, 1=warning, 2=success.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Failed,
    Warning,
    Success,
}

impl Status {
    pub fn ordinal(self) -> u8 {
        match self {
            Status::Failed => 0,
            Status::Warning => 1,
            Status::Success => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordinals() {
        assert_eq!(Status::Failed.ordinal(), 0);
        assert_eq!(Status::Warning.ordinal(), 1);
        assert_eq!(Status::Success.ordinal(), 2);
    }

    #[test]
    fn test_status_deserializes_lowercase() {
        let status: Status = serde_json::from_str(r#""warning""#).unwrap();
        assert_eq!(status, Status::Warning);
        assert!(serde_json::from_str::<Status>(r#""Unknown""#).is_err());
    }
}
