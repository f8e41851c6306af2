use reelvault_common::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a publish job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStage {
    Compressing,
    Uploading,
    Publishing,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compressing => write!(f, "compressing"),
            Self::Uploading => write!(f, "uploading"),
            Self::Publishing => write!(f, "publishing"),
        }
    }
}

/// Status events emitted by a publish run.
///
/// A run's stream terminates with `Published` or `Aborted`. An abort at
/// the publishing stage carries the already-known `remote_file_id`: the
/// remote object exists but is unregistered, and a caller can retry
/// registration without re-uploading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    Compressing {
        attempt: u32,
        progress: f32,
    },
    Uploading {
        uploaded: u64,
        total: u64,
        percent: f32,
    },
    Publishing {
        file_id: FileId,
    },
    Published {
        file_id: FileId,
    },
    Aborted {
        stage: PublishStage,
        reason: String,
        remote_file_id: Option<FileId>,
    },
}

impl PublishStatus {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published { .. } | Self::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PublishStatus::Published {
            file_id: FileId::new("abc")
        }
        .is_terminal());
        assert!(PublishStatus::Aborted {
            stage: PublishStage::Uploading,
            reason: "network".into(),
            remote_file_id: None,
        }
        .is_terminal());
        assert!(!PublishStatus::Compressing {
            attempt: 1,
            progress: 0.5
        }
        .is_terminal());
    }

    #[test]
    fn test_status_serialization_tags() {
        let status = PublishStatus::Aborted {
            stage: PublishStage::Publishing,
            reason: "rpc unreachable".into(),
            remote_file_id: Some(FileId::new("abc")),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["stage"], "publishing");
        assert_eq!(json["remote_file_id"], "abc");
    }
}
