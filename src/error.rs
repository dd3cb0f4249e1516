use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{error::ApiError, kv_store::StoreError},
    dto::room::{ErrorCode, ResponseError},
    state::{lifetime::Cancelled, session::InvalidTransition},
};

/// Errors that can occur in client service operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// User-entered values failed validation; nothing was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The remote service could not be reached or answered garbage.
    #[error("network error")]
    Transport(#[source] ApiError),
    /// The remote service refused the operation.
    #[error("rejected: {message}")]
    Rejected {
        /// Structured reason, when one could be determined.
        code: Option<ErrorCode>,
        /// Message returned by the service.
        message: String,
    },
    /// The response decoded but violates the contract.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The service returned a different question set for an existing room.
    #[error("question set changed for room `{room_id}`")]
    QuestionSetMismatch {
        /// Room whose question set differed.
        room_id: String,
    },
    /// Polling stopped after the configured number of attempts.
    #[error("gave up on `{action}` after {attempts} attempts")]
    PollExhausted {
        /// Wire action that was being polled.
        action: &'static str,
        /// Attempts made.
        attempts: u32,
    },
    /// The owning screen went away before the operation finished.
    #[error("operation cancelled")]
    Cancelled,
    /// The requested level has not been unlocked yet.
    #[error("level {level} is locked (unlocked up to {unlocked})")]
    LevelLocked {
        /// Requested level.
        level: u32,
        /// Highest unlocked level.
        unlocked: u32,
    },
    /// The weekly challenge needs a registered name and email first.
    #[error("no registered challenge identity")]
    NotRegistered,
    /// Operation cannot be performed in the current session state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Local persistence failed.
    #[error("local storage error")]
    Storage(#[source] StoreError),
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Transport(err)
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        ClientError::Storage(err)
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(err: ValidationErrors) -> Self {
        ClientError::InvalidInput(format!("validation failed: {}", err))
    }
}

impl From<ResponseError> for ClientError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Rejected { code, message } => ClientError::Rejected { code, message },
            ResponseError::Malformed(message) => ClientError::MalformedResponse(message),
        }
    }
}

impl From<InvalidTransition> for ClientError {
    fn from(err: InvalidTransition) -> Self {
        ClientError::InvalidState(err.to_string())
    }
}

impl From<Cancelled> for ClientError {
    fn from(_: Cancelled) -> Self {
        ClientError::Cancelled
    }
}

impl ClientError {
    /// Whether a polling loop should back off and try again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(err) if err.is_transient())
    }

    /// Convert the error into the alert shown to the player.
    pub fn alert(&self) -> Alert {
        let message = match self {
            ClientError::InvalidInput(message) => message.clone(),
            ClientError::Transport(_) => {
                "A network error occurred. Please check your connection and try again.".into()
            }
            ClientError::Rejected { code, message } => match code {
                Some(ErrorCode::RoomNotFound) => {
                    "Room not found. Please check the room ID.".into()
                }
                Some(ErrorCode::RoomFull) => "This room already has two players.".into(),
                Some(ErrorCode::NameTaken) => {
                    "A player with this name already exists. Please choose a different username."
                        .into()
                }
                Some(ErrorCode::WeeklyLimitReached) => {
                    "You've already played 10 times. Please come back next week!".into()
                }
                _ => message.clone(),
            },
            ClientError::MalformedResponse(_) | ClientError::QuestionSetMismatch { .. } => {
                "The server sent an unexpected response. Please try again.".into()
            }
            ClientError::PollExhausted { .. } => {
                "Your opponent did not respond in time. Please try again later.".into()
            }
            ClientError::Cancelled => "The operation was cancelled.".into(),
            ClientError::LevelLocked { .. } => {
                return Alert {
                    title: "Locked Level",
                    message: "You must unlock this level by completing the previous one.".into(),
                };
            }
            ClientError::NotRegistered => "Please fill in both name and email.".into(),
            ClientError::InvalidState(message) => message.clone(),
            ClientError::Storage(_) => "Could not access local storage.".into(),
        };

        Alert {
            title: "Error",
            message,
        }
    }
}

/// User-facing alert produced at an operation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Short heading.
    pub title: &'static str,
    /// Body text.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_not_found_alert_is_specific() {
        let err = ClientError::Rejected {
            code: Some(ErrorCode::RoomNotFound),
            message: "nope".into(),
        };
        let alert = err.alert();
        assert_eq!(alert.title, "Error");
        assert!(alert.message.contains("Room not found"));
    }

    #[test]
    fn unknown_rejection_shows_service_message() {
        let err = ClientError::Rejected {
            code: None,
            message: "Room expired".into(),
        };
        assert_eq!(err.alert().message, "Room expired");
    }

    #[test]
    fn only_transport_errors_are_transient() {
        let transport = ClientError::Transport(ApiError::Unavailable {
            action: "checkStatus".into(),
            message: "down".into(),
        });
        assert!(transport.is_transient());
        assert!(!ClientError::Cancelled.is_transient());
        assert!(
            !ClientError::Rejected {
                code: None,
                message: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn encoding_failures_are_not_retried() {
        let source = serde_json::from_str::<u32>("x").unwrap_err();
        let err = ClientError::Transport(ApiError::Encode {
            action: "submitScore".into(),
            source,
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn locked_level_has_its_own_title() {
        let err = ClientError::LevelLocked {
            level: 4,
            unlocked: 2,
        };
        assert_eq!(err.alert().title, "Locked Level");
    }
}
