//! JSON contract of the Room Service: one endpoint, action-discriminated bodies.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::dto::question::Question;

/// Request body POSTed to the Room Service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RoomRequest {
    /// Open a new room owned by `player_name`.
    Create {
        /// Name of the room creator.
        player_name: String,
    },
    /// Join an existing room as the second participant.
    Join {
        /// Name of the joining player.
        player_name: String,
        /// Room to join.
        room_id: String,
    },
    /// Ask whether the second participant has arrived.
    CheckStatus {
        /// Room to inspect.
        room_id: String,
    },
    /// Report a final score, also used to poll for the winner.
    SubmitScore {
        /// Room the score belongs to.
        room_id: String,
        /// Player reporting the score.
        player_name: String,
        /// Final score of the local run.
        score: u32,
    },
}

impl RoomRequest {
    /// Wire name of the action, used for logging and error context.
    pub fn action(&self) -> &'static str {
        match self {
            RoomRequest::Create { .. } => "create",
            RoomRequest::Join { .. } => "join",
            RoomRequest::CheckStatus { .. } => "checkStatus",
            RoomRequest::SubmitScore { .. } => "submitScore",
        }
    }
}

/// Structured rejection codes. Unrecognised codes decode as [`ErrorCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The room identifier does not exist.
    RoomNotFound,
    /// The room already has two participants.
    RoomFull,
    /// The chosen player name is already registered.
    NameTaken,
    /// The weekly challenge attempt allowance is used up.
    WeeklyLimitReached,
    /// The request was rejected as invalid.
    InvalidRequest,
    /// A code this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Optional human-readable message and structured code attached to a response.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMessage {
    /// Free-text explanation.
    pub message: Option<String>,
    /// Structured rejection code.
    pub code: Option<ErrorCode>,
}

impl ServiceMessage {
    /// Build a rejection carrying both a code and a message.
    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            code: Some(code),
        }
    }

    /// Resolve the rejection code, falling back to the legacy message patterns
    /// for services that only send free text.
    pub fn rejection_code(&self) -> Option<ErrorCode> {
        self.code
            .or_else(|| self.message.as_deref().and_then(legacy_code))
    }
}

/// Map the free-text messages older deployments send to a structured code.
fn legacy_code(message: &str) -> Option<ErrorCode> {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("already has two players") || lowered.contains("room is full") {
        Some(ErrorCode::RoomFull)
    } else if lowered.contains("not found") {
        Some(ErrorCode::RoomNotFound)
    } else if lowered.contains("already exist") {
        Some(ErrorCode::NameTaken)
    } else if lowered.contains("already played 10 times") {
        Some(ErrorCode::WeeklyLimitReached)
    } else {
        None
    }
}

/// Failure to turn a decoded response into a usable outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// The service answered `success: false`.
    #[error("rejected by service: {message}")]
    Rejected {
        /// Structured reason, when one could be determined.
        code: Option<ErrorCode>,
        /// Message returned by the service, or a fallback.
        message: String,
    },
    /// The response decoded but is missing required data.
    #[error("malformed response: {0}")]
    Malformed(String),
}

fn ensure_success(
    success: bool,
    status: ServiceMessage,
    fallback: &str,
) -> Result<(), ResponseError> {
    if success {
        return Ok(());
    }
    let code = status.rejection_code();
    Err(ResponseError::Rejected {
        code,
        message: status.message.unwrap_or_else(|| fallback.to_string()),
    })
}

fn check_questions(questions: &[Question]) -> Result<(), ResponseError> {
    if questions.is_empty() {
        return Err(ResponseError::Malformed("question set is empty".into()));
    }
    questions
        .iter()
        .try_for_each(Question::check)
        .map_err(ResponseError::Malformed)
}

/// One participant's reported score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    /// Player name.
    pub name: String,
    /// Reported score.
    pub score: u32,
}

/// Response to [`RoomRequest::Create`].
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Whether the service accepted the request.
    pub success: bool,
    /// Identifier of the new room.
    pub room_id: Option<String>,
    /// Question set shared by both participants.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Rejection details.
    #[serde(flatten)]
    pub status: ServiceMessage,
}

/// Room identifier and question set handed out on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    /// Identifier of the new room.
    pub room_id: String,
    /// Question set shared by both participants.
    pub questions: Vec<Question>,
}

impl CreateRoomResponse {
    /// Validate the response and extract the created room.
    pub fn into_created(self) -> Result<CreatedRoom, ResponseError> {
        ensure_success(self.success, self.status, "failed to create room")?;
        let room_id = self
            .room_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ResponseError::Malformed("missing roomId".into()))?;
        check_questions(&self.questions)?;
        Ok(CreatedRoom {
            room_id,
            questions: self.questions,
        })
    }
}

/// Response to [`RoomRequest::Join`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    /// Whether the service accepted the request.
    pub success: bool,
    /// Question set shared by both participants.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Rejection details.
    #[serde(flatten)]
    pub status: ServiceMessage,
}

impl JoinRoomResponse {
    /// Validate the response and extract the shared question set.
    pub fn into_questions(self) -> Result<Vec<Question>, ResponseError> {
        ensure_success(self.success, self.status, "failed to join room")?;
        check_questions(&self.questions)?;
        Ok(self.questions)
    }
}

/// Response to [`RoomRequest::CheckStatus`].
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether the service accepted the request.
    pub success: bool,
    /// Whether the second participant has arrived.
    #[serde(default)]
    pub player_joined: bool,
    /// Question set, when the service echoes it.
    pub questions: Option<Vec<Question>>,
    /// Rejection details.
    #[serde(flatten)]
    pub status: ServiceMessage,
}

/// Whether the opponent arrived, plus the question set if the service echoed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStatus {
    /// Whether the second participant has arrived.
    pub player_joined: bool,
    /// Question set, when the service echoes it.
    pub questions: Option<Vec<Question>>,
}

impl StatusResponse {
    /// Validate the response and extract the room status.
    pub fn into_status(self) -> Result<RoomStatus, ResponseError> {
        ensure_success(self.success, self.status, "failed to check room status")?;
        let questions = self.questions.filter(|questions| !questions.is_empty());
        if let Some(questions) = &questions {
            check_questions(questions)?;
        }
        Ok(RoomStatus {
            player_joined: self.player_joined,
            questions,
        })
    }
}

/// Response to [`RoomRequest::SubmitScore`].
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreResponse {
    /// Whether the service accepted the request.
    pub success: bool,
    /// Scores reported so far.
    #[serde(default)]
    pub players: Vec<PlayerScore>,
    /// Winner, once both scores are in.
    pub winner: Option<String>,
    /// Rejection details.
    #[serde(flatten)]
    pub status: ServiceMessage,
}

/// Scores reported so far and the winner, once the service has declared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// Scores reported so far.
    pub players: Vec<PlayerScore>,
    /// Winner, once both scores are in.
    pub winner: Option<String>,
}

impl SubmitScoreResponse {
    /// Validate the response and extract the standings. An empty winner string
    /// counts as no winner yet.
    pub fn into_standings(self) -> Result<Standings, ResponseError> {
        ensure_success(self.success, self.status, "failed to submit score")?;
        if let Some(player) = self.players.iter().find(|p| p.name.trim().is_empty()) {
            return Err(ResponseError::Malformed(format!(
                "player entry with empty name (score {})",
                player.score
            )));
        }
        Ok(Standings {
            players: self.players,
            winner: self.winner.filter(|winner| !winner.trim().is_empty()),
        })
    }
}
