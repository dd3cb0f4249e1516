use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::dto::question::Question;

/// Lifecycle phases of a two-party room as seen from one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Room created; the second participant has not arrived yet.
    AwaitingOpponent,
    /// Both participants are in; the local quiz may run.
    Active,
    /// The service declared a winner.
    Complete,
}

/// Which side of the room this device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Created the room and shares its identifier.
    Host,
    /// Joined with an identifier received from the host.
    Guest,
}

/// Events that move a [`RoomSession`] between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Status polling reported the second participant.
    OpponentJoined,
    /// Reconciliation reported a winner.
    WinnerDeclared,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the session was in.
    pub from: SessionPhase,
    /// Rejected event.
    pub event: SessionEvent,
}

/// Client-held mirror of a room. The question set never changes after construction.
#[derive(Debug, Clone)]
pub struct RoomSession {
    session_id: Uuid,
    room_id: String,
    local_player_name: String,
    questions: Arc<[Question]>,
    role: SessionRole,
    phase: SessionPhase,
}

impl RoomSession {
    /// Session for a freshly created room, waiting for the opponent.
    pub fn hosted(room_id: String, local_player_name: String, questions: Vec<Question>) -> Self {
        Self::build(
            room_id,
            local_player_name,
            questions,
            SessionRole::Host,
            SessionPhase::AwaitingOpponent,
        )
    }

    /// Session for a joined room. The opponent is by definition already present.
    pub fn joined(room_id: String, local_player_name: String, questions: Vec<Question>) -> Self {
        Self::build(
            room_id,
            local_player_name,
            questions,
            SessionRole::Guest,
            SessionPhase::Active,
        )
    }

    fn build(
        room_id: String,
        local_player_name: String,
        questions: Vec<Question>,
        role: SessionRole,
        phase: SessionPhase,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            room_id,
            local_player_name,
            questions: questions.into(),
            role,
            phase,
        }
    }

    /// Local identifier used to correlate log lines.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Identifier issued by the Room Service.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Name this device plays under.
    pub fn local_player_name(&self) -> &str {
        &self.local_player_name
    }

    /// Shared, immutable question set.
    pub fn questions(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    /// Whether this device created or joined the room.
    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::AwaitingOpponent, SessionEvent::OpponentJoined) => SessionPhase::Active,
            (SessionPhase::Active, SessionEvent::WinnerDeclared) => SessionPhase::Complete,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        self.phase = next;
        Ok(next)
    }
}
