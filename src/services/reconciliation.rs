use std::{sync::Arc, time::SystemTime};

use tracing::{info, instrument};

use crate::{
    dao::room_api::RoomService,
    dto::{
        format_system_time,
        room::{PlayerScore, Standings},
    },
    error::ClientError,
    services::polling::{PollPolicy, PollStep, poll_until},
    state::{CancelToken, RoomSession, SessionEvent, SessionPhase},
};

/// Final outcome of a two-party match as reported by the Room Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Winner exactly as the service named it.
    pub winner: String,
    /// Every reported score, in service order.
    pub players: Vec<PlayerScore>,
    /// When this client learned the result.
    pub decided_at: SystemTime,
    /// Whether the winner is the local player.
    pub local_player_won: bool,
}

impl MatchResult {
    /// Human-readable timestamp of the decision.
    pub fn decided_at_display(&self) -> String {
        format_system_time(self.decided_at)
    }

    /// Score reported for `name`, if any.
    pub fn score_of(&self, name: &str) -> Option<u32> {
        self.players
            .iter()
            .find(|player| player.name == name)
            .map(|player| player.score)
    }
}

/// Submits a final score and waits for the service to name a winner.
#[derive(Clone)]
pub struct ReconciliationClient {
    rooms: Arc<dyn RoomService>,
    policy: PollPolicy,
}

impl ReconciliationClient {
    /// Client polling `rooms` for the winner under `policy`.
    pub fn new(rooms: Arc<dyn RoomService>, policy: PollPolicy) -> Self {
        Self { rooms, policy }
    }

    /// One `submitScore` round trip.
    pub async fn submit_score(
        &self,
        session: &RoomSession,
        score: u32,
    ) -> Result<Standings, ClientError> {
        let standings = self
            .rooms
            .submit_score(
                session.room_id().to_string(),
                session.local_player_name().to_string(),
                score,
            )
            .await?
            .into_standings()?;
        Ok(standings)
    }

    /// Report `score` and wait until the service declares a winner.
    ///
    /// The contract has no separate result action, so pending results are polled
    /// by re-sending the identical submission. The session moves to `Complete`
    /// once a winner arrives.
    #[instrument(skip_all, fields(room_id = %session.room_id(), score = score))]
    pub async fn submit_and_await(
        &self,
        session: &mut RoomSession,
        score: u32,
        cancel: &CancelToken,
    ) -> Result<MatchResult, ClientError> {
        if session.phase() != SessionPhase::Active {
            return Err(ClientError::InvalidState(format!(
                "cannot submit a score while {:?}",
                session.phase()
            )));
        }

        let first = self.submit_score(session, score).await?;
        let standings = if first.winner.is_some() {
            first
        } else {
            info!("score submitted; waiting for opponent result");
            let snapshot = &*session;
            poll_until("submitScore", self.policy, cancel, |_| async move {
                let standings = self.submit_score(snapshot, score).await?;
                Ok(if standings.winner.is_some() {
                    PollStep::Done(standings)
                } else {
                    PollStep::Pending
                })
            })
            .await?
        };

        let Standings { players, winner } = standings;
        let winner = winner.ok_or_else(|| {
            ClientError::MalformedResponse("standings without a winner".into())
        })?;

        session.apply(SessionEvent::WinnerDeclared)?;
        let result = MatchResult {
            local_player_won: winner == session.local_player_name(),
            winner,
            players,
            decided_at: SystemTime::now(),
        };
        info!(
            winner = %result.winner,
            decided_at = %result.decided_at_display(),
            "match decided"
        );
        Ok(result)
    }
}
