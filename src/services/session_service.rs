use std::{sync::Arc, time::Duration};

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    dao::room_api::RoomService,
    dto::{
        room::RoomStatus,
        validation::{CreateRoomInput, JoinRoomInput},
    },
    error::ClientError,
    services::polling::{PollPolicy, PollStep, poll_until},
    state::{CancelToken, RoomSession, SessionEvent, SessionPhase},
};

/// Fixed pause between a successful join and the guest's quiz start.
pub const DEFAULT_JOIN_START_DELAY: Duration = Duration::from_secs(3);

/// Timing knobs of the room session flow.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Polling while waiting for the opponent.
    pub opponent_poll: PollPolicy,
    /// Pause between a successful join and the first question.
    pub join_start_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            opponent_poll: PollPolicy::OPPONENT,
            join_start_delay: DEFAULT_JOIN_START_DELAY,
        }
    }
}

/// Creates or joins two-party rooms and waits for the opponent.
#[derive(Clone)]
pub struct SessionClient {
    rooms: Arc<dyn RoomService>,
    settings: SessionSettings,
}

impl SessionClient {
    /// Client for `rooms` with the given timings.
    pub fn new(rooms: Arc<dyn RoomService>, settings: SessionSettings) -> Self {
        Self { rooms, settings }
    }

    /// Open a room. The session starts out waiting for the opponent.
    #[instrument(skip(self))]
    pub async fn create_room(&self, player_name: &str) -> Result<RoomSession, ClientError> {
        CreateRoomInput {
            player_name: player_name.to_string(),
        }
        .validate()?;

        let created = self
            .rooms
            .create(player_name.to_string())
            .await?
            .into_created()?;

        let session = RoomSession::hosted(
            created.room_id,
            player_name.to_string(),
            created.questions,
        );
        info!(
            room_id = %session.room_id(),
            session_id = %session.session_id(),
            questions = session.questions().len(),
            "room created; awaiting opponent"
        );
        Ok(session)
    }

    /// Join an existing room, then hold for the start delay before handing back an
    /// active session. No session exists if the service rejects the join.
    #[instrument(skip(self, cancel))]
    pub async fn join_room(
        &self,
        player_name: &str,
        room_id: &str,
        cancel: &CancelToken,
    ) -> Result<RoomSession, ClientError> {
        JoinRoomInput {
            player_name: player_name.to_string(),
            room_id: room_id.to_string(),
        }
        .validate()?;

        let questions = self
            .rooms
            .join(player_name.to_string(), room_id.to_string())
            .await?
            .into_questions()?;

        info!(room_id, "joined room; starting shortly");
        cancel.sleep(self.settings.join_start_delay).await?;

        Ok(RoomSession::joined(
            room_id.to_string(),
            player_name.to_string(),
            questions,
        ))
    }

    /// Single `checkStatus` round trip.
    pub async fn poll_status(&self, room_id: &str) -> Result<RoomStatus, ClientError> {
        let status = self
            .rooms
            .check_status(room_id.to_string())
            .await?
            .into_status()?;
        Ok(status)
    }

    /// Poll until the second participant arrives, then activate `session`.
    ///
    /// Polling stops as soon as a status reports the opponent. A question set
    /// echoed by the service must match the one received at creation.
    #[instrument(skip_all, fields(room_id = %session.room_id()))]
    pub async fn wait_for_opponent(
        &self,
        session: &mut RoomSession,
        cancel: &CancelToken,
    ) -> Result<(), ClientError> {
        if session.phase() != SessionPhase::AwaitingOpponent {
            return Err(ClientError::InvalidState(format!(
                "cannot wait for an opponent while {:?}",
                session.phase()
            )));
        }

        let room_id = session.room_id().to_string();
        let expected = session.questions();

        poll_until("checkStatus", self.settings.opponent_poll, cancel, |_| {
            let room_id = room_id.clone();
            let expected = expected.clone();
            async move {
                let status = self.poll_status(&room_id).await?;
                if let Some(questions) = &status.questions {
                    if questions.as_slice() != &*expected {
                        warn!(%room_id, "service returned a different question set");
                        return Err(ClientError::QuestionSetMismatch { room_id });
                    }
                }
                Ok(if status.player_joined {
                    PollStep::Done(())
                } else {
                    PollStep::Pending
                })
            }
        })
        .await?;

        session.apply(SessionEvent::OpponentJoined)?;
        info!("opponent joined; session active");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::room::ErrorCode,
        state::{Lifetime, SessionRole},
        stub::rooms::InMemoryRoomService,
    };

    fn settings() -> SessionSettings {
        SessionSettings {
            opponent_poll: PollPolicy {
                interval: Duration::from_secs(15),
                max_attempts: 10,
                max_backoff: Duration::from_secs(60),
            },
            join_start_delay: DEFAULT_JOIN_START_DELAY,
        }
    }

    fn client(rooms: &InMemoryRoomService) -> SessionClient {
        SessionClient::new(Arc::new(rooms.clone()), settings())
    }

    #[tokio::test(start_paused = true)]
    async fn create_then_join_share_questions() {
        let rooms = InMemoryRoomService::new();
        let lifetime = Lifetime::new();

        let host = client(&rooms).create_room("Ross").await.unwrap();
        assert_eq!(host.phase(), SessionPhase::AwaitingOpponent);
        assert_eq!(host.role(), SessionRole::Host);
        assert!(!host.questions().is_empty());

        let guest = client(&rooms)
            .join_room("Rachel", host.room_id(), &lifetime.token())
            .await
            .unwrap();
        assert_eq!(guest.phase(), SessionPhase::Active);
        assert_eq!(&*guest.questions(), &*host.questions());
    }

    #[tokio::test(start_paused = true)]
    async fn join_waits_for_start_delay() {
        let rooms = InMemoryRoomService::new();
        let lifetime = Lifetime::new();
        let host = client(&rooms).create_room("Ross").await.unwrap();

        let started = tokio::time::Instant::now();
        client(&rooms)
            .join_room("Rachel", host.room_id(), &lifetime.token())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), DEFAULT_JOIN_START_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn join_unknown_room_is_rejected() {
        let rooms = InMemoryRoomService::new();
        let lifetime = Lifetime::new();

        let err = client(&rooms)
            .join_room("Rachel", "9999", &lifetime.token())
            .await
            .unwrap_err();

        match &err {
            ClientError::Rejected { code, .. } => assert_eq!(*code, Some(ErrorCode::RoomNotFound)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.alert().message.contains("Room not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn hyphenated_room_id_reaches_service() {
        let rooms = InMemoryRoomService::new();
        let lifetime = Lifetime::new();

        let err = client(&rooms)
            .join_room("Rachel", "a1b2-c3d4", &lifetime.token())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Rejected {
                code: Some(ErrorCode::RoomNotFound),
                ..
            }
        ));
        assert_eq!(rooms.calls("join"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_name_never_reaches_service() {
        let rooms = InMemoryRoomService::new();
        let err = client(&rooms).create_room("  ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert_eq!(rooms.calls("create"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_once_opponent_joins() {
        let rooms = InMemoryRoomService::new();
        let host_client = client(&rooms);
        let mut host = host_client.create_room("Ross").await.unwrap();
        let room_id = host.room_id().to_string();

        let guest_rooms = rooms.clone();
        tokio::spawn(async move {
            // Arrive between the second and third status checks.
            tokio::time::sleep(Duration::from_secs(40)).await;
            let lifetime = Lifetime::new();
            client(&guest_rooms)
                .join_room("Rachel", &room_id, &lifetime.token())
                .await
                .unwrap();
        });

        let lifetime = Lifetime::new();
        host_client
            .wait_for_opponent(&mut host, &lifetime.token())
            .await
            .unwrap();
        assert_eq!(host.phase(), SessionPhase::Active);
        assert_eq!(rooms.calls("checkStatus"), 3);

        // No further status checks once the opponent is in.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(rooms.calls("checkStatus"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_leaves_session_waiting() {
        let rooms = InMemoryRoomService::new();
        let host_client = client(&rooms);
        let mut host = host_client.create_room("Ross").await.unwrap();

        let lifetime = Lifetime::new();
        let handle = lifetime.handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(20)).await;
            handle.cancel();
        });

        let err = host_client
            .wait_for_opponent(&mut host, &lifetime.token())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(host.phase(), SessionPhase::AwaitingOpponent);
        assert_eq!(rooms.calls("checkStatus"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn outage_during_polling_is_retried() {
        let rooms = InMemoryRoomService::new();
        let host_client = client(&rooms);
        let mut host = host_client.create_room("Ross").await.unwrap();
        rooms.fail_next(2);

        let guest_rooms = rooms.clone();
        let room_id = host.room_id().to_string();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(100)).await;
            let lifetime = Lifetime::new();
            client(&guest_rooms)
                .join_room("Rachel", &room_id, &lifetime.token())
                .await
                .unwrap();
        });

        let lifetime = Lifetime::new();
        host_client
            .wait_for_opponent(&mut host, &lifetime.token())
            .await
            .unwrap();
        assert_eq!(host.phase(), SessionPhase::Active);
    }
}
