//! In-memory Room Service speaking the same contract as the real backend.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, FutureExt, ready};
use indexmap::IndexMap;
use rand::{Rng, rng};
use tracing::{debug, info};

use crate::{
    dao::{
        error::{ApiError, ApiResult},
        room_api::RoomService,
    },
    dto::{
        question::{OptionsQuestion, Question},
        room::{
            CreateRoomResponse, ErrorCode, JoinRoomResponse, PlayerScore, RoomRequest,
            ServiceMessage, StatusResponse, SubmitScoreResponse,
        },
    },
};

/// Participants a room accepts.
pub const ROOM_CAPACITY: usize = 2;

struct Room {
    questions: Vec<Question>,
    /// Participants in arrival order with their first reported score.
    players: IndexMap<String, Option<u32>>,
}

impl Room {
    fn standings(&self) -> Vec<PlayerScore> {
        self.players
            .iter()
            .filter_map(|(name, score)| {
                score.map(|score| PlayerScore {
                    name: name.clone(),
                    score,
                })
            })
            .collect()
    }

    /// Highest score once everyone reported. Ties go to the earlier arrival.
    fn winner(&self) -> Option<String> {
        if self.players.len() < ROOM_CAPACITY || self.players.values().any(Option::is_none) {
            return None;
        }
        let mut best: Option<(&String, u32)> = None;
        for (name, score) in &self.players {
            let score = score.unwrap_or_default();
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name.clone())
    }
}

#[derive(Default)]
struct Inner {
    rooms: DashMap<String, Room>,
    calls: DashMap<&'static str, u32>,
    failures: AtomicU32,
    question_set: Vec<Question>,
}

/// Deterministic stand-in for the Room Service, shared by both participants in
/// tests and served over HTTP by the stub server.
#[derive(Clone)]
pub struct InMemoryRoomService {
    inner: Arc<Inner>,
}

impl Default for InMemoryRoomService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomService {
    /// Service handing out the bundled multiplayer question set.
    pub fn new() -> Self {
        Self::with_questions(default_question_set())
    }

    /// Service handing out `questions` to every new room.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            inner: Arc::new(Inner {
                question_set: questions,
                ..Inner::default()
            }),
        }
    }

    /// Make the next `count` requests fail as if the network were down.
    pub fn fail_next(&self, count: u32) {
        self.inner.failures.store(count, Ordering::SeqCst);
    }

    /// Requests received so far for `action`, failed ones included.
    pub fn calls(&self, action: &str) -> u32 {
        self.inner
            .calls
            .get(action)
            .map(|count| *count)
            .unwrap_or_default()
    }

    /// Answer `request` as the backend would.
    pub fn handle(&self, request: RoomRequest) -> ApiResult<serde_json::Value> {
        let action = request.action();
        match request {
            RoomRequest::Create { player_name } => to_value(action, self.create_room(player_name)?),
            RoomRequest::Join {
                player_name,
                room_id,
            } => to_value(action, self.join_room(player_name, room_id)?),
            RoomRequest::CheckStatus { room_id } => to_value(action, self.check_room(room_id)?),
            RoomRequest::SubmitScore {
                room_id,
                player_name,
                score,
            } => to_value(action, self.record_score(room_id, player_name, score)?),
        }
    }

    fn begin(&self, action: &'static str) -> ApiResult<()> {
        *self.inner.calls.entry(action).or_default() += 1;
        let pending = self
            .inner
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            debug!(action, "injected failure");
            return Err(ApiError::Unavailable {
                action: action.to_string(),
                message: "simulated outage".into(),
            });
        }
        Ok(())
    }

    fn create_room(&self, player_name: String) -> ApiResult<CreateRoomResponse> {
        self.begin("create")?;
        if player_name.trim().is_empty() {
            return Ok(CreateRoomResponse {
                status: ServiceMessage::rejected(
                    ErrorCode::InvalidRequest,
                    "Player name is required",
                ),
                ..CreateRoomResponse::default()
            });
        }

        let mut players = IndexMap::new();
        players.insert(player_name, None);
        let room = Room {
            questions: self.inner.question_set.clone(),
            players,
        };

        let room_id = loop {
            let candidate = rng().random_range(1000..10000u32).to_string();
            if let Entry::Vacant(slot) = self.inner.rooms.entry(candidate.clone()) {
                slot.insert(room);
                break candidate;
            }
        };

        info!(%room_id, "stub room created");
        Ok(CreateRoomResponse {
            success: true,
            room_id: Some(room_id),
            questions: self.inner.question_set.clone(),
            status: ServiceMessage::default(),
        })
    }

    fn join_room(&self, player_name: String, room_id: String) -> ApiResult<JoinRoomResponse> {
        self.begin("join")?;
        let Some(mut room) = self.inner.rooms.get_mut(&room_id) else {
            return Ok(JoinRoomResponse {
                status: ServiceMessage::rejected(ErrorCode::RoomNotFound, "Room not found"),
                ..JoinRoomResponse::default()
            });
        };

        let rejection = if room.players.len() >= ROOM_CAPACITY {
            Some(ServiceMessage::rejected(
                ErrorCode::RoomFull,
                "Room already has two players",
            ))
        } else if room.players.contains_key(&player_name) {
            Some(ServiceMessage::rejected(
                ErrorCode::NameTaken,
                "A player with this name already exists in the room",
            ))
        } else {
            None
        };
        if let Some(status) = rejection {
            return Ok(JoinRoomResponse {
                status,
                ..JoinRoomResponse::default()
            });
        }

        room.players.insert(player_name, None);
        info!(%room_id, "stub room joined");
        Ok(JoinRoomResponse {
            success: true,
            questions: room.questions.clone(),
            status: ServiceMessage::default(),
        })
    }

    fn check_room(&self, room_id: String) -> ApiResult<StatusResponse> {
        self.begin("checkStatus")?;
        let Some(room) = self.inner.rooms.get(&room_id) else {
            return Ok(StatusResponse {
                status: ServiceMessage::rejected(ErrorCode::RoomNotFound, "Room not found"),
                ..StatusResponse::default()
            });
        };

        Ok(StatusResponse {
            success: true,
            player_joined: room.players.len() >= ROOM_CAPACITY,
            questions: Some(room.questions.clone()),
            status: ServiceMessage::default(),
        })
    }

    fn record_score(
        &self,
        room_id: String,
        player_name: String,
        score: u32,
    ) -> ApiResult<SubmitScoreResponse> {
        self.begin("submitScore")?;
        let Some(mut room) = self.inner.rooms.get_mut(&room_id) else {
            return Ok(SubmitScoreResponse {
                status: ServiceMessage::rejected(ErrorCode::RoomNotFound, "Room not found"),
                ..SubmitScoreResponse::default()
            });
        };
        let Some(slot) = room.players.get_mut(&player_name) else {
            return Ok(SubmitScoreResponse {
                status: ServiceMessage::rejected(
                    ErrorCode::InvalidRequest,
                    "Player is not part of this room",
                ),
                ..SubmitScoreResponse::default()
            });
        };

        // Re-submissions poll for the result; the first score stands.
        slot.get_or_insert(score);

        Ok(SubmitScoreResponse {
            success: true,
            players: room.standings(),
            winner: room.winner(),
            status: ServiceMessage::default(),
        })
    }
}

fn to_value<T: serde::Serialize>(action: &str, response: T) -> ApiResult<serde_json::Value> {
    serde_json::to_value(response).map_err(|source| ApiError::Encode {
        action: action.to_string(),
        source,
    })
}

impl RoomService for InMemoryRoomService {
    fn create(&self, player_name: String) -> BoxFuture<'static, ApiResult<CreateRoomResponse>> {
        ready(self.create_room(player_name)).boxed()
    }

    fn join(
        &self,
        player_name: String,
        room_id: String,
    ) -> BoxFuture<'static, ApiResult<JoinRoomResponse>> {
        ready(self.join_room(player_name, room_id)).boxed()
    }

    fn check_status(&self, room_id: String) -> BoxFuture<'static, ApiResult<StatusResponse>> {
        ready(self.check_room(room_id)).boxed()
    }

    fn submit_score(
        &self,
        room_id: String,
        player_name: String,
        score: u32,
    ) -> BoxFuture<'static, ApiResult<SubmitScoreResponse>> {
        ready(self.record_score(room_id, player_name, score)).boxed()
    }
}

/// Question set handed out to every stub room.
pub fn default_question_set() -> Vec<Question> {
    let question = |question: &str, options: [&str; 4], correct: &str| {
        Question::Options(OptionsQuestion {
            question: question.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_answer: correct.to_string(),
        })
    };

    vec![
        question(
            "What is Monica skilled at?",
            ["Bricklaying", "Cooking", "American football", "Singing"],
            "Cooking",
        ),
        question(
            "What is the name of the coffee shop the friends hang out in?",
            ["Central Perk", "Java Joe's", "The Grind", "Perk Place"],
            "Central Perk",
        ),
        question(
            "What is Ross's profession?",
            ["Chef", "Paleontologist", "Actor", "Masseuse"],
            "Paleontologist",
        ),
        question(
            "What is the name of Phoebe's most famous song?",
            ["Smelly Cat", "Sticky Shoes", "Little Black Curl", "Two of Them Kissed"],
            "Smelly Cat",
        ),
        question(
            "Which character is played by Matthew Perry?",
            ["Joey", "Ross", "Chandler", "Gunther"],
            "Chandler",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_player_is_turned_away() {
        let rooms = InMemoryRoomService::new();
        let created = rooms.create_room("Ross".into()).unwrap();
        let room_id = created.room_id.unwrap();
        assert_eq!(room_id.len(), 4);

        assert!(rooms.join_room("Rachel".into(), room_id.clone()).unwrap().success);
        let full = rooms.join_room("Joey".into(), room_id).unwrap();
        assert!(!full.success);
        assert_eq!(full.status.code, Some(ErrorCode::RoomFull));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let rooms = InMemoryRoomService::new();
        let room_id = rooms.create_room("Ross".into()).unwrap().room_id.unwrap();
        let taken = rooms.join_room("Ross".into(), room_id).unwrap();
        assert_eq!(taken.status.code, Some(ErrorCode::NameTaken));
    }

    #[test]
    fn winner_appears_once_both_scores_are_in() {
        let rooms = InMemoryRoomService::new();
        let room_id = rooms.create_room("Ross".into()).unwrap().room_id.unwrap();
        rooms.join_room("Rachel".into(), room_id.clone()).unwrap();

        let first = rooms
            .record_score(room_id.clone(), "Ross".into(), 80)
            .unwrap();
        assert_eq!(first.winner, None);
        assert_eq!(first.players.len(), 1);

        let second = rooms
            .record_score(room_id.clone(), "Rachel".into(), 95)
            .unwrap();
        assert_eq!(second.winner.as_deref(), Some("Rachel"));

        // A later re-submission cannot change the recorded score.
        let again = rooms.record_score(room_id, "Ross".into(), 100).unwrap();
        assert_eq!(again.players, second.players);
        assert_eq!(again.winner.as_deref(), Some("Rachel"));
    }

    #[test]
    fn tie_goes_to_room_creator() {
        let rooms = InMemoryRoomService::new();
        let room_id = rooms.create_room("Ross".into()).unwrap().room_id.unwrap();
        rooms.join_room("Rachel".into(), room_id.clone()).unwrap();
        rooms
            .record_score(room_id.clone(), "Rachel".into(), 50)
            .unwrap();
        let result = rooms.record_score(room_id, "Ross".into(), 50).unwrap();
        assert_eq!(result.winner.as_deref(), Some("Ross"));
    }

    #[test]
    fn injected_failures_are_consumed() {
        let rooms = InMemoryRoomService::new();
        rooms.fail_next(1);
        assert!(rooms.check_room("1234".into()).is_err());
        let missing = rooms.check_room("1234".into()).unwrap();
        assert_eq!(missing.status.code, Some(ErrorCode::RoomNotFound));
        assert_eq!(rooms.calls("checkStatus"), 2);
    }
}
