//! In-memory content endpoints: level questions, weekly challenge and leaderboards.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use futures::future::{BoxFuture, FutureExt, ready};
use tracing::info;

use crate::{
    dao::{content_api::ContentService, error::ApiResult},
    dto::{
        content::{
            ChallengeResponse, LeaderboardEntry, LeaderboardKind, LeaderboardResponse,
            LevelQuestionsResponse,
        },
        room::{ErrorCode, ServiceMessage},
    },
    stub::rooms::default_question_set,
};

/// Weekly challenge plays allowed per name.
pub const WEEKLY_PLAY_LIMIT: u32 = 10;
/// Questions handed out per level.
pub const QUESTIONS_PER_LEVEL: usize = 3;

#[derive(Default)]
struct Inner {
    plays: DashMap<String, u32>,
    reserved: DashSet<String>,
}

/// Deterministic stand-in for the content endpoints.
#[derive(Clone, Default)]
pub struct StubContent {
    inner: Arc<Inner>,
}

impl StubContent {
    /// Fresh content with no plays recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as registered from another device.
    pub fn reserve_name(&self, name: &str) {
        self.inner.reserved.insert(name.to_string());
    }

    /// Questions of `level`: a rotating window over the bundled set.
    pub fn level(&self, level: u32) -> LevelQuestionsResponse {
        let bank = default_question_set();
        let offset = level as usize % bank.len();
        let questions = bank
            .iter()
            .cycle()
            .skip(offset)
            .take(QUESTIONS_PER_LEVEL)
            .cloned()
            .collect();
        LevelQuestionsResponse { questions }
    }

    /// Register or play `name`. Every accepted call counts as one weekly play.
    pub fn challenge_for(&self, name: &str) -> ChallengeResponse {
        if self.inner.reserved.contains(name) {
            return ChallengeResponse {
                questions: Vec::new(),
                status: ServiceMessage::rejected(ErrorCode::NameTaken, "User already exists"),
            };
        }

        let mut plays = self.inner.plays.entry(name.to_string()).or_default();
        if *plays >= WEEKLY_PLAY_LIMIT {
            return ChallengeResponse {
                questions: Vec::new(),
                status: ServiceMessage::rejected(
                    ErrorCode::WeeklyLimitReached,
                    "You have already played 10 times this week",
                ),
            };
        }
        *plays += 1;
        info!(name, plays = *plays, "stub challenge play");

        ChallengeResponse {
            questions: default_question_set(),
            status: ServiceMessage::default(),
        }
    }

    /// Ranked players for `kind`.
    pub fn board(&self, kind: LeaderboardKind) -> LeaderboardResponse {
        let mut top_players: Vec<LeaderboardEntry> = match kind {
            LeaderboardKind::Weekly => self
                .inner
                .plays
                .iter()
                .map(|entry| LeaderboardEntry {
                    name: entry.key().clone(),
                    points: i64::from(*entry.value()),
                })
                .collect(),
            LeaderboardKind::Points => vec![
                LeaderboardEntry {
                    name: "Monica".into(),
                    points: 50,
                },
                LeaderboardEntry {
                    name: "Ross".into(),
                    points: 44,
                },
            ],
        };
        top_players.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
        LeaderboardResponse { top_players }
    }
}

impl ContentService for StubContent {
    fn level_questions(&self, level: u32) -> BoxFuture<'static, ApiResult<LevelQuestionsResponse>> {
        ready(Ok(self.level(level))).boxed()
    }

    fn challenge(&self, name: String) -> BoxFuture<'static, ApiResult<ChallengeResponse>> {
        ready(Ok(self.challenge_for(&name))).boxed()
    }

    fn leaderboard(
        &self,
        kind: LeaderboardKind,
    ) -> BoxFuture<'static, ApiResult<LeaderboardResponse>> {
        ready(Ok(self.board(kind))).boxed()
    }
}
