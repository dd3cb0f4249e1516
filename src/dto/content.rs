//! Payloads of the content endpoints: level questions, weekly challenge and leaderboards.

use serde::{Deserialize, Serialize};

use crate::dto::{question::Question, room::ServiceMessage};

/// Response of the level questions endpoint (`?level=N`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LevelQuestionsResponse {
    /// Questions of the level.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Response of the weekly challenge endpoint (`?level=200&name=<name>`).
///
/// The same endpoint both registers a name and hands out the weekly question
/// set; rejections arrive as a message (and possibly a code).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChallengeResponse {
    /// This week's challenge questions.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Rejection details.
    #[serde(flatten)]
    pub status: ServiceMessage,
}

/// Which leaderboard to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKind {
    /// Highest cumulative score across the week's challenge runs.
    Weekly,
    /// Highest score in a single game.
    Points,
}

impl LeaderboardKind {
    /// Value of the `level` query parameter selecting this leaderboard.
    pub fn level_param(self) -> u32 {
        match self {
            LeaderboardKind::Weekly => 200,
            LeaderboardKind::Points => 400,
        }
    }
}

/// Response of the leaderboard endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    /// Ranked players, best first.
    #[serde(default)]
    pub top_players: Vec<LeaderboardEntry>,
}

/// One ranked player. Weekly boards report `scores`, points boards `highest_score`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LeaderboardEntry {
    /// Player name.
    pub name: String,
    /// Score the board ranks by.
    #[serde(alias = "scores", alias = "highest_score", default)]
    pub points: i64,
}
