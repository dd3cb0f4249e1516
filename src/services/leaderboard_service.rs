use std::sync::Arc;

use tracing::debug;

use crate::{
    dao::content_api::ContentService,
    dto::content::{LeaderboardEntry, LeaderboardKind},
    error::ClientError,
};

/// Read-only access to the weekly and single-game leaderboards.
#[derive(Clone)]
pub struct LeaderboardService {
    content: Arc<dyn ContentService>,
}

impl LeaderboardService {
    /// Service over the leaderboard endpoint.
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    /// Cumulative weekly challenge scores.
    pub async fn weekly(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.fetch(LeaderboardKind::Weekly).await
    }

    /// Best single-game scores.
    pub async fn points(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.fetch(LeaderboardKind::Points).await
    }

    /// Ranked entries of `kind`, in service order.
    pub async fn fetch(&self, kind: LeaderboardKind) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let players = self.content.leaderboard(kind).await?.top_players;
        debug!(?kind, count = players.len(), "leaderboard fetched");
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::error::{ApiError, ApiResult},
        dto::content::{ChallengeResponse, LeaderboardResponse, LevelQuestionsResponse},
    };

    struct Boards;

    impl ContentService for Boards {
        fn level_questions(&self, _: u32) -> BoxFuture<'static, ApiResult<LevelQuestionsResponse>> {
            Box::pin(async { Ok(LevelQuestionsResponse::default()) })
        }

        fn challenge(&self, _: String) -> BoxFuture<'static, ApiResult<ChallengeResponse>> {
            Box::pin(async { Ok(ChallengeResponse::default()) })
        }

        fn leaderboard(
            &self,
            kind: LeaderboardKind,
        ) -> BoxFuture<'static, ApiResult<LeaderboardResponse>> {
            Box::pin(async move {
                match kind {
                    LeaderboardKind::Weekly => Ok(LeaderboardResponse {
                        top_players: vec![
                            LeaderboardEntry {
                                name: "Monica".into(),
                                points: 320,
                            },
                            LeaderboardEntry {
                                name: "Chandler".into(),
                                points: 290,
                            },
                        ],
                    }),
                    LeaderboardKind::Points => Err(ApiError::Unavailable {
                        action: "leaderboard".into(),
                        message: "offline".into(),
                    }),
                }
            })
        }
    }

    #[tokio::test]
    async fn weekly_board_keeps_service_order() {
        let service = LeaderboardService::new(Arc::new(Boards));
        let names: Vec<String> = service
            .weekly()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["Monica", "Chandler"]);
    }

    #[tokio::test]
    async fn outage_surfaces_as_transport_error() {
        let service = LeaderboardService::new(Arc::new(Boards));
        let err = service.points().await.unwrap_err();
        assert!(err.is_transient());
    }
}
