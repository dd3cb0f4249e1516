//! Client for the read-mostly content endpoints (levels, weekly challenge, leaderboards).

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::dto::content::{
    ChallengeResponse, LeaderboardKind, LeaderboardResponse, LevelQuestionsResponse,
};

use super::error::{ApiError, ApiResult};

/// Query parameter value the challenge endpoint expects.
pub const CHALLENGE_LEVEL_PARAM: u32 = 200;

/// Abstraction over the content endpoints.
pub trait ContentService: Send + Sync {
    /// Questions of `level`.
    fn level_questions(&self, level: u32) -> BoxFuture<'static, ApiResult<LevelQuestionsResponse>>;
    /// Register `name` or fetch its weekly challenge questions.
    fn challenge(&self, name: String) -> BoxFuture<'static, ApiResult<ChallengeResponse>>;
    /// Ranked players of `kind`.
    fn leaderboard(
        &self,
        kind: LeaderboardKind,
    ) -> BoxFuture<'static, ApiResult<LeaderboardResponse>>;
}

/// Base URLs of the content endpoints.
#[derive(Debug, Clone)]
pub struct ContentEndpoints {
    /// Level questions URL.
    pub questions: String,
    /// Weekly challenge URL.
    pub challenge: String,
    /// Leaderboard URL.
    pub leaderboard: String,
}

/// [`ContentService`] issuing plain HTTP GETs.
#[derive(Clone)]
pub struct HttpContentService {
    client: Client,
    questions: Arc<str>,
    challenge: Arc<str>,
    leaderboard: Arc<str>,
}

impl HttpContentService {
    /// Build a client for `endpoints`, failing requests after `timeout`.
    pub fn new(endpoints: ContentEndpoints, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            questions: Arc::<str>::from(endpoints.questions),
            challenge: Arc::<str>::from(endpoints.challenge),
            leaderboard: Arc::<str>::from(endpoints.leaderboard),
        })
    }

    /// GET `url` with `query`. When `decode_bad_request` is set a 400 body is
    /// decoded too, since the challenge endpoint reports rejections that way.
    async fn get<T>(
        &self,
        action: &str,
        url: &str,
        query: &[(&str, String)],
        decode_bad_request: bool,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        debug!(action, url, "sending content request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend {
                action: action.to_string(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let decodable =
            status.is_success() || (decode_bad_request && status == StatusCode::BAD_REQUEST);
        if !decodable {
            return Err(ApiError::RequestStatus {
                action: action.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::DecodeResponse {
                action: action.to_string(),
                source,
            })
    }
}

impl ContentService for HttpContentService {
    fn level_questions(&self, level: u32) -> BoxFuture<'static, ApiResult<LevelQuestionsResponse>> {
        let service = self.clone();
        Box::pin(async move {
            let url = service.questions.clone();
            service
                .get("levelQuestions", &url, &[("level", level.to_string())], false)
                .await
        })
    }

    fn challenge(&self, name: String) -> BoxFuture<'static, ApiResult<ChallengeResponse>> {
        let service = self.clone();
        Box::pin(async move {
            let url = service.challenge.clone();
            let query = [
                ("level", CHALLENGE_LEVEL_PARAM.to_string()),
                ("name", name),
            ];
            service.get("challenge", &url, &query, true).await
        })
    }

    fn leaderboard(
        &self,
        kind: LeaderboardKind,
    ) -> BoxFuture<'static, ApiResult<LeaderboardResponse>> {
        let service = self.clone();
        Box::pin(async move {
            let url = service.leaderboard.clone();
            service
                .get(
                    "leaderboard",
                    &url,
                    &[("level", kind.level_param().to_string())],
                    false,
                )
                .await
        })
    }
}
