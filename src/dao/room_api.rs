//! Client for the remote Room Service.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::dto::room::{
    CreateRoomResponse, JoinRoomResponse, RoomRequest, StatusResponse, SubmitScoreResponse,
};

use super::error::{ApiError, ApiResult};

/// Abstraction over the stateful room endpoint shared by both participants.
pub trait RoomService: Send + Sync {
    /// Open a room owned by `player_name`.
    fn create(&self, player_name: String) -> BoxFuture<'static, ApiResult<CreateRoomResponse>>;
    /// Join `room_id` as `player_name`.
    fn join(
        &self,
        player_name: String,
        room_id: String,
    ) -> BoxFuture<'static, ApiResult<JoinRoomResponse>>;
    /// Whether the second participant has arrived.
    fn check_status(&self, room_id: String) -> BoxFuture<'static, ApiResult<StatusResponse>>;
    /// Report a final score; the response carries the standings so far.
    fn submit_score(
        &self,
        room_id: String,
        player_name: String,
        score: u32,
    ) -> BoxFuture<'static, ApiResult<SubmitScoreResponse>>;
}

/// [`RoomService`] speaking the JSON contract over HTTP.
#[derive(Clone)]
pub struct HttpRoomService {
    client: Client,
    endpoint: Arc<str>,
}

impl HttpRoomService {
    /// Build a client posting to `endpoint`, failing requests after `timeout`.
    pub fn new(endpoint: impl AsRef<str>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            endpoint: Arc::<str>::from(endpoint.as_ref()),
        })
    }

    async fn post<T>(&self, request: RoomRequest) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let action = request.action();
        debug!(action, endpoint = %self.endpoint, "sending room request");

        let response = self
            .client
            .post(self.endpoint.as_ref())
            .json(&request)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend {
                action: action.to_string(),
                url: self.endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
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

impl RoomService for HttpRoomService {
    fn create(&self, player_name: String) -> BoxFuture<'static, ApiResult<CreateRoomResponse>> {
        let service = self.clone();
        Box::pin(async move { service.post(RoomRequest::Create { player_name }).await })
    }

    fn join(
        &self,
        player_name: String,
        room_id: String,
    ) -> BoxFuture<'static, ApiResult<JoinRoomResponse>> {
        let service = self.clone();
        Box::pin(async move {
            service
                .post(RoomRequest::Join {
                    player_name,
                    room_id,
                })
                .await
        })
    }

    fn check_status(&self, room_id: String) -> BoxFuture<'static, ApiResult<StatusResponse>> {
        let service = self.clone();
        Box::pin(async move { service.post(RoomRequest::CheckStatus { room_id }).await })
    }

    fn submit_score(
        &self,
        room_id: String,
        player_name: String,
        score: u32,
    ) -> BoxFuture<'static, ApiResult<SubmitScoreResponse>> {
        let service = self.clone();
        Box::pin(async move {
            service
                .post(RoomRequest::SubmitScore {
                    room_id,
                    player_name,
                    score,
                })
                .await
        })
    }
}
