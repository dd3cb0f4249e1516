//! HTTP face of the stub: the room endpoint plus the content endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    dao::content_api::CHALLENGE_LEVEL_PARAM,
    dto::{
        content::LeaderboardKind,
        room::{ErrorCode, RoomRequest, ServiceMessage},
    },
    stub::{content::StubContent, rooms::InMemoryRoomService},
};

/// Services backing the stub routes.
#[derive(Clone, Default)]
pub struct StubState {
    /// Room Service behind `POST /prod/`.
    pub rooms: InMemoryRoomService,
    /// Content behind the GET endpoints.
    pub content: StubContent,
}

#[derive(Debug, Deserialize)]
struct LevelQuery {
    level: u32,
    name: Option<String>,
}

/// Compose the stub route tree.
pub fn router(state: StubState) -> Router<()> {
    Router::new()
        .route("/prod/", post(room_action))
        .route("/questions", get(level_questions))
        .route("/challenge", get(challenge))
        .route("/leaderboard", get(leaderboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the stub on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: StubState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "stub room service listening");
    }
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Single action-discriminated endpoint.
async fn room_action(
    State(state): State<StubState>,
    Valid(Json(request)): Valid<Json<RoomRequest>>,
) -> Response {
    match state.rooms.handle(request) {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            warn!(error = %err, "stub room request failed");
            let status = if err.is_transient() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(ServiceMessage {
                    message: Some(err.to_string()),
                    code: None,
                }),
            )
                .into_response()
        }
    }
}

async fn level_questions(
    State(state): State<StubState>,
    Query(query): Query<LevelQuery>,
) -> Response {
    Json(state.content.level(query.level)).into_response()
}

/// Limit and name rejections are reported as 400 with a JSON body.
async fn challenge(State(state): State<StubState>, Query(query): Query<LevelQuery>) -> Response {
    let Some(name) = query.name.filter(|_| query.level == CHALLENGE_LEVEL_PARAM) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ServiceMessage::rejected(
                ErrorCode::InvalidRequest,
                "Expected level=200 and a name",
            )),
        )
            .into_response();
    };

    let response = state.content.challenge_for(&name);
    if response.status.code == Some(ErrorCode::WeeklyLimitReached) {
        return (StatusCode::BAD_REQUEST, Json(response)).into_response();
    }
    Json(response).into_response()
}

async fn leaderboard(State(state): State<StubState>, Query(query): Query<LevelQuery>) -> Response {
    let kind = if query.level == LeaderboardKind::Points.level_param() {
        LeaderboardKind::Points
    } else {
        LeaderboardKind::Weekly
    };
    Json(state.content.board(kind)).into_response()
}
