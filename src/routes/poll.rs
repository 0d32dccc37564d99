use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::{
        game::GameView,
        poll::{PollRequest, PollResponse},
    },
    error::AppError,
    services::{
        session_service,
        sync_service::{self, SyncOutcome},
    },
    state::SharedState,
};

/// Routes handling long-poll subscriptions.
pub fn router() -> Router<SharedState> {
    Router::new().route("/sub", post(subscribe))
}

/// Long-poll for the next state frame of the session's match.
///
/// Blocks up to the configured poll window. A timeout is a normal response;
/// clients are expected to poll again immediately.
#[utoipa::path(
    post,
    path = "/sub",
    tag = "play",
    request_body = PollRequest,
    responses(
        (status = 200, description = "Event, timeout, or not-connected frame", body = PollResponse),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn subscribe(
    State(state): State<SharedState>,
    Json(payload): Json<PollRequest>,
) -> Result<Json<PollResponse>, AppError> {
    let mut session = session_service::resolve(&state, payload.session_id).await?;
    let session_id = session.id();

    let response = match sync_service::poll(&state, &mut session, payload.urgent).await? {
        SyncOutcome::Event(game) => PollResponse::Event {
            session_id,
            game: GameView::project(&game, &session),
        },
        SyncOutcome::Timeout => PollResponse::Timeout { session_id },
        SyncOutcome::NotConnected => PollResponse::NotConnected { session_id },
    };
    Ok(Json(response))
}
