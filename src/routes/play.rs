use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::action::{ActionRequest, ActionResponse, PlayRequest},
    error::AppError,
    services::{
        game_service::{self, MoveOutcome},
        session_service,
    },
    state::{SharedState, match_state::CellRef},
};

/// Routes handling published actions.
pub fn router() -> Router<SharedState> {
    Router::new().route("/pub", post(publish))
}

/// Publish an action: heartbeat, join matchmaking, or place a token.
#[utoipa::path(
    post,
    path = "/pub",
    tag = "play",
    request_body = PlayRequest,
    responses(
        (status = 200, description = "Action processed", body = ActionResponse),
        (status = 400, description = "Malformed action"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn publish(
    State(state): State<SharedState>,
    Json(payload): Json<PlayRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;

    let mut session = session_service::resolve(&state, payload.session_id).await?;
    let session_id = session.id();

    let response = match payload.action {
        ActionRequest::Heartbeat => {
            session_service::heartbeat(&state, &mut session).await?;
            ActionResponse::ok(session_id)
        }
        ActionRequest::JoinGame => {
            session_service::join_or_create_match(&state, &mut session).await?;
            ActionResponse::ok(session_id)
        }
        ActionRequest::Move { cell } => {
            let cell = CellRef::new(cell[0], cell[1])
                .ok_or_else(|| AppError::BadRequest("cell out of bounds".into()))?;
            match game_service::submit_move(&state, &mut session, cell).await? {
                MoveOutcome::Accepted { version } => {
                    ActionResponse::ok_with_version(session_id, version)
                }
                MoveOutcome::Rejected(rejection) => {
                    ActionResponse::rejected(session_id, rejection.to_string())
                }
                MoveOutcome::NotInMatch => ActionResponse::rejected(session_id, "not_connected"),
            }
        }
    };
    Ok(Json(response))
}
