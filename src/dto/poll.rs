use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::GameView;

/// Envelope accepted by the subscribe endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PollRequest {
    /// Session id handed out by a previous response; omitted on first contact.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Skip waiting and report the current state immediately.
    #[serde(default)]
    pub urgent: bool,
}

/// What a long poll resolved to, tagged for the client.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollResponse {
    /// New match state to render.
    Event {
        /// The session id the client should carry into subsequent requests.
        session_id: Uuid,
        /// The state frame.
        game: GameView,
    },
    /// Nothing happened within the poll window; poll again.
    Timeout {
        /// The session id the client should carry into subsequent requests.
        session_id: Uuid,
    },
    /// The session has no live match; join again to keep playing.
    NotConnected {
        /// The session id the client should carry into subsequent requests.
        session_id: Uuid,
    },
}
