use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    match_state::{Match, MatchPhase, Token},
    session::Session,
};

/// Client-facing projection of a match, tailored to one participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    /// The receiving player's session id.
    pub player_id: Uuid,
    /// The opponent's session id, once one has joined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<Uuid>,
    /// Current lifecycle phase of the match.
    pub phase: MatchPhase,
    /// Whether the receiving player holds the turn.
    pub your_turn: bool,
    /// The receiving player's token, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_token: Option<Token>,
    /// Row-major 3x3 grid; `grid[row][col]`.
    #[schema(value_type = Vec<Vec<Option<Token>>>)]
    pub grid: [[Option<Token>; 3]; 3],
    /// Match version this view was built from.
    pub version: u64,
    /// Highest version the receiving player has acknowledged.
    pub acknowledged_version: u64,
    /// Set once the match finished with a winner; `true` for the winner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub you_won: Option<bool>,
}

impl GameView {
    /// Project `game` for `session`.
    pub fn project(game: &Match, session: &Session) -> Self {
        let view = game.view_for(session);
        Self {
            player_id: session.id(),
            opponent_id: view.opponent_id,
            phase: view.phase,
            your_turn: view.your_turn,
            your_token: view.your_token,
            grid: view.grid,
            version: view.version,
            acknowledged_version: view.acknowledged_version,
            you_won: view.you_won,
        }
    }
}
