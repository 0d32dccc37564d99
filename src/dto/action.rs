use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_cell;

/// Envelope accepted by the publish endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayRequest {
    /// Session id handed out by a previous response; omitted on first contact.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The action to perform.
    #[serde(flatten)]
    pub action: ActionRequest,
}

/// Actions a client can publish.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    /// Keep the session and its match alive.
    Heartbeat,
    /// Enter matchmaking, leaving any current match.
    JoinGame,
    /// Place a token at `cell` (`[col, row]`).
    Move {
        /// Target cell as `[col, row]`, both in `0..=2`.
        cell: [u8; 2],
    },
}

impl Validate for PlayRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let ActionRequest::Move { cell } = &self.action {
            if let Err(e) = validate_cell(cell) {
                errors.add("cell", e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Whether an action was applied or turned away.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// The action was applied.
    Ok,
    /// The action was rejected; the match is unchanged.
    Rejected,
}

/// Response to a published action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// The session id the client should carry into subsequent requests.
    pub session_id: Uuid,
    /// Whether the action was applied.
    pub status: ActionStatus,
    /// Rejection reason, present only when `status` is `rejected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Match version after an accepted move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl ActionResponse {
    /// An accepted action with no version to report.
    pub fn ok(session_id: Uuid) -> Self {
        Self {
            session_id,
            status: ActionStatus::Ok,
            reason: None,
            version: None,
        }
    }

    /// An accepted move that advanced the match to `version`.
    pub fn ok_with_version(session_id: Uuid, version: u64) -> Self {
        Self {
            session_id,
            status: ActionStatus::Ok,
            reason: None,
            version: Some(version),
        }
    }

    /// A rejected action with a machine-readable reason.
    pub fn rejected(session_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            session_id,
            status: ActionStatus::Rejected,
            reason: Some(reason.into()),
            version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_action_deserializes_from_tagged_json() {
        let request: PlayRequest =
            serde_json::from_str(r#"{"action": "move", "cell": [2, 0]}"#).unwrap();
        assert_eq!(request.session_id, None);
        assert!(matches!(request.action, ActionRequest::Move { cell: [2, 0] }));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn out_of_bounds_move_fails_validation() {
        let request: PlayRequest =
            serde_json::from_str(r#"{"action": "move", "cell": [3, 0]}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn join_game_uses_camel_case_tag() {
        let request: PlayRequest = serde_json::from_str(
            r#"{"session_id": "00000000-0000-0000-0000-000000000000", "action": "joinGame"}"#,
        )
        .unwrap();
        assert!(matches!(request.action, ActionRequest::JoinGame));
        assert!(request.session_id.is_some());
    }

    #[test]
    fn rejected_response_carries_the_reason() {
        let response = ActionResponse::rejected(Uuid::nil(), "not_your_turn");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "not_your_turn");
        assert!(json.get("version").is_none());
    }
}
