//! Flat records persisted through the key-value store adapter.
//!
//! Records round-trip losslessly through serde_json, including the phase and
//! outcome tags; conversions to and from the runtime types live next to those
//! types in the `state` module.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::match_state::{MatchPhase, Outcome, Token};

/// Persisted form of one participant's durable identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    /// Globally unique, stable across reconnects.
    pub id: Uuid,
    /// Last match version this client has confirmed seeing.
    pub last_acknowledged_version: u64,
    /// Back-reference to the bound match, if any. Not ownership.
    pub match_id: Option<Uuid>,
    /// Last time any request touched this session.
    pub last_seen: SystemTime,
}

/// Persisted form of one two-participant match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    /// Globally unique match id.
    pub id: Uuid,
    /// Ordered participants; index 0 plays token A, index 1 token B.
    pub participants: Vec<Uuid>,
    /// Nine cells, row-major.
    pub board: [Option<Token>; 9],
    /// Session whose turn it is while the match is active.
    pub turn_holder: Option<Uuid>,
    /// Monotonic state counter.
    pub version: u64,
    /// Current phase tag.
    pub phase: MatchPhase,
    /// Final outcome once the match finished.
    pub outcome: Option<Outcome>,
}
