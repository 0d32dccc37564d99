//! The session entity: one participant's durable identity across stateless
//! requests.

use std::time::SystemTime;

use uuid::Uuid;

use crate::dao::models::SessionRecord;

/// One participant's identity and last-known view of match progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
    last_acknowledged_version: u64,
    match_id: Option<Uuid>,
    last_seen: SystemTime,
}

impl Session {
    /// Create a brand-new session under a freshly minted id.
    pub fn create_new(id: Uuid) -> Self {
        Self {
            id,
            last_acknowledged_version: 0,
            match_id: None,
            last_seen: SystemTime::now(),
        }
    }

    /// Stable session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Last match version this client confirmed seeing.
    pub fn last_acknowledged_version(&self) -> u64 {
        self.last_acknowledged_version
    }

    /// Back-reference to the bound match, if any.
    pub fn match_id(&self) -> Option<Uuid> {
        self.match_id
    }

    /// Last time any request touched this session.
    pub fn last_seen(&self) -> SystemTime {
        self.last_seen
    }

    /// Record that this client has seen through `version`. Never regresses.
    pub fn record_acknowledged_version(&mut self, version: u64) {
        self.last_acknowledged_version = self.last_acknowledged_version.max(version);
    }

    /// Forget all acknowledged progress, done when binding to a new match.
    pub fn reset_acknowledged_version(&mut self) {
        self.last_acknowledged_version = 0;
    }

    /// Bind this session to a match.
    pub fn bind_match(&mut self, match_id: Uuid) {
        self.match_id = Some(match_id);
    }

    /// Drop the match back-reference.
    pub fn detach_match(&mut self) {
        self.match_id = None;
    }

    /// Refresh the last-seen timestamp.
    pub fn touch(&mut self) {
        self.last_seen = SystemTime::now();
    }
}

impl From<Session> for SessionRecord {
    fn from(value: Session) -> Self {
        Self {
            id: value.id,
            last_acknowledged_version: value.last_acknowledged_version,
            match_id: value.match_id,
            last_seen: value.last_seen,
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            last_acknowledged_version: record.last_acknowledged_version,
            match_id: record.match_id,
            last_seen: record.last_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledged_version_never_regresses() {
        let mut session = Session::create_new(Uuid::new_v4());
        session.record_acknowledged_version(5);
        session.record_acknowledged_version(3);
        assert_eq!(session.last_acknowledged_version(), 5);
        session.reset_acknowledged_version();
        assert_eq!(session.last_acknowledged_version(), 0);
    }

    #[test]
    fn record_round_trip_is_lossless() {
        let mut session = Session::create_new(Uuid::new_v4());
        session.bind_match(Uuid::new_v4());
        session.record_acknowledged_version(7);

        let record = SessionRecord::from(session.clone());
        let bytes = serde_json::to_vec(&record).unwrap();
        let restored: Session = serde_json::from_slice::<SessionRecord>(&bytes)
            .unwrap()
            .into();
        assert_eq!(session, restored);
    }
}
