//! Long-poll state synchronization.
//!
//! Each poll re-reads the match snapshot from the store in a retry loop until
//! something worth reporting shows up or the poll window closes. The retry
//! sleep is jittered so a burst of reconnecting clients does not hammer the
//! store in lockstep.

use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::{
    error::ServiceError,
    services::game_service,
    state::{SharedState, match_state::Match, session::Session},
};

/// What a long poll resolved to.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The match advanced past the session's acknowledged version (or reached
    /// a terminal phase). Carries the snapshot the event was built from.
    Event(Match),
    /// The poll window closed with nothing to report.
    Timeout,
    /// The session is not bound to a live match.
    NotConnected,
}

/// Wait for the session's match to advance, up to the configured poll window.
///
/// `urgent` short-circuits the wait and reports the current snapshot
/// immediately, whatever its version. On every reported event the session's
/// acknowledged version is advanced and persisted, so the next poll blocks
/// until genuinely new state exists.
pub async fn poll(
    state: &SharedState,
    session: &mut Session,
    urgent: bool,
) -> Result<SyncOutcome, ServiceError> {
    let config = state.config();
    let deadline = Instant::now() + config.poll_timeout;

    loop {
        let repos = state.require_repositories().await?;

        let Some(match_id) = session.match_id() else {
            return Ok(SyncOutcome::NotConnected);
        };
        let Some(mut game) = repos.matches.find(match_id).await? else {
            session.detach_match();
            repos.sessions.save(session).await?;
            return Ok(SyncOutcome::NotConnected);
        };

        game_service::revalidate_participants(&repos, &mut game).await?;

        let newsworthy =
            urgent || game.version() > session.last_acknowledged_version() || game.is_terminal();
        if newsworthy {
            session.record_acknowledged_version(game.version());
            repos.sessions.save(session).await?;
            return Ok(SyncOutcome::Event(game));
        }

        if Instant::now() >= deadline {
            debug!(session_id = %session.id(), "poll window closed without news");
            return Ok(SyncOutcome::Timeout);
        }
        sleep(retry_delay(config.poll_retry_min, config.poll_retry_max)).await;
    }
}

fn retry_delay(min: Duration, max: Duration) -> Duration {
    let mut rng = rand::rng();
    let millis = rng.random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}
