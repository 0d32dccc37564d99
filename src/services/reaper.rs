//! Periodic reclamation of dead waiting-queue entries.
//!
//! Session and match records expire through store TTLs; the reaper only has
//! to keep the shared waiting queue honest. Sweeps are advisory: the
//! matchmaker revalidates every entry it pops anyway, so a failed or skipped
//! sweep degrades nothing but queue hygiene.

use uuid::Uuid;

use tracing::{debug, info, warn};

use crate::{
    dao::Repositories,
    error::ServiceError,
    state::{SharedState, match_state::MatchPhase},
};

/// Outcome of one sweep over the waiting queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Queue entries examined.
    pub scanned: usize,
    /// Entries removed as dead.
    pub removed: usize,
}

/// Run the reaper until the process shuts down.
///
/// Sweep failures are logged and swallowed; the loop keeps its cadence and
/// skips cycles while the store is down.
pub async fn run(state: SharedState) {
    let mut ticker = tokio::time::interval(state.config().reaper_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if state.is_degraded().await {
            debug!("store unavailable; skipping reaper sweep");
            continue;
        }
        match sweep(&state).await {
            Ok(stats) if stats.removed > 0 => {
                info!(scanned = stats.scanned, removed = stats.removed, "reaper sweep");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "reaper sweep failed"),
        }
    }
}

/// Sweep the waiting queue once, dropping entries whose match is gone, no
/// longer searching, or peopled only by expired sessions.
pub async fn sweep(state: &SharedState) -> Result<SweepStats, ServiceError> {
    let repos = state.require_repositories().await?;
    let mut stats = SweepStats::default();

    for raw in repos.matches.waiting_snapshot().await? {
        stats.scanned += 1;

        let Ok(id) = raw.parse::<Uuid>() else {
            warn!(entry = %raw, "unparsable waiting-queue entry; removing");
            repos.matches.remove_waiting_raw(&raw).await?;
            stats.removed += 1;
            continue;
        };

        let Some(game) = repos.matches.find(id).await? else {
            repos.matches.remove_waiting(id).await?;
            stats.removed += 1;
            continue;
        };

        if game.phase() != MatchPhase::SearchingPlayers {
            repos.matches.remove_waiting(id).await?;
            stats.removed += 1;
            continue;
        }

        if !has_live_participant(&repos, game.participants()).await? {
            repos.matches.remove_waiting(id).await?;
            repos.matches.delete(id).await?;
            stats.removed += 1;
        }
    }
    Ok(stats)
}

async fn has_live_participant(
    repos: &Repositories,
    participants: &[Uuid],
) -> Result<bool, ServiceError> {
    for participant in participants {
        if repos.sessions.exists(*participant).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::kv_store::memory::MemoryKvStore,
        services::session_service,
        state::{AppState, match_state::Match},
    };

    async fn memory_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_kv_store(Arc::new(MemoryKvStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn live_waiting_entries_survive_a_sweep() {
        let state = memory_state().await;
        let mut session = session_service::resolve(&state, None).await.unwrap();
        session_service::join_or_create_match(&state, &mut session)
            .await
            .unwrap();

        let stats = sweep(&state).await.unwrap();
        assert_eq!(stats, SweepStats { scanned: 1, removed: 0 });

        let repos = state.require_repositories().await.unwrap();
        assert_eq!(repos.matches.waiting_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_without_a_match_are_removed() {
        let state = memory_state().await;
        let repos = state.require_repositories().await.unwrap();
        repos
            .matches
            .enqueue_waiting(Uuid::new_v4())
            .await
            .unwrap();

        let stats = sweep(&state).await.unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(repos.matches.waiting_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn entries_with_only_expired_participants_are_reclaimed() {
        let state = memory_state().await;
        let repos = state.require_repositories().await.unwrap();

        let mut game = Match::new(repos.matches.generate_id());
        game.add_participant(Uuid::new_v4()).unwrap();
        repos.matches.save(&game).await.unwrap();
        repos.matches.enqueue_waiting(game.id()).await.unwrap();

        let stats = sweep(&state).await.unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(repos.matches.waiting_len().await.unwrap(), 0);
        assert!(repos.matches.find(game.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unparsable_entries_are_dropped() {
        let state = memory_state().await;
        let repos = state.require_repositories().await.unwrap();
        let kv = state.require_kv_store().await.unwrap();
        kv.list_push_back("matches/waiting".into(), "not-a-uuid".into())
            .await
            .unwrap();

        let stats = sweep(&state).await.unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(repos.matches.waiting_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn paired_matches_leave_the_queue() {
        let state = memory_state().await;
        let repos = state.require_repositories().await.unwrap();

        // A match that went active but whose queue entry was never consumed.
        let mut first = session_service::resolve(&state, None).await.unwrap();
        let game = session_service::join_or_create_match(&state, &mut first)
            .await
            .unwrap();
        let mut stored = repos.matches.find(game.id()).await.unwrap().unwrap();
        stored.add_participant(Uuid::new_v4()).unwrap();
        repos.matches.save(&stored).await.unwrap();

        let stats = sweep(&state).await.unwrap();
        assert_eq!(stats.removed, 1);
        assert!(repos.matches.find(game.id()).await.unwrap().is_some());
    }
}
