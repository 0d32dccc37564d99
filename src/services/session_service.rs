//! Session resolution and the join/heartbeat actions.

use tracing::info;
use uuid::Uuid;

use crate::{
    config::LeavePolicy,
    dao::Repositories,
    error::ServiceError,
    services::matchmaker,
    state::{
        SharedState,
        match_state::{Match, MatchPhase},
        session::Session,
    },
};

/// Resolve a session from an optional client-held id.
///
/// A known id rehydrates the persisted session; an absent or unknown id mints
/// a fresh one. Either way the session is touched and persisted before it is
/// returned, so the caller always works with durable state.
pub async fn resolve(state: &SharedState, id: Option<Uuid>) -> Result<Session, ServiceError> {
    let repos = state.require_repositories().await?;

    if let Some(id) = id {
        if let Some(existing) = load_existing(&repos, id).await? {
            return Ok(existing);
        }
    }
    create_new(&repos).await
}

async fn load_existing(repos: &Repositories, id: Uuid) -> Result<Option<Session>, ServiceError> {
    let Some(mut session) = repos.sessions.find(id).await? else {
        return Ok(None);
    };
    session.touch();
    repos.sessions.save(&session).await?;
    Ok(Some(session))
}

async fn create_new(repos: &Repositories) -> Result<Session, ServiceError> {
    let session = Session::create_new(repos.sessions.generate_id());
    repos.sessions.save(&session).await?;
    info!(session_id = %session.id(), "created new session");
    Ok(session)
}

/// Keep the session and its bound match alive.
///
/// Besides the last-seen touch done by [`resolve`], re-persisting the match
/// refreshes its expiry window so it outlives quiet stretches of play.
pub async fn heartbeat(state: &SharedState, session: &mut Session) -> Result<(), ServiceError> {
    let repos = state.require_repositories().await?;
    let Some(match_id) = session.match_id() else {
        return Ok(());
    };
    match repos.matches.find(match_id).await? {
        Some(game) => repos.matches.save(&game).await?,
        None => {
            session.detach_match();
            repos.sessions.save(session).await?;
        }
    }
    Ok(())
}

/// Bind the session to a match, detaching from any previous one first.
pub async fn join_or_create_match(
    state: &SharedState,
    session: &mut Session,
) -> Result<Match, ServiceError> {
    let repos = state.require_repositories().await?;

    if let Some(current) = session.match_id() {
        leave_match(&repos, state.config().leave_policy, session, current).await?;
    }

    session.reset_acknowledged_version();
    let game = matchmaker::find_or_create_match_for(&repos, session).await?;
    session.bind_match(game.id());
    repos.sessions.save(session).await?;
    Ok(game)
}

/// Detach `session` from the match it is bound to.
///
/// Leaving active play marks the match as abandoned for the opponent to
/// observe. For a still-waiting match the configured policy decides whether
/// the emptied slot is discarded or left queued for reuse.
async fn leave_match(
    repos: &Repositories,
    policy: LeavePolicy,
    session: &mut Session,
    match_id: Uuid,
) -> Result<(), ServiceError> {
    session.detach_match();

    let Some(mut game) = repos.matches.find(match_id).await? else {
        return Ok(());
    };

    let was_searching = game.phase() == MatchPhase::SearchingPlayers;
    game.remove_participant(session.id());

    if was_searching && policy == LeavePolicy::Discard {
        repos.matches.remove_waiting(match_id).await?;
        repos.matches.delete(match_id).await?;
    } else {
        repos.matches.save(&game).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::kv_store::memory::MemoryKvStore,
        state::AppState,
    };

    async fn state_with(policy: LeavePolicy) -> SharedState {
        let config = AppConfig {
            leave_policy: policy,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        state
            .install_kv_store(Arc::new(MemoryKvStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn resolve_without_id_mints_a_session() {
        let state = state_with(LeavePolicy::Discard).await;
        let session = resolve(&state, None).await.unwrap();

        let repos = state.require_repositories().await.unwrap();
        assert!(repos.sessions.exists(session.id()).await.unwrap());
    }

    #[tokio::test]
    async fn resolve_with_unknown_id_starts_fresh() {
        let state = state_with(LeavePolicy::Discard).await;
        let ghost = Uuid::new_v4();
        let session = resolve(&state, Some(ghost)).await.unwrap();
        assert_ne!(session.id(), ghost);
    }

    #[tokio::test]
    async fn resolve_with_known_id_rehydrates() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut original = resolve(&state, None).await.unwrap();
        join_or_create_match(&state, &mut original).await.unwrap();

        let resolved = resolve(&state, Some(original.id())).await.unwrap();
        assert_eq!(resolved.id(), original.id());
        assert_eq!(resolved.match_id(), original.match_id());
    }

    #[tokio::test]
    async fn join_binds_and_resets_acknowledged_version() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut session = resolve(&state, None).await.unwrap();
        session.record_acknowledged_version(9);

        let game = join_or_create_match(&state, &mut session).await.unwrap();
        assert_eq!(session.match_id(), Some(game.id()));
        assert_eq!(session.last_acknowledged_version(), 0);
    }

    #[tokio::test]
    async fn two_joins_pair_into_one_active_match() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut first = resolve(&state, None).await.unwrap();
        let mut second = resolve(&state, None).await.unwrap();

        let waiting = join_or_create_match(&state, &mut first).await.unwrap();
        assert_eq!(waiting.phase(), MatchPhase::SearchingPlayers);

        let game = join_or_create_match(&state, &mut second).await.unwrap();
        assert_eq!(game.id(), waiting.id());
        assert_eq!(game.phase(), MatchPhase::Active);
    }

    #[tokio::test]
    async fn rejoin_while_waiting_discards_old_match_under_discard_policy() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut session = resolve(&state, None).await.unwrap();

        let old = join_or_create_match(&state, &mut session).await.unwrap();
        let new = join_or_create_match(&state, &mut session).await.unwrap();
        assert_ne!(old.id(), new.id());

        let repos = state.require_repositories().await.unwrap();
        assert!(repos.matches.find(old.id()).await.unwrap().is_none());
        assert_eq!(
            repos.matches.waiting_snapshot().await.unwrap(),
            vec![new.id().to_string()]
        );
    }

    #[tokio::test]
    async fn rejoin_while_waiting_reuses_slot_under_requeue_policy() {
        let state = state_with(LeavePolicy::Requeue).await;
        let mut session = resolve(&state, None).await.unwrap();

        let old = join_or_create_match(&state, &mut session).await.unwrap();
        let new = join_or_create_match(&state, &mut session).await.unwrap();

        // The emptied match stayed queued and was handed back.
        assert_eq!(old.id(), new.id());
        let repos = state.require_repositories().await.unwrap();
        assert_eq!(repos.matches.waiting_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn leaving_active_match_marks_it_abandoned() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut first = resolve(&state, None).await.unwrap();
        let mut second = resolve(&state, None).await.unwrap();
        join_or_create_match(&state, &mut first).await.unwrap();
        let game = join_or_create_match(&state, &mut second).await.unwrap();

        // First player walks away into a new match.
        join_or_create_match(&state, &mut first).await.unwrap();

        let repos = state.require_repositories().await.unwrap();
        let abandoned = repos.matches.find(game.id()).await.unwrap().unwrap();
        assert_eq!(abandoned.phase(), MatchPhase::PlayerLeft);
        assert_eq!(abandoned.version(), game.version() + 1);
    }

    #[tokio::test]
    async fn heartbeat_detaches_from_a_vanished_match() {
        let state = state_with(LeavePolicy::Discard).await;
        let mut session = resolve(&state, None).await.unwrap();
        let game = join_or_create_match(&state, &mut session).await.unwrap();

        let repos = state.require_repositories().await.unwrap();
        repos.matches.delete(game.id()).await.unwrap();

        heartbeat(&state, &mut session).await.unwrap();
        assert_eq!(session.match_id(), None);
    }
}
