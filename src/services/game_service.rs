//! Move submission against the store-backed match snapshot.

use crate::{
    dao::Repositories,
    error::ServiceError,
    state::{
        SharedState,
        match_state::{CellRef, Match, MatchPhase, MoveRejection},
        session::Session,
    },
};

/// Result of a move submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was applied; the match is now at `version`.
    Accepted {
        /// Match version after the move.
        version: u64,
    },
    /// The move was rejected and nothing changed.
    Rejected(MoveRejection),
    /// The session is not currently bound to a live match.
    NotInMatch,
}

/// Submit a move for `session` at `cell`.
///
/// The match is reloaded from the store, revalidated, mutated, and persisted
/// inside this one request; there is no cross-request transaction. Racing
/// submissions are tolerated because the phase/turn/cell checks re-run against
/// whatever snapshot this request observed.
pub async fn submit_move(
    state: &SharedState,
    session: &mut Session,
    cell: CellRef,
) -> Result<MoveOutcome, ServiceError> {
    let repos = state.require_repositories().await?;

    let Some(match_id) = session.match_id() else {
        return Ok(MoveOutcome::NotInMatch);
    };
    let Some(mut game) = repos.matches.find(match_id).await? else {
        session.detach_match();
        repos.sessions.save(session).await?;
        return Ok(MoveOutcome::NotInMatch);
    };

    revalidate_participants(&repos, &mut game).await?;

    match game.make_move(session.id(), cell) {
        Ok(()) => {
            repos.matches.save(&game).await?;
            Ok(MoveOutcome::Accepted {
                version: game.version(),
            })
        }
        Err(rejection) => Ok(MoveOutcome::Rejected(rejection)),
    }
}

/// Detect participants whose sessions expired from the store and record the
/// abandonment on the match. Persists only when something changed.
pub async fn revalidate_participants(
    repos: &Repositories,
    game: &mut Match,
) -> Result<bool, ServiceError> {
    if game.phase() != MatchPhase::Active {
        return Ok(false);
    }
    for participant in game.participants().to_vec() {
        if !repos.sessions.exists(participant).await? {
            game.mark_participant_missing(participant);
            repos.matches.save(game).await?;
            return Ok(true);
        }
    }
    Ok(false)
}
