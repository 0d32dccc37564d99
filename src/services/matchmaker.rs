//! Pairs waiting sessions into matches through the shared FIFO waiting queue.

use tracing::debug;

use crate::{
    dao::Repositories,
    error::ServiceError,
    state::{
        match_state::{Match, MatchPhase},
        session::Session,
    },
};

/// Find a waiting match for `session` or create a fresh one.
///
/// The queue entry is only a hint: a popped match is reloaded and revalidated
/// (right phase, participant still alive, not the joiner's own match) before
/// pairing is finalized, so stale entries cost a wasted pop, never a broken
/// pairing.
pub async fn find_or_create_match_for(
    repos: &Repositories,
    session: &Session,
) -> Result<Match, ServiceError> {
    while let Some(id) = repos.matches.pop_waiting().await? {
        let Some(mut game) = repos.matches.find(id).await? else {
            debug!(match_id = %id, "waiting match vanished; skipping");
            continue;
        };
        if game.phase() != MatchPhase::SearchingPlayers {
            continue;
        }
        if game.participants().contains(&session.id()) {
            continue;
        }

        // Revalidate the waiting participant before pairing with it.
        if let Some(waiting) = game.participants().first().copied() {
            if !repos.sessions.exists(waiting).await? {
                game.mark_participant_missing(waiting);
            }
        }

        let was_empty = game.participants().is_empty();
        attach(&mut game, session)?;
        repos.matches.save(&game).await?;
        if was_empty {
            // Reused an abandoned slot: it is waiting again, so re-enqueue.
            repos.matches.enqueue_waiting(game.id()).await?;
        }
        return Ok(game);
    }

    let mut game = Match::new(repos.matches.generate_id());
    attach(&mut game, session)?;
    repos.matches.save(&game).await?;
    repos.matches.enqueue_waiting(game.id()).await?;
    Ok(game)
}

fn attach(game: &mut Match, session: &Session) -> Result<(), ServiceError> {
    game.add_participant(session.id())
        .map(|_| ())
        .map_err(|err| ServiceError::Internal(format!("matchmaker pairing failed: {err}")))
}
