//! The match entity: a two-participant game with versioned, store-backed state.
//!
//! The match is the sole authority over its own board. Everything that changes
//! observable state bumps `version` exactly once; rejected moves change
//! nothing and bump nothing.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::MatchRecord, state::session::Session};

/// The eight winning lines of the 3x3 grid: rows, columns, diagonals.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Mark owned by one of the two participants.
///
/// Assignment is positional and fixed at join time: the first participant
/// always plays `A`, the second always `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    /// Token of the first participant.
    A,
    /// Token of the second participant.
    B,
}

/// High-level phases a match moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MatchPhase {
    /// Just created, no participants yet.
    Idle,
    /// One participant, enqueued in the waiting queue.
    SearchingPlayers,
    /// Two participants, turn-based play.
    Active,
    /// Terminal: a winning line was completed or the board filled up.
    Finished,
    /// Terminal: a participant vanished mid-play.
    PlayerLeft,
}

impl MatchPhase {
    /// Whether this phase ends the match.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchPhase::Finished | MatchPhase::PlayerLeft)
    }
}

/// How a finished match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// One participant completed a winning line.
    Winner {
        /// Session id of the winner.
        session_id: Uuid,
    },
    /// The board filled with no completed line.
    Draw,
}

/// Reference to one cell of the grid, `(col, row)` with both in `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Column, left to right.
    pub col: u8,
    /// Row, top to bottom.
    pub row: u8,
}

impl CellRef {
    /// Build a cell reference, rejecting out-of-grid coordinates.
    pub fn new(col: u8, row: u8) -> Option<Self> {
        (col < 3 && row < 3).then_some(Self { col, row })
    }

    fn index(self) -> usize {
        3 * self.row as usize + self.col as usize
    }
}

/// Why a move submission was rejected. Reported to the caller, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveRejection {
    /// The match is not in its active phase.
    #[error("match is not active")]
    NotActive,
    /// The mover is not the current turn holder.
    #[error("not this session's turn")]
    NotYourTurn,
    /// The targeted cell already carries a token.
    #[error("cell ({col}, {row}) is already occupied")]
    CellOccupied {
        /// Column of the rejected target.
        col: u8,
        /// Row of the rejected target.
        row: u8,
    },
    /// The mover does not participate in this match.
    #[error("session is not a participant of this match")]
    NotParticipant,
}

/// Why a participant could not be added.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The match already has two participants.
    #[error("match already has two participants")]
    Full,
    /// The session is already a participant.
    #[error("session already joined this match")]
    AlreadyJoined,
}

/// Externally visible projection of a match for one participant.
///
/// Must never reveal information unavailable to that participant; this game
/// hides nothing, but the shape is the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchView {
    /// The other participant, if one joined already.
    pub opponent_id: Option<Uuid>,
    /// Current phase.
    pub phase: MatchPhase,
    /// Whether it is this participant's turn to move.
    pub your_turn: bool,
    /// This participant's token.
    pub your_token: Option<Token>,
    /// The grid as three rows of three cells.
    pub grid: [[Option<Token>; 3]; 3],
    /// Current match version.
    pub version: u64,
    /// Version this participant last confirmed seeing.
    pub acknowledged_version: u64,
    /// Only present once finished: whether this participant won.
    pub you_won: Option<bool>,
}

/// One two-participant game instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    id: Uuid,
    participants: Vec<Uuid>,
    board: [Option<Token>; 9],
    turn_holder: Option<Uuid>,
    version: u64,
    phase: MatchPhase,
    outcome: Option<Outcome>,
}

impl Match {
    /// Create an empty match in the idle phase.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            participants: Vec::new(),
            board: [None; 9],
            turn_holder: None,
            version: 1,
            phase: MatchPhase::Idle,
            outcome: None,
        }
    }

    /// Match id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ordered participants; index 0 plays token A, index 1 token B.
    pub fn participants(&self) -> &[Uuid] {
        &self.participants
    }

    /// Session whose turn it is, while active.
    pub fn turn_holder(&self) -> Option<Uuid> {
        self.turn_holder
    }

    /// Monotonic state counter; the only ordering signal clients may rely on.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Final outcome once the phase is finished.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Whether the match reached a terminal phase.
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Token held by a participant, by position.
    pub fn token_of(&self, session_id: Uuid) -> Option<Token> {
        match self.participants.iter().position(|id| *id == session_id) {
            Some(0) => Some(Token::A),
            Some(_) => Some(Token::B),
            None => None,
        }
    }

    /// Attach a participant.
    ///
    /// The first join moves the match to `SearchingPlayers` as part of its
    /// creation event; the second moves it to `Active`, picks the first turn
    /// holder uniformly at random, and bumps the version.
    pub fn add_participant(&mut self, session_id: Uuid) -> Result<MatchPhase, JoinError> {
        if self.participants.contains(&session_id) {
            return Err(JoinError::AlreadyJoined);
        }
        match self.participants.len() {
            0 => {
                self.participants.push(session_id);
                self.phase = MatchPhase::SearchingPlayers;
            }
            1 => {
                self.participants.push(session_id);
                self.phase = MatchPhase::Active;
                let first = rand::rng().random_range(0..self.participants.len());
                self.turn_holder = Some(self.participants[first]);
                self.version += 1;
            }
            _ => return Err(JoinError::Full),
        }
        Ok(self.phase)
    }

    /// A participant deliberately leaves the match.
    ///
    /// Leaving active play ends the match as `PlayerLeft`; participants keep
    /// their positions so token assignment stays stable. Leaving while still
    /// waiting simply shrinks the participant list.
    pub fn remove_participant(&mut self, session_id: Uuid) {
        if !self.participants.contains(&session_id) {
            return;
        }
        match self.phase {
            MatchPhase::Active => {
                self.phase = MatchPhase::PlayerLeft;
                self.turn_holder = None;
                self.version += 1;
            }
            MatchPhase::SearchingPlayers => {
                self.participants.retain(|id| *id != session_id);
                self.version += 1;
            }
            _ => {}
        }
    }

    /// A rehydrated match found a participant whose session expired.
    pub fn mark_participant_missing(&mut self, session_id: Uuid) {
        self.remove_participant(session_id);
    }

    /// Submit a move for `mover` at `cell`.
    ///
    /// Accepted iff the match is active, the mover holds the turn, and the
    /// cell is empty; anything else is a rejection that leaves the match
    /// untouched.
    pub fn make_move(&mut self, mover: Uuid, cell: CellRef) -> Result<(), MoveRejection> {
        if self.phase != MatchPhase::Active {
            return Err(MoveRejection::NotActive);
        }
        let Some(token) = self.token_of(mover) else {
            return Err(MoveRejection::NotParticipant);
        };
        if self.turn_holder != Some(mover) {
            return Err(MoveRejection::NotYourTurn);
        }
        let index = cell.index();
        if self.board[index].is_some() {
            return Err(MoveRejection::CellOccupied {
                col: cell.col,
                row: cell.row,
            });
        }

        self.board[index] = Some(token);
        if let Some(winner) = self.winning_token() {
            self.phase = MatchPhase::Finished;
            self.turn_holder = None;
            self.outcome = Some(Outcome::Winner {
                session_id: self.participant_for(winner),
            });
        } else if self.board.iter().all(Option::is_some) {
            self.phase = MatchPhase::Finished;
            self.turn_holder = None;
            self.outcome = Some(Outcome::Draw);
        } else {
            self.turn_holder = self.opponent_of(mover);
        }
        self.version += 1;
        Ok(())
    }

    /// Projection of this match as seen by one session.
    pub fn view_for(&self, session: &Session) -> MatchView {
        let mut grid = [[None; 3]; 3];
        for (index, cell) in self.board.iter().enumerate() {
            grid[index / 3][index % 3] = *cell;
        }

        let you_won = (self.phase == MatchPhase::Finished).then(|| {
            matches!(
                self.outcome,
                Some(Outcome::Winner { session_id }) if session_id == session.id()
            )
        });

        MatchView {
            opponent_id: self.opponent_of(session.id()),
            phase: self.phase,
            your_turn: self.phase == MatchPhase::Active
                && self.turn_holder == Some(session.id()),
            your_token: self.token_of(session.id()),
            grid,
            version: self.version,
            acknowledged_version: session.last_acknowledged_version(),
            you_won,
        }
    }

    fn opponent_of(&self, session_id: Uuid) -> Option<Uuid> {
        self.participants
            .iter()
            .find(|id| **id != session_id)
            .copied()
    }

    fn participant_for(&self, token: Token) -> Uuid {
        match token {
            Token::A => self.participants[0],
            Token::B => self.participants[1],
        }
    }

    fn winning_token(&self) -> Option<Token> {
        for line in WIN_LINES {
            if let Some(token) = self.board[line[0]] {
                if line.iter().all(|cell| self.board[*cell] == Some(token)) {
                    return Some(token);
                }
            }
        }
        None
    }
}

impl From<Match> for MatchRecord {
    fn from(value: Match) -> Self {
        Self {
            id: value.id,
            participants: value.participants,
            board: value.board,
            turn_holder: value.turn_holder,
            version: value.version,
            phase: value.phase,
            outcome: value.outcome,
        }
    }
}

impl From<MatchRecord> for Match {
    fn from(record: MatchRecord) -> Self {
        Self {
            id: record.id,
            participants: record.participants,
            board: record.board,
            turn_holder: record.turn_holder,
            version: record.version,
            phase: record.phase,
            outcome: record.outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: u8, row: u8) -> CellRef {
        CellRef::new(col, row).unwrap()
    }

    fn paired() -> (Match, Uuid, Uuid) {
        let mut game = Match::new(Uuid::new_v4());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        game.add_participant(first).unwrap();
        game.add_participant(second).unwrap();
        (game, first, second)
    }

    /// Pin the turn holder so move sequences are deterministic.
    fn set_turn(game: &mut Match, holder: Uuid) {
        game.turn_holder = Some(holder);
    }

    #[test]
    fn new_match_starts_idle_at_version_one() {
        let game = Match::new(Uuid::new_v4());
        assert_eq!(game.phase(), MatchPhase::Idle);
        assert_eq!(game.version(), 1);
        assert!(game.participants().is_empty());
    }

    #[test]
    fn first_join_enters_searching_second_activates() {
        let mut game = Match::new(Uuid::new_v4());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(
            game.add_participant(first).unwrap(),
            MatchPhase::SearchingPlayers
        );
        assert_eq!(game.version(), 1);
        assert_eq!(game.turn_holder(), None);

        assert_eq!(game.add_participant(second).unwrap(), MatchPhase::Active);
        assert_eq!(game.version(), 2);
        let holder = game.turn_holder().unwrap();
        assert!(holder == first || holder == second);
    }

    #[test]
    fn third_join_and_double_join_are_rejected() {
        let (mut game, first, _) = paired();
        assert_eq!(
            game.add_participant(Uuid::new_v4()),
            Err(JoinError::Full)
        );
        assert_eq!(game.add_participant(first), Err(JoinError::AlreadyJoined));
    }

    #[test]
    fn token_assignment_is_positional_and_stable() {
        let (mut game, first, second) = paired();
        assert_eq!(game.token_of(first), Some(Token::A));
        assert_eq!(game.token_of(second), Some(Token::B));

        set_turn(&mut game, first);
        game.make_move(first, cell(0, 0)).unwrap();
        game.make_move(second, cell(1, 1)).unwrap();

        assert_eq!(game.token_of(first), Some(Token::A));
        assert_eq!(game.token_of(second), Some(Token::B));
    }

    #[test]
    fn accepted_moves_bump_version_exactly_once_and_flip_turn() {
        let (mut game, first, second) = paired();
        set_turn(&mut game, first);
        let before = game.version();

        game.make_move(first, cell(0, 0)).unwrap();
        assert_eq!(game.version(), before + 1);
        assert_eq!(game.turn_holder(), Some(second));

        game.make_move(second, cell(1, 0)).unwrap();
        assert_eq!(game.version(), before + 2);
        assert_eq!(game.turn_holder(), Some(first));
    }

    #[test]
    fn move_out_of_turn_is_rejected_without_mutation() {
        let (mut game, first, second) = paired();
        set_turn(&mut game, first);
        let before = game.clone();

        assert_eq!(
            game.make_move(second, cell(0, 0)),
            Err(MoveRejection::NotYourTurn)
        );
        assert_eq!(game, before);
    }

    #[test]
    fn move_on_occupied_cell_is_rejected_without_mutation() {
        let (mut game, first, second) = paired();
        set_turn(&mut game, first);
        game.make_move(first, cell(0, 0)).unwrap();
        let before = game.clone();

        assert_eq!(
            game.make_move(second, cell(0, 0)),
            Err(MoveRejection::CellOccupied { col: 0, row: 0 })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn move_by_stranger_is_rejected() {
        let (mut game, first, _) = paired();
        set_turn(&mut game, first);
        assert_eq!(
            game.make_move(Uuid::new_v4(), cell(0, 0)),
            Err(MoveRejection::NotParticipant)
        );
    }

    #[test]
    fn move_outside_active_phase_is_rejected() {
        let mut game = Match::new(Uuid::new_v4());
        let first = Uuid::new_v4();
        game.add_participant(first).unwrap();
        assert_eq!(
            game.make_move(first, cell(0, 0)),
            Err(MoveRejection::NotActive)
        );
    }

    #[test]
    fn each_winning_line_finishes_the_match() {
        for line in WIN_LINES {
            let (mut game, first, second) = paired();
            // Fill the line directly and let the winner play its last cell.
            game.board[line[0]] = Some(Token::A);
            game.board[line[1]] = Some(Token::A);
            set_turn(&mut game, first);
            let target = cell((line[2] % 3) as u8, (line[2] / 3) as u8);
            game.make_move(first, target).unwrap();

            assert_eq!(game.phase(), MatchPhase::Finished);
            assert_eq!(
                game.outcome(),
                Some(&Outcome::Winner { session_id: first })
            );
            assert_eq!(game.turn_holder(), None);
            let _ = second;
        }
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        let (mut game, first, _) = paired();
        // A B A / A B B / B A A holds no completed line.
        game.board = [
            Some(Token::A),
            Some(Token::B),
            Some(Token::A),
            Some(Token::A),
            Some(Token::B),
            Some(Token::B),
            Some(Token::B),
            Some(Token::A),
            None,
        ];
        set_turn(&mut game, first);
        game.make_move(first, cell(2, 2)).unwrap();

        assert_eq!(game.phase(), MatchPhase::Finished);
        assert_eq!(game.outcome(), Some(&Outcome::Draw));
    }

    #[test]
    fn completing_the_top_row_wins() {
        // Board A A _ / B B _ / _ _ _, A plays (2, 0).
        let (mut game, first, _) = paired();
        game.board[0] = Some(Token::A);
        game.board[1] = Some(Token::A);
        game.board[3] = Some(Token::B);
        game.board[4] = Some(Token::B);
        set_turn(&mut game, first);

        game.make_move(first, cell(2, 0)).unwrap();
        assert_eq!(game.phase(), MatchPhase::Finished);
        assert_eq!(
            game.outcome(),
            Some(&Outcome::Winner { session_id: first })
        );
    }

    #[test]
    fn leaving_active_match_ends_it_as_player_left() {
        let (mut game, first, second) = paired();
        let before = game.version();
        game.remove_participant(first);

        assert_eq!(game.phase(), MatchPhase::PlayerLeft);
        assert_eq!(game.version(), before + 1);
        // Positions survive so the remaining participant keeps its token.
        assert_eq!(game.token_of(second), Some(Token::B));
    }

    #[test]
    fn leaving_waiting_match_shrinks_participants() {
        let mut game = Match::new(Uuid::new_v4());
        let first = Uuid::new_v4();
        game.add_participant(first).unwrap();
        let before = game.version();

        game.remove_participant(first);
        assert_eq!(game.phase(), MatchPhase::SearchingPlayers);
        assert!(game.participants().is_empty());
        assert_eq!(game.version(), before + 1);
    }

    #[test]
    fn view_reflects_move_for_the_opponent() {
        let (mut game, first, second) = paired();
        set_turn(&mut game, first);
        let mut viewer = Session::create_new(second);
        viewer.record_acknowledged_version(game.version());
        let acked = viewer.last_acknowledged_version();

        game.make_move(first, cell(0, 0)).unwrap();
        let view = game.view_for(&viewer);

        assert_eq!(view.version, acked + 1);
        assert_eq!(view.grid[0][0], Some(Token::A));
        assert_eq!(view.opponent_id, Some(first));
        assert_eq!(view.your_token, Some(Token::B));
        assert!(view.your_turn);
        assert_eq!(view.you_won, None);
    }

    #[test]
    fn finished_view_reports_winner_per_participant() {
        let (mut game, first, second) = paired();
        game.board[0] = Some(Token::A);
        game.board[1] = Some(Token::A);
        set_turn(&mut game, first);
        game.make_move(first, cell(2, 0)).unwrap();

        let winner_view = game.view_for(&Session::create_new(first));
        let loser_view = game.view_for(&Session::create_new(second));
        assert_eq!(winner_view.you_won, Some(true));
        assert_eq!(loser_view.you_won, Some(false));
    }

    #[test]
    fn record_round_trip_preserves_both_projections() {
        let (mut game, first, second) = paired();
        set_turn(&mut game, first);
        game.make_move(first, cell(0, 0)).unwrap();
        game.make_move(second, cell(1, 1)).unwrap();

        let record = MatchRecord::from(game.clone());
        let bytes = serde_json::to_vec(&record).unwrap();
        let restored: Match = serde_json::from_slice::<MatchRecord>(&bytes)
            .unwrap()
            .into();

        let viewer_a = Session::create_new(first);
        let viewer_b = Session::create_new(second);
        assert_eq!(game.view_for(&viewer_a), restored.view_for(&viewer_a));
        assert_eq!(game.view_for(&viewer_b), restored.view_for(&viewer_b));
    }

    #[test]
    fn phase_tag_round_trips_through_json() {
        for phase in [
            MatchPhase::Idle,
            MatchPhase::SearchingPlayers,
            MatchPhase::Active,
            MatchPhase::Finished,
            MatchPhase::PlayerLeft,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            let back: MatchPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(phase, back);
        }
        assert_eq!(
            serde_json::to_string(&MatchPhase::SearchingPlayers).unwrap(),
            "\"searchingPlayers\""
        );
    }

    #[test]
    fn cell_ref_rejects_out_of_grid_coordinates() {
        assert!(CellRef::new(2, 2).is_some());
        assert!(CellRef::new(3, 0).is_none());
        assert!(CellRef::new(0, 3).is_none());
    }
}
