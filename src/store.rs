use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::game::{GameState, MoveError, Player, Position, Win};

pub type GameId = u64;

/// Aggregate win counters across all finished games
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    pub red_wins: u32,
    pub blue_wins: u32,
    pub total_games: u32,
}

/// One finished game, recorded at the moment a winner was decided
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistoryEntry {
    pub game_id: GameId,
    pub winner: Player,
    pub total_turns: u32,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("No active game found")]
    NoActiveGame,
    #[error("{0}")]
    Move(#[from] MoveError),
}

/// Result of a successfully applied move
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub id: GameId,
    pub game: GameState,
    pub win: Option<Win>,
}

/// In-memory table of games keyed by id, with at most one active game,
/// plus the score counters and finished-game history.
///
/// Callers are expected to serialize access (the web layer wraps this in
/// a mutex), so reads and writes here never race.
#[derive(Debug, Default)]
pub struct GameStore {
    games: HashMap<GameId, GameState>,
    active: Option<GameId>,
    next_id: GameId,
    scores: Scores,
    history: Vec<HistoryEntry>,
}

impl GameStore {
    pub fn new() -> Self {
        GameStore::default()
    }

    /// Start a fresh game, abandoning any game still in progress
    pub fn new_game(&mut self) -> (GameId, GameState) {
        if let Some(id) = self.active.take() {
            if let Some(game) = self.games.get_mut(&id) {
                game.abandon();
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        let game = GameState::new();
        self.games.insert(id, game.clone());
        self.active = Some(id);
        (id, game)
    }

    /// Read the active game, running the lazy stalemate check first.
    ///
    /// If the player to move turns out to be boxed in, the game is
    /// finalized here and the win is reported alongside the final state.
    pub fn current(&mut self) -> Option<(GameId, GameState, Option<Win>)> {
        let id = self.active?;
        let game = self.games.get_mut(&id)?;

        if let Some(win) = game.resolve_blocked_win() {
            let snapshot = game.clone();
            self.finish(id, win);
            return Some((id, snapshot, Some(win)));
        }

        Some((id, game.clone(), None))
    }

    /// Apply a move to the active game
    pub fn apply_move(&mut self, player: Player, target: Position) -> Result<MoveOutcome, StoreError> {
        let id = self.active.ok_or(StoreError::NoActiveGame)?;
        let game = self
            .games
            .get_mut(&id)
            .ok_or(StoreError::NoActiveGame)?;

        let win = game.apply_move(player, target)?;
        let snapshot = game.clone();

        if let Some(win) = win {
            self.finish(id, win);
        }

        Ok(MoveOutcome {
            id,
            game: snapshot,
            win,
        })
    }

    pub fn game(&self, id: GameId) -> Option<&GameState> {
        self.games.get(&id)
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Record a decided game: bump the counters, append the history row,
    /// and clear the active slot
    fn finish(&mut self, id: GameId, win: Win) {
        match win.winner {
            Player::Red => self.scores.red_wins += 1,
            Player::Blue => self.scores.blue_wins += 1,
        }
        self.scores.total_games += 1;

        let total_turns = self
            .games
            .get(&id)
            .map(|g| g.turn_number())
            .unwrap_or_default();
        self.history.push(HistoryEntry {
            game_id: id,
            winner: win.winner,
            total_turns,
        });

        if self.active == Some(id) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameStatus, WinReason};

    fn place_both(store: &mut GameStore) {
        store.apply_move(Player::Red, Position::new(0, 0)).unwrap();
        store.apply_move(Player::Blue, Position::new(7, 7)).unwrap();
    }

    #[test]
    fn test_no_active_game_initially() {
        let mut store = GameStore::new();
        assert_eq!(store.current(), None);
        assert_eq!(
            store
                .apply_move(Player::Red, Position::new(0, 0))
                .unwrap_err(),
            StoreError::NoActiveGame
        );
    }

    #[test]
    fn test_new_game_abandons_previous() {
        let mut store = GameStore::new();
        let (first_id, _) = store.new_game();
        let (second_id, _) = store.new_game();

        assert_ne!(first_id, second_id);
        assert_eq!(
            store.game(first_id).unwrap().status(),
            GameStatus::Abandoned
        );
        assert_eq!(
            store.game(second_id).unwrap().status(),
            GameStatus::InProgress
        );

        let (current_id, _, _) = store.current().unwrap();
        assert_eq!(current_id, second_id);

        // Abandoned games count for neither player
        assert_eq!(store.scores(), Scores::default());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_move_errors_pass_through() {
        let mut store = GameStore::new();
        store.new_game();
        place_both(&mut store);

        assert_eq!(
            store
                .apply_move(Player::Blue, Position::new(5, 5))
                .unwrap_err(),
            StoreError::Move(MoveError::WrongTurn)
        );
    }

    #[test]
    fn test_capture_finalizes_scores_and_history() {
        let mut store = GameStore::new();
        let (id, _) = store.new_game();
        store.apply_move(Player::Red, Position::new(3, 4)).unwrap();
        store.apply_move(Player::Blue, Position::new(4, 6)).unwrap();

        // Red lands on blue: capture
        let outcome = store.apply_move(Player::Red, Position::new(4, 6)).unwrap();
        assert_eq!(
            outcome.win,
            Some(Win {
                winner: Player::Red,
                reason: WinReason::Capture,
            })
        );
        assert_eq!(outcome.game.status(), GameStatus::RedWins);

        assert_eq!(store.scores().red_wins, 1);
        assert_eq!(store.scores().blue_wins, 0);
        assert_eq!(store.scores().total_games, 1);

        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].game_id, id);
        assert_eq!(store.history()[0].winner, Player::Red);
        assert_eq!(store.history()[0].total_turns, 3);

        // The finished game is no longer the active one
        assert_eq!(store.current(), None);
        assert_eq!(
            store
                .apply_move(Player::Blue, Position::new(0, 0))
                .unwrap_err(),
            StoreError::NoActiveGame
        );
    }

    #[test]
    fn test_read_finalizes_blocked_game() {
        let mut store = GameStore::new();
        let (id, _) = store.new_game();

        // Box red into the corner: red hops (2,1) -> (0,0), blocking
        // (2,1) itself; blue vacates (1,2), blocking red's other exit
        store.apply_move(Player::Red, Position::new(2, 1)).unwrap();
        store.apply_move(Player::Blue, Position::new(1, 2)).unwrap();
        store.apply_move(Player::Red, Position::new(0, 0)).unwrap();
        store.apply_move(Player::Blue, Position::new(3, 3)).unwrap();

        // Red sits at (0,0) with both exits blocked, so the next read
        // must end the game in blue's favor
        let (read_id, game, win) = store.current().unwrap();
        assert_eq!(read_id, id);
        assert_eq!(
            win,
            Some(Win {
                winner: Player::Blue,
                reason: WinReason::Blocked,
            })
        );
        assert_eq!(game.status(), GameStatus::BlueWins);

        assert_eq!(store.scores().blue_wins, 1);
        assert_eq!(store.scores().total_games, 1);
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = GameStore::new();
        let (a, _) = store.new_game();
        let (b, _) = store.new_game();
        let (c, _) = store.new_game();
        assert!(a < b && b < c);
    }
}
