use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Board size constant (8x8 grid)
pub const BOARD_SIZE: i32 = 8;

/// The eight knight displacements
pub const KNIGHT_DELTAS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Red,
    Blue,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    /// Terminal status reached when this player wins
    pub fn winning_status(&self) -> GameStatus {
        match self {
            Player::Red => GameStatus::RedWins,
            Player::Blue => GameStatus::BlueWins,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Red => write!(f, "red"),
            Player::Blue => write!(f, "blue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Apply a displacement without bounds checking
    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub fn in_bounds(p: Position) -> bool {
    p.x >= 0 && p.x < BOARD_SIZE && p.y >= 0 && p.y < BOARD_SIZE
}

pub fn is_knight_move(from: Position, to: Position) -> bool {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    (dx == 1 && dy == 2) || (dx == 2 && dy == 1)
}

/// A square permanently closed off for the rest of the game, tagged with
/// the player who vacated it. The tag is informational only; a blocked
/// square is blocked for both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSquare {
    pub x: i32,
    pub y: i32,
    pub player: Player,
}

impl BlockedSquare {
    pub fn new(position: Position, player: Player) -> Self {
        BlockedSquare {
            x: position.x,
            y: position.y,
            player,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    RedWins,
    BlueWins,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinReason {
    Capture,
    Blocked,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::Capture => write!(f, "capture"),
            WinReason::Blocked => write!(f, "blocked"),
        }
    }
}

/// A decided game: who won and how
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Win {
    pub winner: Player,
    pub reason: WinReason,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("Not your turn")]
    WrongTurn,
    #[error("Game is already over")]
    GameOver,
    #[error("Target square is outside the board")]
    OutOfBounds,
    #[error("Not a valid knight move")]
    NotKnightMove,
    #[error("Target square is blocked")]
    SquareBlocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    current_player: Player,
    red_position: Option<Position>,
    blue_position: Option<Position>,
    turn_number: u32,
    blocked_squares: Vec<BlockedSquare>,
    status: GameStatus,
}

impl GameState {
    /// Create a fresh game: red to act, neither knight placed
    pub fn new() -> Self {
        GameState {
            current_player: Player::Red,
            red_position: None,
            blue_position: None,
            turn_number: 0,
            blocked_squares: Vec::new(),
            status: GameStatus::InProgress,
        }
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn position_of(&self, player: Player) -> Option<Position> {
        match player {
            Player::Red => self.red_position,
            Player::Blue => self.blue_position,
        }
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn blocked_squares(&self) -> &[BlockedSquare] {
        &self.blocked_squares
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn winner(&self) -> Option<Player> {
        match self.status {
            GameStatus::RedWins => Some(Player::Red),
            GameStatus::BlueWins => Some(Player::Blue),
            GameStatus::InProgress | GameStatus::Abandoned => None,
        }
    }

    /// Mark this game as abandoned (superseded by a new game)
    pub fn abandon(&mut self) {
        if self.status == GameStatus::InProgress {
            self.status = GameStatus::Abandoned;
        }
    }

    pub fn is_blocked(&self, target: Position) -> bool {
        self.blocked_squares.iter().any(|b| b.position() == target)
    }

    /// Destination-occupancy rule shared by move validation and stalemate
    /// enumeration: a square can be landed on if it is not blocked, or if
    /// it is the opponent's current square (the capture case).
    fn destination_open(&self, player: Player, target: Position) -> bool {
        !self.is_blocked(target) || self.position_of(player.opponent()) == Some(target)
    }

    /// Check a proposed move without applying it
    pub fn validate(&self, player: Player, target: Position) -> Result<(), MoveError> {
        if player != self.current_player {
            return Err(MoveError::WrongTurn);
        }
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if !in_bounds(target) {
            return Err(MoveError::OutOfBounds);
        }

        match self.position_of(player) {
            // First placement: any unblocked square, knight shape not required
            None => {
                if self.is_blocked(target) {
                    return Err(MoveError::SquareBlocked);
                }
                Ok(())
            }
            Some(from) => {
                if !is_knight_move(from, target) {
                    return Err(MoveError::NotKnightMove);
                }
                if !self.destination_open(player, target) {
                    return Err(MoveError::SquareBlocked);
                }
                Ok(())
            }
        }
    }

    /// Apply a move, returning the win if it captured the opponent.
    ///
    /// Stalemate is deliberately not evaluated here; callers check
    /// `blocked_win` the next time state is read (see that method).
    pub fn apply_move(
        &mut self,
        player: Player,
        target: Position,
    ) -> Result<Option<Win>, MoveError> {
        self.validate(player, target)?;

        let opponent_position = self.position_of(player.opponent());

        // The vacated square becomes permanently blocked
        if let Some(from) = self.position_of(player) {
            self.blocked_squares.push(BlockedSquare::new(from, player));
        }

        match player {
            Player::Red => self.red_position = Some(target),
            Player::Blue => self.blue_position = Some(target),
        }
        self.current_player = player.opponent();
        self.turn_number += 1;

        // Landing on the opponent (as they stood before this move) is a capture
        if opponent_position == Some(target) {
            self.status = player.winning_status();
            return Ok(Some(Win {
                winner: player,
                reason: WinReason::Capture,
            }));
        }

        Ok(None)
    }

    /// Enumerate the legal destinations for a player
    pub fn legal_moves(&self, player: Player) -> Vec<Position> {
        if self.is_game_over() {
            return Vec::new();
        }

        match self.position_of(player) {
            // Free placement: every unblocked square on the board
            None => {
                let mut moves = Vec::new();
                for x in 0..BOARD_SIZE {
                    for y in 0..BOARD_SIZE {
                        let p = Position::new(x, y);
                        if !self.is_blocked(p) {
                            moves.push(p);
                        }
                    }
                }
                moves
            }
            Some(from) => KNIGHT_DELTAS
                .iter()
                .map(|&(dx, dy)| from.offset(dx, dy))
                .filter(|&p| in_bounds(p) && self.destination_open(player, p))
                .collect(),
        }
    }

    /// Lazy stalemate check: decides whether the player whose turn it is
    /// has been boxed in, in which case their opponent wins.
    ///
    /// Only meaningful once both players have placed (turn 2 onward); a
    /// player without a position always has a free placement available.
    pub fn blocked_win(&self) -> Option<Win> {
        if self.is_game_over() || self.turn_number < 2 {
            return None;
        }
        self.position_of(self.current_player)?;

        if self.legal_moves(self.current_player).is_empty() {
            Some(Win {
                winner: self.current_player.opponent(),
                reason: WinReason::Blocked,
            })
        } else {
            None
        }
    }

    /// Run the lazy stalemate check and, if it fires, settle the status
    pub fn resolve_blocked_win(&mut self) -> Option<Win> {
        let win = self.blocked_win()?;
        self.status = win.winner.winning_status();
        Some(win)
    }

    /// Get a string representation of the board
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        result.push_str("   ");
        for x in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", x));
        }
        result.push('\n');

        for y in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", y));
            for x in 0..BOARD_SIZE {
                let p = Position::new(x, y);
                let c = if self.red_position == Some(p) {
                    'R'
                } else if self.blue_position == Some(p) {
                    'B'
                } else if self.is_blocked(p) {
                    'x'
                } else {
                    '.'
                };
                result.push_str(&format!(" {} ", c));
            }
            result.push('\n');
        }

        result
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
