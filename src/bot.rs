use crate::game::{Board, Move, Player};
use crate::search::{self, DEFAULT_DEPTH};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::warn;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Get the next move for the side to move on `board`.
    /// The bot has a time limit to respond
    fn get_move(&mut self, board: &Board, time_limit: Duration) -> Option<Move>;

    /// Notified when the game starts
    fn game_start(&mut self, _player: Player) {}

    /// Notified when a move is made (by either player)
    fn notify_move(&mut self, _mv: Move) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// Plays the move found by a fixed-depth alpha-beta search
pub struct AlphaBetaBot {
    name: String,
    depth: u32,
}

impl AlphaBetaBot {
    pub fn new(name: String, depth: u32) -> Self {
        AlphaBetaBot { name, depth }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Default for AlphaBetaBot {
    fn default() -> Self {
        AlphaBetaBot::new("AlphaBeta".to_string(), DEFAULT_DEPTH)
    }
}

impl Bot for AlphaBetaBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, _time_limit: Duration) -> Option<Move> {
        match search::choose_move(board, self.depth) {
            Ok(mv) => Some(mv),
            Err(e) => {
                warn!(bot = %self.name, error = %e, "search produced no move");
                None
            }
        }
    }
}

/// Picks uniformly among the legal moves
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        RandomBot {
            name,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible move sequence for a given seed
    pub fn with_seed(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, _time_limit: Duration) -> Option<Move> {
        if board.is_game_over() {
            return None;
        }
        board
            .legal_moves(board.turn())
            .choose(&mut self.rng)
            .copied()
    }
}
