use crate::bot::Bot;
use crate::game::{Board, GameError, Move, Player};
use crate::search::DEFAULT_DEPTH;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    #[serde(rename = "time_per_move_ms", with = "millis")]
    pub time_per_move: Duration,
    /// Moves allowed to each side before the game is drawn
    pub move_limit: usize,
    pub search_depth: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            time_per_move: Duration::from_secs(5),
            move_limit: 100,
            search_depth: DEFAULT_DEPTH,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchResult {
    AttackersWin { winner_name: String, moves: usize },
    DefendersWin { winner_name: String, moves: usize },
    Draw { moves: usize },
    Timeout { violator: String, winner: String },
    IllegalMove { violator: String, winner: String },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::AttackersWin { winner_name, .. } => Some(winner_name),
            MatchResult::DefendersWin { winner_name, .. } => Some(winner_name),
            MatchResult::Timeout { winner, .. } => Some(winner),
            MatchResult::IllegalMove { winner, .. } => Some(winner),
            MatchResult::Draw { .. } => None,
        }
    }
}

/// A finished game in replayable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub attackers: String,
    pub defenders: String,
    pub start_position: String,
    pub moves: Vec<String>,
    pub result: MatchResult,
    pub move_count: usize,
    pub repeated_position: bool,
    pub final_position: String,
}

pub struct Match {
    config: MatchConfig,
    start_position: String,
    board: Board,
    moves: Vec<Move>,
    attacker_bot: Box<dyn Bot>,
    defender_bot: Box<dyn Bot>,
}

impl Match {
    pub fn new(attacker_bot: Box<dyn Bot>, defender_bot: Box<dyn Bot>, config: MatchConfig) -> Self {
        Self::from_board(Board::new(), attacker_bot, defender_bot, config)
    }

    /// Start from an arbitrary position, such as one produced by [`Board::decode`]
    pub fn from_board(
        board: Board,
        attacker_bot: Box<dyn Bot>,
        defender_bot: Box<dyn Bot>,
        config: MatchConfig,
    ) -> Self {
        Match {
            config,
            start_position: board.encode(),
            board,
            moves: Vec::new(),
            attacker_bot,
            defender_bot,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    fn bot_name(&self, player: Player) -> &str {
        match player {
            Player::Attackers => self.attacker_bot.name(),
            Player::Defenders => self.defender_bot.name(),
        }
    }

    /// Play until the game is decided, a bot forfeits, or the move limit is hit
    pub fn play(&mut self) -> Result<MatchResult, GameError> {
        self.board.set_move_limit(self.config.move_limit)?;

        self.attacker_bot.game_start(Player::Attackers);
        self.defender_bot.game_start(Player::Defenders);

        info!(
            attackers = self.attacker_bot.name(),
            defenders = self.defender_bot.name(),
            move_limit = self.config.move_limit,
            "match starting"
        );
        debug!("initial board:\n{}", self.board);

        let result = loop {
            if self.board.is_game_over() {
                break self.decided();
            }
            if self.board.move_limit_reached() {
                info!(limit = self.config.move_limit, "move limit reached");
                break MatchResult::Draw {
                    moves: self.board.move_count(),
                };
            }

            let side = self.board.turn();
            // Records the loss when the side to move is stuck
            if !self.board.has_move(side) {
                info!(side = %side, "no legal move");
                continue;
            }

            let bot = match side {
                Player::Attackers => &mut self.attacker_bot,
                Player::Defenders => &mut self.defender_bot,
            };
            let start = Instant::now();
            let mv = bot.get_move(&self.board, self.config.time_per_move);
            let elapsed = start.elapsed();

            if let Some(result) = self.handle_move_result(mv, elapsed, side) {
                break result;
            }
        };

        self.attacker_bot.game_end();
        self.defender_bot.game_end();

        info!(?result, "match finished");
        Ok(result)
    }

    fn decided(&self) -> MatchResult {
        let moves = self.board.move_count();
        match self.board.winner() {
            Some(Player::Attackers) => MatchResult::AttackersWin {
                winner_name: self.attacker_bot.name().to_string(),
                moves,
            },
            Some(Player::Defenders) => MatchResult::DefendersWin {
                winner_name: self.defender_bot.name().to_string(),
                moves,
            },
            None => MatchResult::Draw { moves },
        }
    }

    fn forfeit(&self, violator: Player) -> (String, String) {
        (
            self.bot_name(violator).to_string(),
            self.bot_name(violator.opponent()).to_string(),
        )
    }

    fn handle_move_result(
        &mut self,
        mv: Option<Move>,
        elapsed: Duration,
        current_player: Player,
    ) -> Option<MatchResult> {
        if elapsed > self.config.time_per_move {
            let (violator, winner) = self.forfeit(current_player);
            warn!(
                bot = %violator,
                ?elapsed,
                limit = ?self.config.time_per_move,
                "timeout"
            );
            return Some(MatchResult::Timeout { violator, winner });
        }

        let Some(mv) = mv else {
            // The bot gave up with moves available
            warn!(bot = self.bot_name(current_player), "returned no move");
            return Some(MatchResult::Draw {
                moves: self.board.move_count(),
            });
        };

        if let Err(e) = self.board.make_move(mv) {
            let (violator, winner) = self.forfeit(current_player);
            warn!(bot = %violator, %mv, error = %e, "illegal move");
            return Some(MatchResult::IllegalMove { violator, winner });
        }
        self.moves.push(mv);

        debug!(
            bot = self.bot_name(current_player),
            %mv,
            ?elapsed,
            "move {}:\n{}",
            self.board.move_count(),
            self.board
        );

        self.attacker_bot.notify_move(mv);
        self.defender_bot.notify_move(mv);

        None
    }

    /// Replayable record of the game so far, closed by `result`
    pub fn record(&self, result: &MatchResult) -> GameRecord {
        GameRecord {
            attackers: self.attacker_bot.name().to_string(),
            defenders: self.defender_bot.name().to_string(),
            start_position: self.start_position.clone(),
            moves: self.moves.iter().map(Move::to_string).collect(),
            result: result.clone(),
            move_count: self.board.move_count(),
            repeated_position: self.board.repeated_position(),
            final_position: self.board.encode(),
        }
    }
}
