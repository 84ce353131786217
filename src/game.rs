use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::square::{Direction, SIZE, SQUARE_COUNT, Square, THRONE};

/// Length of an encoded position: side to move plus one symbol per square
pub const ENCODED_LEN: usize = SQUARE_COUNT + 1;

const EMPTY_SYMBOL: char = '-';

/// Attacker starting squares as (col, row)
const INITIAL_ATTACKERS: [(usize, usize); 16] = [
    (0, 3),
    (0, 4),
    (0, 5),
    (1, 4),
    (8, 3),
    (8, 4),
    (8, 5),
    (7, 4),
    (3, 0),
    (4, 0),
    (5, 0),
    (4, 1),
    (3, 8),
    (4, 8),
    (5, 8),
    (4, 7),
];

/// Defender starting squares as (col, row); the king starts on the throne
const INITIAL_DEFENDERS: [(usize, usize); 8] = [
    (4, 5),
    (5, 4),
    (4, 3),
    (3, 4),
    (4, 6),
    (4, 2),
    (2, 4),
    (6, 4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Piece {
    Attacker,
    Defender,
    King,
}

impl Piece {
    pub fn side(&self) -> Player {
        match self {
            Piece::Attacker => Player::Attackers,
            Piece::Defender | Piece::King => Player::Defenders,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Piece::Attacker => 'B',
            Piece::Defender => 'W',
            Piece::King => 'K',
        }
    }

    fn from_symbol(c: char) -> Option<Piece> {
        match c {
            'B' => Some(Piece::Attacker),
            'W' => Some(Piece::Defender),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Attackers,
    Defenders,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::Attackers => Player::Defenders,
            Player::Defenders => Player::Attackers,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Player::Attackers => 'B',
            Player::Defenders => 'W',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Attackers => write!(f, "Attackers"),
            Player::Defenders => write!(f, "Defenders"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = GameError;

    /// Parses `e2-e4` style notation; the squares must share a row or column
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| GameError::BadNotation(s.to_string()))?;
        let mv = Move::new(from.parse()?, to.parse()?);
        if !mv.from.is_rook_move(mv.to) {
            return Err(GameError::BadNotation(s.to_string()));
        }
        Ok(mv)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Game already over")]
    GameOver,
    #[error("Move limit {limit} is too small: {move_count} moves already played")]
    MoveLimit { limit: usize, move_count: usize },
    #[error("Bad notation: {0:?}")]
    BadNotation(String),
    #[error("Bad position encoding: {0}")]
    BadEncoding(String),
}

/// The state of a Tablut game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Indexed `[row][col]`
    board: [[Option<Piece>; SIZE]; SIZE],
    turn: Player,
    move_count: usize,
    move_limit: Option<usize>,
    king_position: Option<Square>,
    /// Encoded positions before each applied move, oldest first
    history: Vec<String>,
    winner: Option<Player>,
    repeated: bool,
}

impl Board {
    /// A board in the standard starting position, attackers to move
    pub fn new() -> Self {
        let mut state = Board::blank(Player::Attackers);

        for &(c, r) in &INITIAL_ATTACKERS {
            state.put(Square::new(c, r), Piece::Attacker);
        }
        for &(c, r) in &INITIAL_DEFENDERS {
            state.put(Square::new(c, r), Piece::Defender);
        }
        state.put(THRONE, Piece::King);

        state
    }

    fn blank(turn: Player) -> Self {
        Board {
            board: [[None; SIZE]; SIZE],
            turn,
            move_count: 0,
            move_limit: None,
            king_position: None,
            history: Vec::new(),
            winner: None,
            repeated: false,
        }
    }

    /// Independent copy for exploring hypothetical lines
    pub fn snapshot(&self) -> Board {
        self.clone()
    }

    /// Rebuild a board from [`Board::encode`] output. The result has no history.
    pub fn decode(encoded: &str) -> Result<Board, GameError> {
        let count = encoded.chars().count();
        if count != ENCODED_LEN {
            return Err(GameError::BadEncoding(format!(
                "expected {ENCODED_LEN} characters, found {count}"
            )));
        }

        let mut chars = encoded.chars();
        if !matches!(chars.next(), Some('B' | 'W')) {
            return Err(GameError::BadEncoding(
                "first character must be the side to move (B or W)".to_string(),
            ));
        }

        let mut kings = 0;
        for (i, c) in chars.enumerate() {
            match c {
                'K' => kings += 1,
                'B' | 'W' | EMPTY_SYMBOL => {}
                other => {
                    return Err(GameError::BadEncoding(format!(
                        "unexpected {other:?} at square {}",
                        Square::from_index(i)
                    )));
                }
            }
        }
        if kings > 1 {
            return Err(GameError::BadEncoding(format!("{kings} kings on the board")));
        }

        let mut state = Board::blank(Player::Attackers);
        state.restore(encoded);
        Ok(state)
    }

    /// Side to move followed by every square in canonical order
    pub fn encode(&self) -> String {
        let mut result = String::with_capacity(ENCODED_LEN);
        result.push(self.turn.symbol());
        for sq in Square::all() {
            result.push(self.get(sq).map_or(EMPTY_SYMBOL, |p| p.symbol()));
        }
        result
    }

    /// Load grid, turn and king from an encoding. Assumes the input is well formed.
    fn restore(&mut self, encoded: &str) {
        let mut chars = encoded.chars();
        self.turn = match chars.next() {
            Some('W') => Player::Defenders,
            _ => Player::Attackers,
        };
        self.board = [[None; SIZE]; SIZE];
        self.king_position = None;

        for (sq, c) in Square::all().zip(chars) {
            if let Some(piece) = Piece::from_symbol(c) {
                self.put(sq, piece);
            }
        }

        if self.king_position.is_none() {
            self.declare_winner(Player::Attackers);
        }
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// True when the winner was decided by a repeated position
    pub fn repeated_position(&self) -> bool {
        self.repeated
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn king_position(&self) -> Option<Square> {
        self.king_position
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn move_limit(&self) -> Option<usize> {
        self.move_limit
    }

    /// Limit each side to `limit` moves. It is an error if `2 * limit <= move_count()`.
    /// A limit too large to count in plies never runs out.
    pub fn set_move_limit(&mut self, limit: usize) -> Result<(), GameError> {
        if limit.checked_mul(2).is_some_and(|plies| plies <= self.move_count) {
            return Err(GameError::MoveLimit {
                limit,
                move_count: self.move_count,
            });
        }
        self.move_limit = Some(limit);
        Ok(())
    }

    pub fn move_limit_reached(&self) -> bool {
        self.move_limit
            .and_then(|limit| limit.checked_mul(2))
            .is_some_and(|plies| self.move_count >= plies)
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.board[sq.row()][sq.col()]
    }

    /// Squares holding pieces of `side`, in canonical order
    pub fn pieces(&self, side: Player) -> impl Iterator<Item = Square> + '_ {
        Square::all().filter(move |&sq| self.get(sq).is_some_and(|p| p.side() == side))
    }

    /// Number of pieces on `side`; the king counts for the defenders
    pub fn piece_count(&self, side: Player) -> usize {
        self.pieces(side).count()
    }

    fn put(&mut self, sq: Square, piece: Piece) {
        self.board[sq.row()][sq.col()] = Some(piece);
        if piece == Piece::King {
            self.king_position = Some(sq);
            if sq.is_edge() {
                self.declare_winner(Player::Defenders);
            }
        }
    }

    fn clear(&mut self, sq: Square) {
        self.board[sq.row()][sq.col()] = None;
    }

    /// The first decided result sticks
    fn declare_winner(&mut self, player: Player) {
        if self.winner.is_none() {
            self.winner = Some(player);
        }
    }

    /// True iff the piece on `from` may move with the current side to move
    pub fn is_legal_origin(&self, from: Square) -> bool {
        self.get(from).is_some_and(|p| p.side() == self.turn)
    }

    /// True iff `mv` is legal for the side to move
    pub fn is_legal(&self, mv: Move) -> bool {
        self.is_legal_for(self.turn, mv)
    }

    fn is_legal_for(&self, side: Player, mv: Move) -> bool {
        let Some(piece) = self.get(mv.from) else {
            return false;
        };
        if piece.side() != side || !mv.from.is_rook_move(mv.to) || self.get(mv.to).is_some() {
            return false;
        }
        // Only the king may stop on the throne
        if piece != Piece::King && mv.to == THRONE {
            return false;
        }
        mv.from
            .squares_between(mv.to)
            .iter()
            .all(|&sq| self.get(sq).is_none())
    }

    fn moves_for(&self, side: Player) -> impl Iterator<Item = Move> + '_ {
        self.pieces(side)
            .flat_map(move |from| {
                Direction::ALL.into_iter().flat_map(move |dir| {
                    from.rook_squares(dir)
                        .iter()
                        .take_while(move |&&to| self.get(to).is_none())
                        .map(move |&to| Move::new(from, to))
                })
            })
            .filter(move |&mv| self.is_legal_for(side, mv))
    }

    /// All legal moves for `side`, whoever is to move. Ordered by origin square,
    /// then direction (N, E, S, W), then distance.
    pub fn legal_moves(&self, side: Player) -> Vec<Move> {
        self.moves_for(side).collect()
    }

    /// True iff `side` has a legal move. Otherwise `side` is immobilized and loses.
    pub fn has_move(&mut self, side: Player) -> bool {
        let found = self.moves_for(side).next().is_some();
        if !found {
            self.declare_winner(side.opponent());
        }
        found
    }

    /// Apply `mv` for the side to move
    pub fn make_move(&mut self, mv: Move) -> Result<(), GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let piece = match self.get(mv.from) {
            Some(piece) if self.is_legal(mv) => piece,
            _ => {
                return Err(GameError::IllegalMove(format!(
                    "{mv} is not legal for {}",
                    self.turn
                )));
            }
        };

        self.history.push(self.encode());
        self.move_count += 1;

        self.clear(mv.from);
        self.put(mv.to, piece);

        self.check_captures(mv.to, piece.side());

        self.turn = piece.side().opponent();

        if self.winner.is_none() {
            let position = self.encode();
            if self.history.contains(&position) {
                self.repeated = true;
                self.winner = Some(self.turn);
            }
        }

        Ok(())
    }

    /// Take back the last move. Has no effect on a board with no moves made.
    pub fn undo(&mut self) {
        let Some(previous) = self.history.pop() else {
            return;
        };
        self.move_count -= 1;
        self.winner = None;
        self.repeated = false;
        self.restore(&previous);
    }

    fn check_captures(&mut self, moved_to: Square, side: Player) {
        for dir in Direction::ALL {
            let Some(far) = moved_to.step(dir, 2) else {
                continue;
            };
            let Some(mid) = moved_to.between(far) else {
                continue;
            };

            let anvil = far == THRONE || self.get(far).is_some_and(|p| p.side() == side);
            if !anvil {
                continue;
            }

            if let Some(target) = self.get(mid) {
                if self.can_capture(moved_to, mid, far, target, dir) {
                    self.capture(mid, target);
                }
            }
        }
    }

    fn can_capture(&self, hammer: Square, mid: Square, far: Square, target: Piece, dir: Direction) -> bool {
        if target == Piece::King {
            return if mid == THRONE || mid.is_adjacent(THRONE) {
                // On or beside the throne the king must be enclosed on all sides
                Direction::ALL.into_iter().all(|d| {
                    mid.neighbor(d)
                        .is_some_and(|sq| self.is_hostile(sq, Piece::King))
                })
            } else {
                self.is_hostile(hammer, target) && self.is_hostile(far, target)
            };
        }

        if self.is_hostile(hammer, target) && self.is_hostile(far, target) {
            return true;
        }

        target == Piece::Defender && self.throne_guard_broken(hammer, mid, far, dir)
    }

    /// A defender between an attacker and the king's throne falls when attackers also
    /// close it in on both flanks across the line of capture.
    fn throne_guard_broken(&self, hammer: Square, mid: Square, far: Square, dir: Direction) -> bool {
        far == THRONE
            && self.get(THRONE) == Some(Piece::King)
            && self.get(hammer) == Some(Piece::Attacker)
            && dir.perpendicular().into_iter().all(|side| {
                mid.neighbor(side)
                    .is_some_and(|sq| self.get(sq) == Some(Piece::Attacker))
            })
    }

    /// An empty throne is hostile to everyone; otherwise only enemy pieces are
    fn is_hostile(&self, sq: Square, piece: Piece) -> bool {
        if sq == THRONE && self.get(THRONE) != Some(Piece::King) {
            return true;
        }
        self.get(sq)
            .is_some_and(|other| other.side() == piece.side().opponent())
    }

    fn capture(&mut self, sq: Square, piece: Piece) {
        self.clear(sq);
        if piece == Piece::King {
            self.king_position = None;
            self.declare_winner(Player::Attackers);
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..SIZE).rev() {
            write!(f, "{:2}", row + 1)?;
            for col in 0..SIZE {
                let sq = Square::new(col, row);
                let c = match self.get(sq) {
                    Some(piece) => piece.symbol(),
                    None if sq == THRONE => 'T',
                    None => EMPTY_SYMBOL,
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for c in 'a'..='i' {
            write!(f, " {c}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
impl Board {
    /// Empty board for building fixtures
    pub(crate) fn empty(turn: Player) -> Self {
        Board::blank(turn)
    }

    pub(crate) fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        match piece {
            Some(p) => self.put(sq, p),
            None => self.clear(sq),
        }
    }
}
