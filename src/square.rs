use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::game::GameError;

/// Number of squares on a side of the board
pub const SIZE: usize = 9;
pub const SQUARE_COUNT: usize = SIZE * SIZE;

/// Centre of the board, home of the king
pub const THRONE: Square = Square { row: 4, col: 4 };

/// The four orthogonal directions, in move generation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// (column delta, row delta); north is increasing row
    fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// The two directions at right angles to this one
    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::North | Direction::South => [Direction::East, Direction::West],
            Direction::East | Direction::West => [Direction::North, Direction::South],
        }
    }
}

/// A square of the 9x9 board. Ordered by canonical index (row-major from a1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    row: usize,
    col: usize,
}

/// For every square (by index) and direction, the squares reachable along that line
/// on an empty board, nearest first.
static ROOK_SQUARES: LazyLock<Vec<[Vec<Square>; 4]>> = LazyLock::new(|| {
    Square::all()
        .map(|from| Direction::ALL.map(|dir| {
            (1..SIZE)
                .map_while(|steps| from.step(dir, steps))
                .collect::<Vec<_>>()
        }))
        .collect()
});

impl Square {
    /// Square at column `col` and row `row`, both 0-indexed
    pub fn new(col: usize, row: usize) -> Self {
        debug_assert!(col < SIZE && row < SIZE, "square ({col}, {row}) off the board");
        Square { row, col }
    }

    pub fn checked(col: usize, row: usize) -> Option<Self> {
        (col < SIZE && row < SIZE).then_some(Square { row, col })
    }

    pub fn from_index(index: usize) -> Self {
        Square::new(index % SIZE, index / SIZE)
    }

    /// All squares in canonical order
    pub fn all() -> impl Iterator<Item = Square> {
        (0..SQUARE_COUNT).map(Square::from_index)
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn index(&self) -> usize {
        self.row * SIZE + self.col
    }

    pub fn is_edge(&self) -> bool {
        self.row == 0 || self.col == 0 || self.row == SIZE - 1 || self.col == SIZE - 1
    }

    /// The square `steps` away in `dir`, if it is on the board
    pub fn step(&self, dir: Direction, steps: usize) -> Option<Square> {
        let (dc, dr) = dir.delta();
        let col = self.col as isize + dc * steps as isize;
        let row = self.row as isize + dr * steps as isize;
        if col < 0 || row < 0 {
            return None;
        }
        Square::checked(col as usize, row as usize)
    }

    pub fn neighbor(&self, dir: Direction) -> Option<Square> {
        self.step(dir, 1)
    }

    /// Precomputed squares along `dir`, nearest first
    pub fn rook_squares(&self, dir: Direction) -> &'static [Square] {
        &ROOK_SQUARES[self.index()][dir.index()]
    }

    /// Direction of travel from here to `to`, if they share a row or column
    pub fn direction_to(&self, to: Square) -> Option<Direction> {
        if *self == to {
            None
        } else if self.col == to.col {
            Some(if to.row > self.row { Direction::North } else { Direction::South })
        } else if self.row == to.row {
            Some(if to.col > self.col { Direction::East } else { Direction::West })
        } else {
            None
        }
    }

    pub fn is_rook_move(&self, to: Square) -> bool {
        self.direction_to(to).is_some()
    }

    /// Squares strictly between here and `to` along a straight line
    pub fn squares_between(&self, to: Square) -> &'static [Square] {
        match self.direction_to(to) {
            Some(dir) => {
                let line = self.rook_squares(dir);
                let distance = self.row.abs_diff(to.row) + self.col.abs_diff(to.col);
                &line[..distance - 1]
            }
            None => &[],
        }
    }

    /// The square midway between here and `other` when they are two apart on a line
    pub fn between(&self, other: Square) -> Option<Square> {
        let dir = self.direction_to(other)?;
        (self.step(dir, 2) == Some(other))
            .then(|| self.neighbor(dir))
            .flatten()
    }

    pub fn is_adjacent(&self, other: Square) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col as u8) as char, self.row + 1)
    }
}

impl FromStr for Square {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(GameError::BadNotation(s.to_string()));
        }
        let col = bytes[0].wrapping_sub(b'a') as usize;
        let row = bytes[1].wrapping_sub(b'1') as usize;
        Square::checked(col, row).ok_or_else(|| GameError::BadNotation(s.to_string()))
    }
}
