//! Depth-bounded minimax with alpha-beta pruning.
//!
//! Scores are from the defenders' point of view: defenders maximize, attackers
//! minimize. Every explored line runs on its own [`Board`] clone, so the caller's
//! board and sibling branches never see each other's moves.

use thiserror::Error;
use tracing::debug;

use crate::game::{Board, GameError, Move, Player};
use crate::square::THRONE;

/// Lookahead used when nothing else is configured
pub const DEFAULT_DEPTH: u32 = 3;

/// Magnitude of a decided game. Wins found deeper in the tree score slightly less,
/// so the engine takes the quickest win and postpones a loss.
pub const WINNING_VALUE: i32 = i32::MAX - 20;

/// Bound larger than any score
const INFINITY: i32 = i32::MAX;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Game already over")]
    GameOver,
    #[error("No legal move for {0}")]
    NoLegalMove(Player),
    #[error(transparent)]
    Rules(#[from] GameError),
}

/// Value of a searched position and, at the root, the move that achieves it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub score: i32,
    pub best_move: Option<Move>,
}

impl Evaluation {
    fn leaf(score: i32) -> Self {
        Evaluation {
            score,
            best_move: None,
        }
    }
}

/// Search depth for `board`
pub fn max_depth(_board: &Board) -> u32 {
    DEFAULT_DEPTH
}

/// Pick a move for the side to move in `board`
pub fn choose_move(board: &Board, depth: u32) -> Result<Move, SearchError> {
    let side = board.turn();
    search(board, depth)?
        .best_move
        .ok_or(SearchError::NoLegalMove(side))
}

/// Alpha-beta search to `depth` plies (at least one)
pub fn search(board: &Board, depth: u32) -> Result<Evaluation, SearchError> {
    run(board, depth, true)
}

/// Exhaustive minimax over the same tree as [`search`], without pruning
pub fn minimax(board: &Board, depth: u32) -> Result<Evaluation, SearchError> {
    run(board, depth, false)
}

struct Context {
    prune: bool,
    nodes: u64,
}

fn run(board: &Board, depth: u32, prune: bool) -> Result<Evaluation, SearchError> {
    if board.is_game_over() {
        return Err(SearchError::GameOver);
    }
    let mut root = board.snapshot();
    let side = root.turn();
    if !root.has_move(side) {
        return Err(SearchError::NoLegalMove(side));
    }

    let depth = depth.max(1);
    let mut ctx = Context { prune, nodes: 0 };
    let eval = explore(&mut ctx, &mut root, depth, 0, -INFINITY, INFINITY)?;

    debug!(
        side = %side,
        depth,
        prune,
        nodes = ctx.nodes,
        score = eval.score,
        best = ?eval.best_move.map(|mv| mv.to_string()),
        "search finished"
    );
    Ok(eval)
}

fn explore(
    ctx: &mut Context,
    node: &mut Board,
    depth: u32,
    ply: u32,
    mut alpha: i32,
    mut beta: i32,
) -> Result<Evaluation, SearchError> {
    ctx.nodes += 1;

    if depth == 0 || node.is_game_over() {
        return Ok(Evaluation::leaf(leaf_score(node, ply)));
    }

    let side = node.turn();
    let moves = node.legal_moves(side);
    if moves.is_empty() {
        return Ok(Evaluation::leaf(leaf_score(node, ply)));
    }

    let maximizing = side == Player::Defenders;
    let record = ply == 0;
    let mut value = if maximizing { -INFINITY } else { INFINITY };
    let mut best = None;
    let mut last = None;

    for mv in moves {
        let mut child = node.snapshot();
        child.make_move(mv)?;
        let score = explore(ctx, &mut child, depth - 1, ply + 1, alpha, beta)?.score;

        let improved = if maximizing { score > value } else { score < value };
        if improved {
            value = score;
            if record {
                best = Some(mv);
            }
        }
        last = Some(mv);

        if ctx.prune {
            if maximizing {
                alpha = alpha.max(value);
            } else {
                beta = beta.min(value);
            }
            if alpha >= beta {
                break;
            }
        }
    }

    Ok(Evaluation {
        score: value,
        best_move: if record { best.or(last) } else { None },
    })
}

/// Static score, with decided games pulled toward zero by their distance from the root
fn leaf_score(node: &mut Board, ply: u32) -> i32 {
    let score = static_score(node);
    if score.abs() == WINNING_VALUE {
        score - score.signum() * ply as i32
    } else {
        score
    }
}

/// Heuristic value of `board`. Decided or immobilized positions score
/// `±WINNING_VALUE`; otherwise material balance scaled by how far the king has
/// strayed from the centre on both axes.
///
/// Checking mobility may record an immobilization loss on `board`.
pub fn static_score(board: &mut Board) -> i32 {
    match board.winner() {
        Some(Player::Attackers) => return -WINNING_VALUE,
        Some(Player::Defenders) => return WINNING_VALUE,
        None => {}
    }
    if !board.has_move(Player::Defenders) {
        return -WINNING_VALUE;
    }
    if !board.has_move(Player::Attackers) {
        return WINNING_VALUE;
    }
    let Some(king) = board.king_position() else {
        return -WINNING_VALUE;
    };

    let defenders = board.piece_count(Player::Defenders) as i32;
    let attackers = board.piece_count(Player::Attackers) as i32;
    let spread = king.col().abs_diff(THRONE.col()) * king.row().abs_diff(THRONE.row());

    (defenders - attackers) * spread as i32
}
