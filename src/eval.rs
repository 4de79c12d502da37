//! Position evaluation: NNUE when a network is loaded, classical material
//! plus piece-square tables otherwise.

use crate::board::{Board, Color, Square};
use crate::nnue::NnueNetwork;
use crate::pst::{MATERIAL, PST};

/// Evaluate `board` from the side to move's perspective, in centipawns.
///
/// With a network the two perspective accumulators feed the dense layers;
/// the accumulators must be current, which holds along any line of
/// `make_move(.., Some(net))` calls from a refreshed root.
#[must_use]
pub fn evaluate(board: &Board, net: Option<&NnueNetwork>) -> i32 {
    match net {
        Some(net) => {
            let (us, them) = board.perspective_accumulators();
            net.evaluate(us, them)
        }
        None => evaluate_classical(board),
    }
}

/// Material and piece-square evaluation, side-to-move view. This is the
/// fallback when no network is loaded and the symmetric reference used by
/// search property tests.
#[must_use]
pub fn evaluate_classical(board: &Board) -> i32 {
    let mut score = 0;

    for idx in 0..64 {
        let Some((color, piece)) = board.piece_at(Square::from_index(idx)) else {
            continue;
        };
        let p_idx = piece.index();
        let pst_sq = match color {
            Color::White => idx,
            Color::Black => idx ^ 56,
        };
        let value = MATERIAL[p_idx] + PST[p_idx][pst_sq];
        match color {
            Color::White => score += value,
            Color::Black => score -= value,
        }
    }

    if board.white_to_move() {
        score
    } else {
        -score
    }
}
