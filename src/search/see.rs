//! Simplified static exchange evaluation.
//!
//! Only a pruning guard for quiescence: if the target square is defended,
//! assume the full exchange costs us the attacker; otherwise the capture
//! is free. No swap list.

use crate::board::{Board, Move, Piece};

/// Approximate material outcome of playing the capture `m`.
pub(crate) fn see(board: &Board, m: Move) -> i32 {
    let victim = if m.is_en_passant() {
        Piece::Pawn.value()
    } else {
        board.piece_at(m.to()).map_or(0, |(_, piece)| piece.value())
    };
    let attacker = board
        .piece_at(m.from())
        .map_or(0, |(_, piece)| piece.value());

    let defended = board.is_square_attacked(m.to(), board.side_to_move().opponent());
    if defended {
        victim - attacker
    } else {
        victim
    }
}
