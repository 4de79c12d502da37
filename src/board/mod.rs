//! Chess board representation and game logic.
//!
//! Bitboards carry the position, a mailbox mirrors them for O(1) square
//! lookups, and magic bitboards drive slider move generation. The board is
//! copy-make: search clones it, applies a pseudo-legal move and discards
//! the clone if the move was illegal.
//!
//! # Example
//! ```
//! use pincer::board::Board;
//!
//! let board = Board::new();
//! let moves = board.generate_moves();
//! assert_eq!(moves.len(), 20);
//! ```

mod attack_tables;
mod debug;
mod error;
mod fen;
mod makemove;
mod movegen;
mod state;
mod types;

#[cfg(test)]
mod tests;

// Public API
pub use error::{FenError, MoveParseError, SquareError};
pub use state::Board;
pub use types::{Bitboard, Color, Move, MoveList, Piece, ScoredMove, ScoredMoveList, Square};

// Shared with sibling modules
pub(crate) use types::{
    bit_for_square, castle_bit, file_to_index, pop_lsb, rank_to_index, ALL_CASTLING_RIGHTS,
    CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K, CASTLE_WHITE_Q, CASTLING_RIGHTS_MASK,
    EMPTY_MOVE, MAX_PLY, PROMOTION_PIECES,
};
