//! A UCI chess engine: magic-bitboard move generation, principal
//! variation search with a shared lock-free transposition table, and a
//! quantized NNUE evaluator with incremental accumulators.
//!
//! The crate is layered bottom-up: [`board`] owns the position model and
//! move generation, [`nnue`] and [`eval`] score positions, [`tt`] caches
//! search results, [`search`] walks the tree across threads, [`time`]
//! turns clocks into deadlines, and [`uci`] speaks the protocol on top.

pub mod board;
pub mod eval;
pub mod nnue;
pub(crate) mod pst;
pub mod search;
pub mod time;
pub mod tt;
pub mod uci;
pub(crate) mod zobrist;
