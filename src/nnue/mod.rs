//! NNUE (efficiently updatable neural network) evaluation.
//!
//! A king-relative HalfKA feature transformer feeds two perspective
//! accumulators that the board keeps up to date incrementally; two small
//! dense layers and a scalar output turn them into a centipawn score. All
//! arithmetic is quantized-integer.
//!
//! Architecture: 45056 -> (256 x 2 perspectives) -> 32 -> 32 -> 1

mod accumulator;
mod leb128;
mod loader;
mod network;
mod simd;

pub use accumulator::Accumulator;
pub use loader::NnueError;
pub use network::NnueNetwork;

/// Accumulator width per perspective. Must match the network file.
pub const HIDDEN_SIZE: usize = 256;

/// Oriented piece-color codes: five piece types of each color plus the
/// opponent king. The perspective's own king is the bucket, not a feature.
pub(crate) const PIECE_CODES: usize = 11;

/// Features per king square: one (code, square) combination each.
pub(crate) const KING_STRIDE: usize = PIECE_CODES * 64;

/// Total input features: 64 king squares times the per-king stride.
pub const INPUT_SIZE: usize = 64 * KING_STRIDE;

/// First dense layer width.
pub(crate) const L1_SIZE: usize = 32;

/// Second dense layer width.
pub(crate) const L2_SIZE: usize = 32;

/// Activation ceiling for the clipped ReLU after the feature transformer.
pub(crate) const QA: i16 = 127;

/// Activation ceiling before the output layer.
pub(crate) const QO: i32 = 127;

/// Right-shift requantizing each dense layer's 32-bit sums back to the
/// activation range.
pub(crate) const WEIGHT_SHIFT: u32 = 6;

/// Divisor turning the output neuron's sum into centipawns.
pub(crate) const FV_SCALE: i32 = 16;
