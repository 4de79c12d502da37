//! Perspective accumulators and HalfKA feature indexing.

use crate::board::{Color, Piece, Square};

use super::simd::{add_weights, sub_weights};
use super::{NnueNetwork, HIDDEN_SIZE, KING_STRIDE};

/// Feature-transformer hidden state for one king perspective.
///
/// Invariant while a network is active: `values` equals the feature bias
/// plus the weight columns of every active feature under this perspective.
/// The board updates it incrementally on each move and rebuilds it from
/// scratch when this perspective's own king moves.
#[derive(Clone)]
pub struct Accumulator {
    pub(crate) values: [i16; HIDDEN_SIZE],
}

impl Accumulator {
    /// All-zero accumulator, used before any network is attached.
    #[must_use]
    pub(crate) fn zeroed() -> Self {
        Accumulator {
            values: [0; HIDDEN_SIZE],
        }
    }

    /// Add the feature column for a piece, if it is a feature under this
    /// perspective (the perspective's own king is not).
    #[inline]
    pub(crate) fn add_feature(
        &mut self,
        net: &NnueNetwork,
        perspective: Color,
        king: Square,
        color: Color,
        piece: Piece,
        sq: Square,
    ) {
        if let Some(feature) = feature_index(perspective, king, color, piece, sq) {
            add_weights(&mut self.values, net.feature_column(feature));
        }
    }

    /// Subtract the feature column for a piece, mirroring `add_feature`.
    #[inline]
    pub(crate) fn sub_feature(
        &mut self,
        net: &NnueNetwork,
        perspective: Color,
        king: Square,
        color: Color,
        piece: Piece,
        sq: Square,
    ) {
        if let Some(feature) = feature_index(perspective, king, color, piece, sq) {
            sub_weights(&mut self.values, net.feature_column(feature));
        }
    }
}

/// HalfKA feature index for a piece under a perspective.
///
/// The perspective's king square selects the bucket; the feature within
/// the bucket is the oriented piece-color code times 64 plus the oriented
/// square. For the black perspective every square is flipped vertically
/// and piece colors are swapped, so both perspectives index the same
/// weight space. Returns `None` for the perspective's own king.
#[inline]
pub(crate) fn feature_index(
    perspective: Color,
    king: Square,
    color: Color,
    piece: Piece,
    sq: Square,
) -> Option<usize> {
    if piece == Piece::King && color == perspective {
        return None;
    }

    let (k, s) = if perspective == Color::Black {
        (king.flip_vertical(), sq.flip_vertical())
    } else {
        (king, sq)
    };

    let code = if piece == Piece::King {
        10
    } else {
        piece.index() * 2 + usize::from(color != perspective)
    };

    Some(k.index() * KING_STRIDE + code * 64 + s.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnue::INPUT_SIZE;

    #[test]
    fn test_own_king_is_not_a_feature() {
        let king = Square::new(0, 4);
        assert_eq!(
            feature_index(Color::White, king, Color::White, Piece::King, king),
            None
        );
        assert!(feature_index(Color::White, king, Color::Black, Piece::King, Square::new(7, 4))
            .is_some());
    }

    #[test]
    fn test_feature_indices_in_range() {
        for king_idx in [0, 27, 63] {
            let king = Square::from_index(king_idx);
            for piece in [Piece::Pawn, Piece::Queen, Piece::King] {
                for color in [Color::White, Color::Black] {
                    for sq_idx in [0, 35, 63] {
                        let sq = Square::from_index(sq_idx);
                        for perspective in [Color::White, Color::Black] {
                            if let Some(f) =
                                feature_index(perspective, king, color, piece, sq)
                            {
                                assert!(f < INPUT_SIZE, "feature {f} out of range");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_perspectives_mirror_each_other() {
        // A white pawn on e2 seen by white equals a black pawn on e7 seen
        // by black, with the kings mirrored too
        let white_view = feature_index(
            Color::White,
            Square::new(0, 4),
            Color::White,
            Piece::Pawn,
            Square::new(1, 4),
        );
        let black_view = feature_index(
            Color::Black,
            Square::new(7, 4),
            Color::Black,
            Piece::Pawn,
            Square::new(6, 4),
        );
        assert_eq!(white_view, black_view);
    }

    #[test]
    fn test_distinct_pieces_distinct_features() {
        let king = Square::new(0, 4);
        let sq = Square::new(3, 3);
        let mut seen = std::collections::HashSet::new();
        for piece in [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
        ] {
            for color in [Color::White, Color::Black] {
                let f = feature_index(Color::White, king, color, piece, sq).unwrap();
                assert!(seen.insert(f), "duplicate feature index {f}");
            }
        }
    }
}
