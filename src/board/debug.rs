//! Consistency checks for the redundant board representations.

use super::{Bitboard, Board, Color, Piece, Square};

impl Board {
    /// Cross-check the mailbox, bitboards, occupancy caches and hash.
    ///
    /// A failure here is a make-move bug, not a recoverable condition, so
    /// this panics with a description of the first mismatch. Release-build
    /// call sites go through `debug_assert_valid` and compile to nothing.
    pub(crate) fn debug_validate(&self) {
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            let mut holders = 0u32;
            let mut found: Option<(Color, Piece)> = None;
            for color in [Color::White, Color::Black] {
                for p_idx in 0..6 {
                    if self.pieces[color.index()][p_idx].contains(sq) {
                        holders += 1;
                        found = Some((color, Piece::from_index(p_idx)));
                    }
                }
            }
            assert!(
                holders <= 1,
                "square {sq} is set in {holders} piece bitboards"
            );
            assert_eq!(
                self.mailbox[idx], found,
                "mailbox disagrees with bitboards on {sq}: mailbox {:?}, bitboards {:?}",
                self.mailbox[idx], found
            );
        }

        for color in [Color::White, Color::Black] {
            let mut union = Bitboard::EMPTY;
            for p_idx in 0..6 {
                union = union.or(self.pieces[color.index()][p_idx]);
            }
            assert_eq!(
                self.occupied[color.index()],
                union,
                "{color} occupancy cache out of date"
            );
        }
        assert_eq!(
            self.all_occupied,
            self.occupied[0].or(self.occupied[1]),
            "combined occupancy cache out of date"
        );

        if let Some(ep) = self.en_passant {
            assert!(
                ep.rank() == 2 || ep.rank() == 5,
                "en passant target {ep} not on rank 3 or 6"
            );
        }

        assert_eq!(
            self.hash,
            self.zobrist_from_scratch(),
            "maintained hash diverged from recomputed hash"
        );
    }

    /// Validate in debug builds only.
    #[inline]
    pub(crate) fn debug_assert_valid(&self) {
        #[cfg(debug_assertions)]
        self.debug_validate();
    }
}
