//! Move application (copy-make).
//!
//! The caller clones the board and applies a pseudo-legal move to the
//! copy; `make_move` returns false when the move turns out to be illegal
//! (own king left in check, castling from or through an attacked square)
//! and the caller discards the copy. There is no unmake path.

use crate::nnue::{Accumulator, NnueNetwork};
use crate::zobrist::ZOBRIST;

use super::{Board, Color, Move, Piece, Square, CASTLING_RIGHTS_MASK};

/// A rook relocation performed as part of castling.
#[derive(Clone, Copy)]
struct RookMove {
    from: Square,
    to: Square,
}

impl Board {
    /// Apply `m` to this board. Returns false and leaves the board in an
    /// unspecified state if the move is illegal; the caller must then
    /// throw the copy away.
    ///
    /// When `net` is supplied the NNUE accumulators are kept in sync:
    /// incrementally for ordinary moves, rebuilt from scratch for the
    /// perspective whose own king moved.
    #[must_use]
    pub fn make_move(&mut self, m: Move, net: Option<&NnueNetwork>) -> bool {
        let us = self.side_to_move();
        let them = us.opponent();

        let Some((moving_color, moving_piece)) = self.piece_at(m.from()) else {
            return false;
        };
        if moving_color != us {
            return false;
        }

        // Hash out the state-dependent contributions; the new ones are
        // XORed back in once the move is complete
        self.hash ^= ZOBRIST.castling(self.castling_rights);
        if let Some(ep) = self.en_passant {
            self.hash ^= ZOBRIST.en_passant(ep);
        }
        let had_ep = self.en_passant.take();

        // Clear the captured piece from bitboards, mailbox and hash
        let mut captured: Option<(Color, Piece, Square)> = None;
        if m.is_en_passant() {
            if had_ep != Some(m.to()) {
                return false;
            }
            let cap_sq = match us {
                Color::White => Square::new(m.to().rank() - 1, m.to().file()),
                Color::Black => Square::new(m.to().rank() + 1, m.to().file()),
            };
            let Some((cap_color, cap_piece)) = self.piece_at(cap_sq) else {
                return false;
            };
            self.remove_piece(cap_sq, cap_color, cap_piece);
            self.hash ^= ZOBRIST.piece(cap_color, cap_piece, cap_sq);
            captured = Some((cap_color, cap_piece, cap_sq));
        } else if m.is_capture() {
            let Some((cap_color, cap_piece)) = self.piece_at(m.to()) else {
                return false;
            };
            if cap_color == us {
                return false;
            }
            self.remove_piece(m.to(), cap_color, cap_piece);
            self.hash ^= ZOBRIST.piece(cap_color, cap_piece, m.to());
            captured = Some((cap_color, cap_piece, m.to()));
        }

        // Move the piece itself, promoting if requested
        self.remove_piece(m.from(), us, moving_piece);
        self.hash ^= ZOBRIST.piece(us, moving_piece, m.from());
        let placed_piece = m.promoted().unwrap_or(moving_piece);
        self.set_piece(m.to(), us, placed_piece);
        self.hash ^= ZOBRIST.piece(us, placed_piece, m.to());

        // Castling moves the rook too, and the king may not start on or
        // cross an attacked square. The landing square is covered by the
        // own-king check below.
        let mut rook_move: Option<RookMove> = None;
        if m.is_castling() {
            let crossing = Square::new(m.from().rank(), (m.from().file() + m.to().file()) / 2);
            if self.is_square_attacked(m.from(), them) || self.is_square_attacked(crossing, them) {
                return false;
            }

            let rank = m.to().rank();
            let (rook_from_file, rook_to_file) = if m.is_castle_kingside() { (7, 5) } else { (0, 3) };
            let rook_from = Square::new(rank, rook_from_file);
            let rook_to = Square::new(rank, rook_to_file);
            if self.piece_at(rook_from) != Some((us, Piece::Rook)) {
                return false;
            }

            self.remove_piece(rook_from, us, Piece::Rook);
            self.set_piece(rook_to, us, Piece::Rook);
            self.hash ^= ZOBRIST.piece(us, Piece::Rook, rook_from);
            self.hash ^= ZOBRIST.piece(us, Piece::Rook, rook_to);
            rook_move = Some(RookMove {
                from: rook_from,
                to: rook_to,
            });
        }

        // Reject anything that leaves our king attacked
        if self.is_in_check(us) {
            return false;
        }

        // New en passant target only after a double push: the square the
        // pawn skipped
        if m.is_double_pawn_push() {
            let ep_rank = (m.from().rank() + m.to().rank()) / 2;
            let ep = Square::new(ep_rank, m.from().file());
            self.en_passant = Some(ep);
            self.hash ^= ZOBRIST.en_passant(ep);
        }

        // Touching a king or rook home square turns the matching rights off
        self.castling_rights &=
            CASTLING_RIGHTS_MASK[m.from().index()] & CASTLING_RIGHTS_MASK[m.to().index()];
        self.hash ^= ZOBRIST.castling(self.castling_rights);

        if moving_piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.white_to_move = !self.white_to_move;
        self.hash ^= ZOBRIST.black_to_move_key;

        if let Some(net) = net {
            self.update_accumulators(m, us, moving_piece, placed_piece, captured, rook_move, net);
        }

        true
    }

    /// Forfeit the move: flip the side, clear the en passant target and
    /// patch the hash. Used by null-move pruning; never illegal.
    pub fn make_null_move(&mut self) {
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= ZOBRIST.en_passant(ep);
        }
        self.white_to_move = !self.white_to_move;
        self.hash ^= ZOBRIST.black_to_move_key;
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);
    }

    /// Rebuild both perspective accumulators from the current position.
    pub fn refresh_accumulators(&mut self, net: &NnueNetwork) {
        self.refresh_accumulator(Color::White, net);
        self.refresh_accumulator(Color::Black, net);
    }

    /// Rebuild one perspective from scratch: bias plus every active
    /// feature under that perspective's king bucket.
    fn refresh_accumulator(&mut self, perspective: Color, net: &NnueNetwork) {
        let mut acc = net.bias_accumulator();
        if let Some(king) = self.king_square(perspective) {
            for idx in 0..64 {
                if let Some((color, piece)) = self.mailbox[idx] {
                    acc.add_feature(net, perspective, king, color, piece, Square::from_index(idx));
                }
            }
        }
        self.accumulators[perspective.index()] = acc;
    }

    /// The side-to-move and opposing accumulators, in that order.
    #[inline]
    pub(crate) fn perspective_accumulators(&self) -> (&Accumulator, &Accumulator) {
        let stm = self.side_to_move().index();
        (&self.accumulators[stm], &self.accumulators[1 - stm])
    }

    #[allow(clippy::too_many_arguments)]
    fn update_accumulators(
        &mut self,
        m: Move,
        us: Color,
        moving_piece: Piece,
        placed_piece: Piece,
        captured: Option<(Color, Piece, Square)>,
        rook_move: Option<RookMove>,
        net: &NnueNetwork,
    ) {
        for perspective in [Color::White, Color::Black] {
            // A king move changes this perspective's bucket, invalidating
            // every feature under it
            if moving_piece == Piece::King && perspective == us {
                self.refresh_accumulator(perspective, net);
                continue;
            }

            let Some(king) = self.king_square(perspective) else {
                continue;
            };
            let acc = &mut self.accumulators[perspective.index()];

            acc.sub_feature(net, perspective, king, us, moving_piece, m.from());
            acc.add_feature(net, perspective, king, us, placed_piece, m.to());
            if let Some((cap_color, cap_piece, cap_sq)) = captured {
                acc.sub_feature(net, perspective, king, cap_color, cap_piece, cap_sq);
            }
            if let Some(rook) = rook_move {
                acc.sub_feature(net, perspective, king, us, Piece::Rook, rook.from);
                acc.add_feature(net, perspective, king, us, Piece::Rook, rook.to);
            }
        }
    }
}
