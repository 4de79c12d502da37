//! Move generation.
//!
//! Generation is pseudo-legal: moves that leave the own king in check (and
//! castling through attacked squares) are rejected by `make_move` on the
//! copy, not filtered here. `generate_moves` layers the legality filter on
//! top for callers that need the exact legal move set.

mod kings;
mod knights;
mod pawns;
mod sliders;

use self::sliders::SliderType;

use super::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use super::{Board, Color, MoveList, Piece, Square};

impl Board {
    /// All pseudo-legal moves for the side to move.
    #[must_use]
    pub fn generate_pseudo_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate_pawn_moves(&mut moves, false);
        self.generate_knight_moves(&mut moves, false);
        self.generate_slider_moves(SliderType::Bishop, &mut moves, false);
        self.generate_slider_moves(SliderType::Rook, &mut moves, false);
        self.generate_slider_moves(SliderType::Queen, &mut moves, false);
        self.generate_king_moves(&mut moves, false);
        moves
    }

    /// Pseudo-legal captures and promotions only, for quiescence.
    #[must_use]
    pub fn generate_pseudo_tactical_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate_pawn_moves(&mut moves, true);
        self.generate_knight_moves(&mut moves, true);
        self.generate_slider_moves(SliderType::Bishop, &mut moves, true);
        self.generate_slider_moves(SliderType::Rook, &mut moves, true);
        self.generate_slider_moves(SliderType::Queen, &mut moves, true);
        self.generate_king_moves(&mut moves, true);
        moves
    }

    /// Strictly legal moves for the side to move. Each pseudo-legal
    /// candidate is applied to a copy and kept only if make-move accepts.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        let mut legal = MoveList::new();
        for m in &self.generate_pseudo_moves() {
            let mut child = self.clone();
            if child.make_move(*m, None) {
                legal.push(*m);
            }
        }
        legal
    }

    /// Is `square` attacked by any piece of `attacker`?
    ///
    /// Works backward from the target square: an enemy pawn attacks it
    /// exactly if a pawn of our color on the square would attack the
    /// pawn's square, so the pawn table is probed with the reversed color.
    #[must_use]
    pub fn is_square_attacked(&self, square: Square, attacker: Color) -> bool {
        let a_idx = attacker.index();

        let pawn_sources = pawn_attacks(attacker.opponent(), square);
        if pawn_sources.and(self.pieces[a_idx][Piece::Pawn.index()]).0 != 0 {
            return true;
        }

        if knight_attacks(square).and(self.pieces[a_idx][Piece::Knight.index()]).0 != 0 {
            return true;
        }

        if king_attacks(square).and(self.pieces[a_idx][Piece::King.index()]).0 != 0 {
            return true;
        }

        let rook_like =
            self.pieces[a_idx][Piece::Rook.index()].0 | self.pieces[a_idx][Piece::Queen.index()].0;
        if rook_attacks(square.index(), self.all_occupied.0) & rook_like != 0 {
            return true;
        }

        let bishop_like = self.pieces[a_idx][Piece::Bishop.index()].0
            | self.pieces[a_idx][Piece::Queen.index()].0;
        if bishop_attacks(square.index(), self.all_occupied.0) & bishop_like != 0 {
            return true;
        }

        false
    }

    /// Is `color`'s king currently attacked?
    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king_sq) => self.is_square_attacked(king_sq, color.opponent()),
            None => false,
        }
    }

    /// Checkmate test for the side to move.
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.is_in_check(self.side_to_move()) && self.generate_moves().is_empty()
    }

    /// Stalemate test for the side to move.
    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check(self.side_to_move()) && self.generate_moves().is_empty()
    }

    /// Exhaustive legal-move leaf count to `depth`.
    #[must_use]
    pub fn perft(&self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }

        let mut nodes = 0;
        for m in &self.generate_pseudo_moves() {
            let mut child = self.clone();
            if !child.make_move(*m, None) {
                continue;
            }
            nodes += if depth == 1 {
                1
            } else {
                child.perft(depth - 1)
            };
        }
        nodes
    }

    /// Perft split by root move, matching the output GUIs expect from a
    /// `perft` command: one line per move plus the total.
    #[must_use]
    pub fn perft_divide(&self, depth: usize) -> Vec<(super::Move, u64)> {
        let mut results = Vec::new();
        for m in &self.generate_pseudo_moves() {
            let mut child = self.clone();
            if !child.make_move(*m, None) {
                continue;
            }
            let nodes = if depth <= 1 { 1 } else { child.perft(depth - 1) };
            results.push((*m, nodes));
        }
        results
    }
}
