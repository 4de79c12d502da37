//! Sliding piece move generation via magic lookups.

use super::super::attack_tables::{bishop_attacks, queen_attacks, rook_attacks};
use super::super::{Bitboard, Board, Move, MoveList, Piece};

#[derive(Clone, Copy)]
pub(super) enum SliderType {
    Bishop,
    Rook,
    Queen,
}

impl SliderType {
    fn piece(self) -> Piece {
        match self {
            SliderType::Bishop => Piece::Bishop,
            SliderType::Rook => Piece::Rook,
            SliderType::Queen => Piece::Queen,
        }
    }

    fn attacks(self, sq: usize, occupancy: u64) -> u64 {
        match self {
            SliderType::Bishop => bishop_attacks(sq, occupancy),
            SliderType::Rook => rook_attacks(sq, occupancy),
            SliderType::Queen => queen_attacks(sq, occupancy),
        }
    }
}

impl Board {
    pub(super) fn generate_slider_moves(
        &self,
        slider: SliderType,
        moves: &mut MoveList,
        captures_only: bool,
    ) {
        let us = self.side_to_move();
        let own = self.occupied[us.index()];
        let enemy = self.occupied[us.opponent().index()];

        for from in self.pieces[us.index()][slider.piece().index()].iter() {
            let targets =
                Bitboard(slider.attacks(from.index(), self.all_occupied.0)).and(own.not());
            for to in targets.iter() {
                if enemy.contains(to) {
                    moves.push(Move::capture(from, to));
                } else if !captures_only {
                    moves.push(Move::quiet(from, to));
                }
            }
        }
    }
}
