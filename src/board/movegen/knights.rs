//! Knight move generation.

use super::super::attack_tables::knight_attacks;
use super::super::{Board, Move, MoveList, Piece};

impl Board {
    pub(super) fn generate_knight_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let us = self.side_to_move();
        let own = self.occupied[us.index()];
        let enemy = self.occupied[us.opponent().index()];

        for from in self.pieces[us.index()][Piece::Knight.index()].iter() {
            let targets = knight_attacks(from).and(own.not());
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
