//! Quiescence search.
//!
//! Extends captures (and promotions) past the frontier until the position
//! is tactically quiet, with stand-pat cutoffs and a static-exchange
//! pruning guard against clearly losing captures.

use crate::board::{Board, EMPTY_MOVE, MAX_PLY};
use crate::eval::evaluate;

use super::constants::QSEARCH_SEE_MARGIN;
use super::see::see;
use super::SearchContext;

impl SearchContext<'_> {
    pub(crate) fn quiescence(&mut self, board: &Board, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.nodes += 1;
        if self.should_stop() {
            return alpha;
        }
        if ply as u32 + 1 > self.seldepth {
            self.seldepth = ply as u32 + 1;
        }

        let stand_pat = evaluate(board, self.net);
        if ply >= MAX_PLY - 1 {
            return stand_pat;
        }

        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let moves = board.generate_pseudo_tactical_moves();
        let ordered = self
            .tables
            .order_moves(board, &moves, EMPTY_MOVE, MAX_PLY, None);

        for scored in ordered.iter() {
            let m = scored.mv;

            // Losing-capture prune
            if m.is_capture() && see(board, m) < QSEARCH_SEE_MARGIN {
                continue;
            }

            let mut child = board.clone();
            if !child.make_move(m, self.net) {
                continue;
            }

            let score = -self.quiescence(&child, -beta, -alpha, ply + 1);
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::constants::SCORE_INFINITE;
    use crate::search::{SearchHandle, SearchSettings, SearchTables};
    use crate::tt::TranspositionTable;
    use std::sync::Arc;

    fn quiesce(fen: &str) -> i32 {
        let board = Board::from_fen(fen);
        let handle = SearchHandle::new(Arc::new(TranspositionTable::new(1)), None);
        let mut tables = SearchTables::new();
        let settings = SearchSettings::default();
        let mut ctx = SearchContext::new(&handle, &mut tables, &settings);
        ctx.quiescence(&board, -SCORE_INFINITE, SCORE_INFINITE, 0)
    }

    #[test]
    fn test_quiet_position_stands_pat() {
        let score = quiesce("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(score, 0);
    }

    #[test]
    fn test_hanging_piece_is_captured() {
        // Rook takes the undefended rook: quiescence must realize the
        // material gain rather than standing pat
        let score = quiesce("4k3/8/8/3r4/8/8/8/3RK3 w - - 0 1");
        assert!(score > 400, "expected winning capture, got {score}");
    }

    #[test]
    fn test_defended_piece_is_not_blundered() {
        // The d5 pawn is defended; QxP loses the queen, so the score
        // stays near stand-pat rather than dropping a queen
        let stand = quiesce("4k3/8/4p3/8/8/8/8/3QK3 w - - 0 1");
        let guarded = quiesce("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1");
        // One extra enemy pawn, no tactic: roughly a pawn worse
        assert!(guarded >= stand - 150);
    }
}
