//! The PVS negamax core.

use crate::board::{Board, Move, Piece, EMPTY_MOVE, MAX_PLY};
use crate::eval::evaluate;
use crate::tt::Bound;

use super::constants::{
    CHECK_EXTENSION_MAX_PLY, FUTILITY_MARGIN, FUTILITY_MAX_DEPTH, IIR_MIN_DEPTH, MATE_SCORE,
    MATE_THRESHOLD, NULL_MOVE_MIN_DEPTH, RAZOR_MARGIN, RAZOR_MAX_DEPTH, RFP_MARGIN, RFP_MAX_DEPTH,
    SCORE_INFINITE, SINGULAR_MIN_DEPTH,
};
use super::SearchContext;

/// Late move reduction: `ln(depth) * ln(move_number) / 1.5`, floored,
/// capped so the reduced search keeps at least one ply.
fn lmr_reduction(depth: u32, move_number: u32) -> u32 {
    let r = (f64::from(depth).ln() * f64::from(move_number).ln() / 1.5).floor();
    r as u32
}

impl SearchContext<'_> {
    /// Search `board` to `depth` with the window `(alpha, beta)`.
    ///
    /// `excluded` carries the move a singular-extension verification is
    /// searching around; `EMPTY_MOVE` otherwise. Returns the node score,
    /// or `alpha` when the search was cancelled mid-node.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn negamax(
        &mut self,
        board: &Board,
        mut alpha: i32,
        beta: i32,
        mut depth: u32,
        ply: usize,
        excluded: Move,
        is_pv: bool,
    ) -> i32 {
        self.pv.clear(ply);

        self.nodes += 1;
        if self.should_stop() {
            return alpha;
        }

        if ply >= MAX_PLY - 1 {
            return evaluate(board, self.net);
        }
        if ply as u32 + 1 > self.seldepth {
            self.seldepth = ply as u32 + 1;
        }

        let excluding = excluded != EMPTY_MOVE;
        let us = if board.white_to_move() {
            crate::board::Color::White
        } else {
            crate::board::Color::Black
        };

        // Fifty-move rule
        if ply > 0 && board.halfmove_clock() >= 100 {
            return 0;
        }

        let in_check = board.is_in_check(us);

        // Check extension: don't drop into quiescence while in check
        if depth == 0 {
            if in_check && ply < CHECK_EXTENSION_MAX_PLY {
                depth = 1;
            } else {
                return self.quiescence(board, alpha, beta, ply);
            }
        }

        // Transposition table: a usable bound ends the node immediately
        let tt_entry = self.tt.probe(board.hash());
        let mut tt_move = tt_entry.map_or(EMPTY_MOVE, |e| e.best_move);
        if !is_pv && !excluding {
            if let Some(score) = self.tt.probe_cutoff(board.hash(), alpha, beta, depth) {
                return score;
            }
        }

        let eval = evaluate(board, self.net);

        if !is_pv && !in_check && !excluding {
            // Razoring: hopeless nodes drop straight to quiescence
            if depth <= RAZOR_MAX_DEPTH && eval + RAZOR_MARGIN * (depth as i32) < alpha {
                let score = self.quiescence(board, alpha, beta, ply);
                if score < alpha {
                    return score;
                }
            }

            // Reverse futility: eval so far above beta that the margin
            // cannot close at this depth
            if depth <= RFP_MAX_DEPTH && eval - RFP_MARGIN * depth as i32 >= beta {
                return eval - RFP_MARGIN * depth as i32;
            }

            // Null move: hand over the move; a reduced refutation search
            // that still clears beta proves the node fails high. Skipped
            // without non-pawn material (zugzwang)
            if depth >= NULL_MOVE_MIN_DEPTH && board.has_non_pawn_material(us) {
                let r = 2 + depth / 6;
                let mut null_board = board.clone();
                null_board.make_null_move();
                self.prev_moves[ply] = EMPTY_MOVE;
                self.prev_pieces[ply] = None;
                let score = -self.negamax(
                    &null_board,
                    -beta,
                    -beta + 1,
                    depth.saturating_sub(1 + r),
                    ply + 1,
                    EMPTY_MOVE,
                    false,
                );
                if !self.stopped() && score >= beta {
                    return beta;
                }
            }
        }

        // Internal iterative reduction: a PV node with no hash move is
        // cheaper to search shallower first
        if is_pv && tt_move == EMPTY_MOVE && depth >= IIR_MIN_DEPTH && !excluding {
            depth -= 1;
        }

        // Singular extension: if every alternative fails well below the
        // hash score, the hash move is forced and earns an extra ply
        let mut singular_extension = 0u32;
        if depth >= SINGULAR_MIN_DEPTH
            && !in_check
            && ply > 0
            && !excluding
            && tt_move != EMPTY_MOVE
        {
            if let Some(entry) = tt_entry {
                if entry.bound != Bound::Upper
                    && entry.depth + 3 >= depth
                    && entry.score.abs() < MATE_THRESHOLD
                {
                    let singular_beta = entry.score - depth as i32;
                    let score = self.negamax(
                        board,
                        singular_beta - 1,
                        singular_beta,
                        depth / 2,
                        ply,
                        tt_move,
                        false,
                    );
                    if score < singular_beta {
                        singular_extension = 1;
                    }
                    self.pv.clear(ply);
                }
            }
        }

        let moves = board.generate_pseudo_moves();
        // A hash collision can hand us a move from another position; only
        // trust it if it was actually generated here
        if tt_move != EMPTY_MOVE && !moves.iter().any(|m| m.same_action(tt_move)) {
            tt_move = EMPTY_MOVE;
        }

        // Futility: at frontier depths with a hopeless eval, quiets cannot
        // rescue the node and are skipped once one legal move exists
        let futile = !is_pv
            && !in_check
            && depth <= FUTILITY_MAX_DEPTH
            && eval + FUTILITY_MARGIN * (depth as i32) < alpha;

        let prev = self.previous(ply);
        let ordered = self.tables.order_moves(board, &moves, tt_move, ply, prev);

        let original_alpha = alpha;
        let mut best_score = -SCORE_INFINITE;
        let mut best_move = EMPTY_MOVE;
        let mut legal_moves = 0u32;
        let mut quiets_tried: [(Move, Piece); 64] = [(EMPTY_MOVE, Piece::Pawn); 64];
        let mut quiets_count = 0usize;

        for scored in ordered.iter() {
            let m = scored.mv;
            if excluding && m.same_action(excluded) {
                continue;
            }

            let quiet = !m.is_capture() && !m.is_promotion();
            if futile && legal_moves > 0 && quiet {
                continue;
            }

            let moving_piece = board
                .piece_at(m.from())
                .map_or(Piece::Pawn, |(_, piece)| piece);

            let mut child = board.clone();
            if !child.make_move(m, self.net) {
                continue;
            }
            legal_moves += 1;

            if quiet && quiets_count < quiets_tried.len() {
                quiets_tried[quiets_count] = (m, moving_piece);
                quiets_count += 1;
            }

            self.prev_moves[ply] = m;
            self.prev_pieces[ply] = Some(moving_piece);

            let extension = if singular_extension > 0 && m.same_action(tt_move) {
                singular_extension
            } else {
                0
            };
            let new_depth = depth - 1 + extension;

            let mut score;
            if legal_moves == 1 {
                score = -self.negamax(&child, -beta, -alpha, new_depth, ply + 1, EMPTY_MOVE, is_pv);
            } else {
                // Late move reduction on quiet non-promoting moves, then
                // the PVS null-window / re-search ladder
                let mut reduction = 0;
                if quiet && depth > 1 {
                    reduction = lmr_reduction(depth, legal_moves).min(new_depth.saturating_sub(1));
                }

                score = -self.negamax(
                    &child,
                    -alpha - 1,
                    -alpha,
                    new_depth.saturating_sub(reduction),
                    ply + 1,
                    EMPTY_MOVE,
                    false,
                );
                if score > alpha && reduction > 0 {
                    score =
                        -self.negamax(&child, -alpha - 1, -alpha, new_depth, ply + 1, EMPTY_MOVE, false);
                }
                if score > alpha && score < beta {
                    score = -self.negamax(&child, -beta, -alpha, new_depth, ply + 1, EMPTY_MOVE, true);
                }
            }

            if self.stopped() {
                return alpha;
            }

            if score > best_score {
                best_score = score;
                best_move = m;

                if score > alpha {
                    alpha = score;
                    self.pv.update(ply, m);

                    if alpha >= beta {
                        if quiet {
                            self.on_quiet_cutoff(m, moving_piece, ply, depth, prev);
                            // The quiets searched before the cutoff get
                            // the matching penalty
                            for &(tried, tried_piece) in &quiets_tried[..quiets_count] {
                                if tried != m {
                                    self.tables.history_penalty(tried_piece, tried, depth);
                                }
                            }
                        }
                        break;
                    }
                }
            }
        }

        if legal_moves == 0 {
            if excluding {
                // The only legal move was the excluded one; report a fail
                // low for the verification search
                return alpha;
            }
            return if in_check { -MATE_SCORE + ply as i32 } else { 0 };
        }

        if !self.stopped() && !excluding {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score > original_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt
                .store(board.hash(), best_move, best_score, depth, bound);
        }

        best_score
    }

    /// Bookkeeping for a quiet move that refuted the node: killers,
    /// history bonus, counter move and continuation history.
    fn on_quiet_cutoff(
        &mut self,
        m: Move,
        piece: Piece,
        ply: usize,
        depth: u32,
        prev: Option<(Piece, usize)>,
    ) {
        self.tables.store_killer(ply, m);
        self.tables.history_bonus(piece, m, depth);
        if let Some((prev_piece, prev_to)) = prev {
            self.tables.store_counter(prev_piece, prev_to, m);
        }
        self.tables.cont_history_bonus(prev, piece, m, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchContext, SearchHandle, SearchSettings, SearchTables};
    use crate::tt::TranspositionTable;
    use std::sync::Arc;

    fn fixed_depth_search(fen: &str, depth: u32) -> (i32, Option<Move>) {
        let board = Board::from_fen(fen);
        let handle = SearchHandle::new(Arc::new(TranspositionTable::new(4)), None);
        let mut tables = SearchTables::new();
        let settings = SearchSettings::depth(depth);
        let mut ctx = SearchContext::new(&handle, &mut tables, &settings);
        let score = ctx.negamax(
            &board,
            -SCORE_INFINITE,
            SCORE_INFINITE,
            depth,
            0,
            EMPTY_MOVE,
            true,
        );
        let best = ctx.pv.line(0).first().copied();
        (score, best)
    }

    #[test]
    fn test_checkmated_node_scores_mate() {
        // Back-rank mate, black to move with no escape
        let (score, _) = fixed_depth_search("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", 3);
        assert_eq!(score, -MATE_SCORE);
    }

    #[test]
    fn test_stalemate_scores_zero() {
        // Classic stalemate: black king a8, white queen c7, white king c8
        let (score, _) = fixed_depth_search("k1K5/2Q5/8/8/8/8/8/8 b - - 0 1", 4);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_finds_mate_in_one() {
        let (score, best) = fixed_depth_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
        assert!(score >= MATE_SCORE - 2, "expected mate score, got {score}");
        assert_eq!(best.expect("pv move").to_string(), "a1a8");
    }

    #[test]
    fn test_finds_hanging_queen() {
        // White queen takes the undefended black queen
        let (score, best) = fixed_depth_search("3q2k1/8/8/8/8/8/8/3Q2K1 w - - 0 1", 3);
        assert_eq!(best.expect("pv move").to_string(), "d1d8");
        assert!(score > 700);
    }

    #[test]
    fn test_side_flip_symmetry() {
        // A position and its color-flipped mirror search to the same
        // score for the side to move under the symmetric fallback eval
        let white = fixed_depth_search("4k3/4p3/8/8/8/8/4P3/4KQ2 w - - 0 1", 3).0;
        let black = fixed_depth_search("4kq2/4p3/8/8/8/8/4P3/4K3 b - - 0 1", 3).0;
        assert_eq!(white, black);
    }

    #[test]
    fn test_lmr_formula() {
        assert_eq!(lmr_reduction(2, 2), 0);
        // ln(8)*ln(20)/1.5 = 2.08*3.0/1.5 ~ 4
        assert_eq!(lmr_reduction(8, 20), 4);
        // Monotone in both arguments
        assert!(lmr_reduction(16, 30) >= lmr_reduction(8, 20));
    }
}
