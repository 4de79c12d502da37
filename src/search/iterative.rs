//! Iterative deepening, aspiration windows and the root move loop.

use std::time::Instant;

use crate::board::{Board, Move, EMPTY_MOVE};
use crate::tt::Bound;

use super::constants::{
    ASPIRATION_MIN_DEPTH, ASPIRATION_WINDOW, MATE_SCORE, MATE_THRESHOLD, SCORE_INFINITE,
};
use super::{InfoCallback, SearchContext, SearchInfo, SearchSettings};

/// Outcome of a completed (or cancelled) search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Expected reply, from the principal variation
    pub ponder_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/// One root line tracked for MultiPV.
struct RootLine {
    best_move: Move,
    score: i32,
    pv: Vec<Move>,
}

impl SearchContext<'_> {
    /// Search the root position, skipping `excluded_roots` (already
    /// reported MultiPV lines). Returns the score and best move.
    fn root_search(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        excluded_roots: &[Move],
    ) -> (i32, Option<Move>) {
        self.pv.clear(0);

        let tt_move = self
            .tt
            .probe(board.hash())
            .map_or(EMPTY_MOVE, |e| e.best_move);
        let moves = board.generate_pseudo_moves();
        let ordered = self.tables.order_moves(board, &moves, tt_move, 0, None);

        let original_alpha = alpha;
        let mut best_score = -SCORE_INFINITE;
        let mut best_move: Option<Move> = None;
        let mut legal_moves = 0u32;

        for scored in ordered.iter() {
            let m = scored.mv;
            if excluded_roots.contains(&m) {
                continue;
            }

            let moving_piece = board.piece_at(m.from()).map(|(_, piece)| piece);
            let mut child = board.clone();
            if !child.make_move(m, self.net) {
                continue;
            }
            legal_moves += 1;

            self.prev_moves[0] = m;
            self.prev_pieces[0] = moving_piece;

            let mut score;
            if legal_moves == 1 {
                score = -self.negamax(&child, -beta, -alpha, depth - 1, 1, EMPTY_MOVE, true);
            } else {
                score = -self.negamax(&child, -alpha - 1, -alpha, depth - 1, 1, EMPTY_MOVE, false);
                if score > alpha && score < beta {
                    score = -self.negamax(&child, -beta, -alpha, depth - 1, 1, EMPTY_MOVE, true);
                }
            }

            if self.stopped() {
                // Keep whatever completed before cancellation
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(m);
                if score > alpha {
                    alpha = score;
                    self.pv.update(0, m);
                }
            }
        }

        if legal_moves == 0 {
            let us = if board.white_to_move() {
                crate::board::Color::White
            } else {
                crate::board::Color::Black
            };
            let score = if board.is_in_check(us) { -MATE_SCORE } else { 0 };
            return (score, None);
        }

        if !self.stopped() {
            if let Some(best) = best_move {
                let bound = if best_score >= beta {
                    Bound::Lower
                } else if best_score > original_alpha {
                    Bound::Exact
                } else {
                    Bound::Upper
                };
                self.tt.store(board.hash(), best, best_score, depth, bound);
            }
        }

        (best_score, best_move)
    }

    /// Aspiration wrapper: open a narrow window around the previous
    /// score; a fail low reopens alpha fully, a fail high reopens beta.
    fn root_search_aspirated(
        &mut self,
        board: &Board,
        depth: u32,
        prev_score: i32,
        excluded_roots: &[Move],
    ) -> (i32, Option<Move>) {
        let mut alpha = -SCORE_INFINITE;
        let mut beta = SCORE_INFINITE;
        if depth >= ASPIRATION_MIN_DEPTH && prev_score.abs() < MATE_THRESHOLD {
            alpha = prev_score - ASPIRATION_WINDOW;
            beta = prev_score + ASPIRATION_WINDOW;
        }

        loop {
            let (score, best) = self.root_search(board, depth, alpha, beta, excluded_roots);
            if self.stopped() {
                return (score, best);
            }
            if score <= alpha {
                alpha = -SCORE_INFINITE;
            } else if score >= beta {
                beta = SCORE_INFINITE;
            } else {
                return (score, best);
            }
        }
    }
}

/// Drive iterative deepening on one thread and return the final result.
///
/// `emit_info` is false on helper threads, whose output is suppressed.
pub(crate) fn iterative_deepening(
    ctx: &mut SearchContext<'_>,
    board: &Board,
    settings: &SearchSettings,
    info: Option<&InfoCallback>,
    emit_info: bool,
) -> SearchResult {
    let legal = board.generate_moves();
    let multipv = (settings.multipv.max(1) as usize).min(legal.len().max(1));

    let mut result = SearchResult {
        best_move: legal.as_slice().first().map(|m| *m),
        ponder_move: None,
        score: 0,
        depth: 0,
        nodes: 0,
    };
    let mut prev_scores = vec![0i32; multipv];

    'deepening: for depth in 1..=settings.max_depth {
        // Between iterations: explicit stop, then the soft deadline
        if ctx.should_stop() {
            break;
        }
        if !ctx.pondering.load(std::sync::atomic::Ordering::Relaxed) {
            let (_, soft, _) = ctx.clock.snapshot();
            if let Some(soft) = soft {
                if Instant::now() >= soft {
                    break;
                }
            }
        }

        let mut lines: Vec<RootLine> = Vec::with_capacity(multipv);
        for line_index in 0..multipv {
            let excluded: Vec<Move> = lines.iter().map(|line| line.best_move).collect();
            let (score, best) =
                ctx.root_search_aspirated(board, depth, prev_scores[line_index], &excluded);

            let Some(best) = best else {
                break;
            };

            if ctx.stopped() && depth > 1 {
                // Partial iteration: keep the previous iteration's answer
                break 'deepening;
            }

            let mut pv: Vec<Move> = ctx.pv.line(0).to_vec();
            if pv.first() != Some(&best) {
                pv = vec![best];
            }
            lines.push(RootLine {
                best_move: best,
                score,
                pv,
            });
            prev_scores[line_index] = score;
        }

        if lines.is_empty() {
            break;
        }

        result.best_move = Some(lines[0].best_move);
        result.ponder_move = lines[0].pv.get(1).copied();
        result.score = lines[0].score;
        result.depth = depth;
        result.nodes = ctx.nodes;

        if emit_info {
            if let Some(info) = info {
                let time_ms = ctx.clock.elapsed_ms();
                let nps = if time_ms > 0 {
                    ctx.nodes * 1000 / time_ms
                } else {
                    0
                };
                for (index, line) in lines.iter().enumerate() {
                    info(&SearchInfo {
                        depth,
                        seldepth: ctx.seldepth,
                        multipv: index as u32 + 1,
                        score: line.score,
                        mate: mate_distance(line.score),
                        nodes: ctx.nodes,
                        nps,
                        time_ms,
                        hashfull: ctx.tt.hashfull_per_mille(),
                        pv: line.pv.clone(),
                    });
                }
            }
        }

        // A forced mate found: no deeper iteration can improve it
        if result.score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    result
}

/// Signed full-move distance to mate, when `score` is a mate score.
fn mate_distance(score: i32) -> Option<i32> {
    if score.abs() < MATE_THRESHOLD {
        return None;
    }
    let plies = MATE_SCORE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchHandle, SearchTables};
    use crate::tt::TranspositionTable;
    use std::sync::Arc;

    fn run(fen: &str, depth: u32) -> SearchResult {
        let board = Board::from_fen(fen);
        let handle = SearchHandle::new(Arc::new(TranspositionTable::new(4)), None);
        let mut tables = SearchTables::new();
        let settings = SearchSettings::depth(depth);
        let mut ctx = SearchContext::new(&handle, &mut tables, &settings);
        iterative_deepening(&mut ctx, &board, &settings, None, false)
    }

    #[test]
    fn test_mate_in_one_found_and_executes() {
        let result = run("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
        let best = result.best_move.expect("best move");
        assert!(result.score >= MATE_SCORE - 128);

        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
        assert!(board.make_move(best, None));
        assert!(board.is_checkmate());
    }

    #[test]
    fn test_mate_distance_reporting() {
        assert_eq!(mate_distance(MATE_SCORE - 1), Some(1));
        assert_eq!(mate_distance(MATE_SCORE - 3), Some(2));
        assert_eq!(mate_distance(-(MATE_SCORE - 2)), Some(-1));
        assert_eq!(mate_distance(150), None);
    }

    #[test]
    fn test_single_legal_move_is_returned() {
        // Rook check along the back rank; h7 is the only escape
        let result = run("R6k/6p1/8/8/8/8/8/K7 b - - 0 1", 3);
        assert_eq!(result.best_move.expect("move").to_string(), "h8h7");
    }

    #[test]
    fn test_no_legal_moves_yields_none() {
        // Checkmated position to move
        let result = run("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", 3);
        assert!(result.best_move.is_none());
    }

    #[test]
    fn test_deeper_search_keeps_finding_the_capture() {
        let result = run("3q2k1/8/8/8/8/8/8/3Q2K1 w - - 0 1", 5);
        assert_eq!(result.best_move.expect("move").to_string(), "d1d8");
        assert_eq!(result.depth, 5);
    }
}
