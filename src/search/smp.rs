//! Lazy SMP parallel search.
//!
//! Every thread runs the identical iterative-deepening search on its own
//! board copy with its own ordering tables; the transposition table is
//! the only shared state and provides all the coordination there is.
//! Helper threads perturb their target depth for diversity and never
//! produce output. Cancellation is one atomic flag polled by everyone.

use std::sync::atomic::Ordering;
use std::thread;

use crate::board::Board;

use super::iterative::{iterative_deepening, SearchResult};
use super::{InfoCallback, SearchContext, SearchHandle, SearchSettings, SearchTables};

/// Deep recursion wants a roomy stack.
const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Helper thread depth perturbation: odd-indexed helpers search one ply
/// shallower, finishing their iterations at different times and seeding
/// the shared table with differently-shaped trees.
fn helper_depth(max_depth: u32, helper_index: usize) -> u32 {
    if helper_index % 2 == 1 {
        max_depth.saturating_sub(1).max(1)
    } else {
        max_depth
    }
}

/// Run a search across `threads` OS threads and return the main thread's
/// result. Blocks until every helper has joined, so a caller may emit
/// `bestmove` as soon as this returns.
///
/// `tables` is the main thread's persistent ordering state (history ages
/// across calls); helpers start fresh each search.
pub fn smp_search(
    board: &Board,
    handle: &SearchHandle,
    settings: &SearchSettings,
    tables: &mut SearchTables,
    threads: usize,
    info: Option<InfoCallback>,
) -> SearchResult {
    let threads = threads.max(1);
    tables.new_search();

    let mut root = board.clone();
    if let Some(net) = handle.nnue.as_deref() {
        root.refresh_accumulators(net);
    }

    if threads == 1 {
        let mut ctx = SearchContext::new(handle, tables, settings);
        return iterative_deepening(&mut ctx, &root, settings, info.as_ref(), true);
    }

    thread::scope(|scope| {
        let mut helpers = Vec::with_capacity(threads - 1);
        for helper_index in 0..threads - 1 {
            let helper_board = root.clone();
            let helper_handle = handle.clone();
            let helper_settings = SearchSettings {
                max_depth: helper_depth(settings.max_depth, helper_index),
                ..settings.clone()
            };

            let builder = thread::Builder::new()
                .name(format!("search-helper-{helper_index}"))
                .stack_size(SEARCH_STACK_SIZE);
            let spawned = builder.spawn_scoped(scope, move || {
                let mut helper_tables = SearchTables::new();
                let mut ctx =
                    SearchContext::new(&helper_handle, &mut helper_tables, &helper_settings);
                let _ = iterative_deepening(&mut ctx, &helper_board, &helper_settings, None, false);
            });
            match spawned {
                Ok(joiner) => helpers.push(joiner),
                Err(e) => eprintln!("info string failed to spawn search helper: {e}"),
            }
        }

        let mut ctx = SearchContext::new(handle, tables, settings);
        let result = iterative_deepening(&mut ctx, &root, settings, info.as_ref(), true);

        // Main thread is done: release the helpers and wait for them, so
        // bestmove never races a still-running search
        handle.stop.store(true, Ordering::Relaxed);
        for helper in helpers {
            let _ = helper.join();
        }

        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tt::TranspositionTable;
    use std::sync::Arc;

    fn search_threads(fen: &str, depth: u32, threads: usize) -> SearchResult {
        let board = Board::from_fen(fen);
        let handle = SearchHandle::new(Arc::new(TranspositionTable::new(8)), None);
        let mut tables = SearchTables::new();
        let settings = SearchSettings::depth(depth);
        smp_search(&board, &handle, &settings, &mut tables, threads, None)
    }

    #[test]
    fn test_single_thread_finds_mate() {
        let result = search_threads("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4, 1);
        assert_eq!(result.best_move.expect("move").to_string(), "a1a8");
    }

    #[test]
    fn test_four_threads_find_the_same_mate() {
        let result = search_threads("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4, 4);
        assert_eq!(result.best_move.expect("move").to_string(), "a1a8");
    }

    #[test]
    fn test_helper_depths_alternate() {
        assert_eq!(helper_depth(10, 0), 10);
        assert_eq!(helper_depth(10, 1), 9);
        assert_eq!(helper_depth(10, 2), 10);
        assert_eq!(helper_depth(1, 1), 1);
    }

    #[test]
    fn test_tt_reuse_shrinks_second_search() {
        let board = Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let handle = SearchHandle::new(Arc::new(TranspositionTable::new(16)), None);
        let settings = SearchSettings::depth(7);

        let mut tables = SearchTables::new();
        let first = smp_search(&board, &handle, &settings, &mut tables, 1, None);

        handle.stop.store(false, Ordering::Relaxed);
        let second = smp_search(&board, &handle, &settings, &mut tables, 1, None);

        assert!(
            second.nodes < first.nodes,
            "warm table should shrink the tree: {} vs {}",
            second.nodes,
            first.nodes
        );
    }
}
