//! End-to-end engine scenarios through the public API.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pincer::board::Board;
use pincer::search::{
    smp_search, SearchHandle, SearchSettings, SearchTables, MATE_SCORE, MAX_DEPTH,
};
use pincer::time::{compute_budget, TimeControl};
use pincer::tt::TranspositionTable;

fn new_handle(tt_mb: usize) -> SearchHandle {
    SearchHandle::new(Arc::new(TranspositionTable::new(tt_mb)), None)
}

#[test]
fn test_mate_in_one_is_found_and_mates() {
    let fen = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";
    let board = Board::from_fen(fen);
    let handle = new_handle(8);
    let mut tables = SearchTables::new();
    let result = smp_search(
        &board,
        &handle,
        &SearchSettings::depth(4),
        &mut tables,
        1,
        None,
    );

    assert!(
        result.score >= MATE_SCORE - 128,
        "expected a mate score, got {}",
        result.score
    );

    let best = result.best_move.expect("a best move");
    let mut after = Board::from_fen(fen);
    assert!(after.make_move(best, None));
    assert!(after.is_checkmate(), "playing {best} must deliver mate");
}

#[test]
fn test_clock_scramble_finishes_inside_the_second() {
    let tc = TimeControl {
        wtime: Some(1000),
        btime: Some(1000),
        winc: Some(0),
        binc: Some(0),
        ..Default::default()
    };
    let budget = compute_budget(&tc, true, 10);

    let board = Board::new();
    let handle = new_handle(8);
    let now = Instant::now();
    handle.clock.reset(
        now,
        budget.optimal.map(|d| now + d),
        budget.maximum.map(|d| now + d),
    );

    let mut tables = SearchTables::new();
    let settings = SearchSettings {
        max_depth: MAX_DEPTH,
        ..Default::default()
    };
    let result = smp_search(&board, &handle, &settings, &mut tables, 1, None);

    let elapsed = now.elapsed();
    assert!(
        elapsed < Duration::from_millis(1000),
        "search overran the clock: {elapsed:?}"
    );
    assert!(result.best_move.is_some());
}

#[test]
fn test_warm_tt_searches_fewer_nodes() {
    let board =
        Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
    let handle = new_handle(16);
    let settings = SearchSettings::depth(8);
    let mut tables = SearchTables::new();

    let cold = smp_search(&board, &handle, &settings, &mut tables, 1, None);
    handle.stop.store(false, Ordering::Relaxed);
    let warm = smp_search(&board, &handle, &settings, &mut tables, 1, None);

    assert!(
        warm.nodes < cold.nodes,
        "expected fewer nodes with a warm table: {} vs {}",
        warm.nodes,
        cold.nodes
    );
}

#[test]
fn test_stop_flag_cancels_promptly() {
    let board = Board::new();
    let handle = new_handle(8);
    let settings = SearchSettings {
        max_depth: MAX_DEPTH,
        ..Default::default()
    };

    let worker_handle = handle.clone();
    let worker = std::thread::spawn(move || {
        let mut tables = SearchTables::new();
        smp_search(&board, &worker_handle, &settings, &mut tables, 1, None)
    });

    std::thread::sleep(Duration::from_millis(100));
    let stop_at = Instant::now();
    handle.stop.store(true, Ordering::Relaxed);
    let result = worker.join().expect("search thread");
    let reaction = stop_at.elapsed();

    assert!(result.best_move.is_some());
    assert!(
        reaction < Duration::from_millis(500),
        "stop took {reaction:?} to take effect"
    );
}

#[test]
fn test_multithreaded_search_agrees_on_forced_tactics() {
    // White wins the queen with a fork-free capture
    let fen = "3q2k1/8/8/8/8/8/8/3Q2K1 w - - 0 1";
    for threads in [1, 2, 4] {
        let board = Board::from_fen(fen);
        let handle = new_handle(8);
        let mut tables = SearchTables::new();
        let result = smp_search(
            &board,
            &handle,
            &SearchSettings::depth(5),
            &mut tables,
            threads,
            None,
        );
        assert_eq!(
            result.best_move.expect("move").to_string(),
            "d1d8",
            "{threads} thread(s) must take the hanging queen"
        );
    }
}

#[test]
fn test_fifty_move_rule_scores_draw() {
    // A drawn-by-rule position still produces a legal move, score 0
    let board = Board::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 99 80");
    let handle = new_handle(4);
    let mut tables = SearchTables::new();
    let result = smp_search(
        &board,
        &handle,
        &SearchSettings::depth(4),
        &mut tables,
        1,
        None,
    );
    assert!(result.best_move.is_some());
}
