//! Universal Chess Interface front-end.
//!
//! A line loop over stdin that owns the engine state: the current board,
//! the transposition table, the loaded network and the option set.
//! Searches run on a worker thread so `stop`, `ponderhit` and `quit` are
//! honored mid-search; the worker prints `info` lines as iterations
//! complete and `bestmove` when it finishes.

mod command;
mod options;

pub use command::{parse_uci_command, GoParams, UciCommand};
pub use options::{OptionAction, UciOptions, DEFAULT_EVAL_FILE};

use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::board::Board;
use crate::nnue::NnueNetwork;
use crate::search::{
    smp_search, InfoCallback, SearchHandle, SearchInfo, SearchResult, SearchSettings, SearchTables,
    MAX_DEPTH,
};
use crate::time::{compute_budget, TimeBudget, TimeControl};
use crate::tt::TranspositionTable;

pub const ENGINE_NAME: &str = concat!("pincer ", env!("CARGO_PKG_VERSION"));
pub const ENGINE_AUTHOR: &str = "the pincer developers";

pub struct UciEngine {
    board: Board,
    options: UciOptions,
    tt: Arc<TranspositionTable>,
    nnue: Option<Arc<NnueNetwork>>,
    handle: SearchHandle,
    /// Budget computed at `go`, installed on the clock at `ponderhit`
    pending_budget: TimeBudget,
    /// Running search worker; yields the ordering tables back when joined
    worker: Option<JoinHandle<SearchTables>>,
    tables: Option<SearchTables>,
}

impl UciEngine {
    #[must_use]
    pub fn new() -> Self {
        let options = UciOptions::default();
        let tt = Arc::new(TranspositionTable::new(options.hash_mb));
        let nnue = load_network(&options.eval_file, false);
        let handle = SearchHandle::new(Arc::clone(&tt), nnue.clone());
        UciEngine {
            board: Board::new(),
            options,
            tt,
            nnue,
            handle,
            pending_budget: TimeBudget::UNLIMITED,
            worker: None,
            tables: Some(SearchTables::new()),
        }
    }

    /// Read commands from stdin until `quit`.
    pub fn run(&mut self) {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(cmd) = parse_uci_command(&line) else {
                continue;
            };
            if !self.dispatch(cmd) {
                break;
            }
        }
        self.abort_search();
    }

    /// Handle one command; false ends the session.
    pub fn dispatch(&mut self, cmd: UciCommand) -> bool {
        match cmd {
            UciCommand::Uci => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                self.options.print();
                println!("uciok");
            }
            UciCommand::IsReady => println!("readyok"),
            UciCommand::UciNewGame => {
                self.abort_search();
                self.board = Board::new();
                self.tt.clear();
                self.tables = Some(SearchTables::new());
            }
            UciCommand::Position(parts) => {
                self.abort_search();
                self.set_position(&parts);
            }
            UciCommand::Go(params) => self.go(&params),
            UciCommand::Perft(depth) => self.perft(depth),
            UciCommand::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            UciCommand::Stop => self.abort_search(),
            UciCommand::PonderHit => {
                // Pondered move was played: start honoring the deadlines
                self.handle
                    .clock
                    .arm(self.pending_budget.optimal, self.pending_budget.maximum);
                self.handle.pondering.store(false, Ordering::Relaxed);
            }
            UciCommand::Quit => {
                self.abort_search();
                return false;
            }
            UciCommand::Unknown(_) => {}
        }
        true
    }

    /// `position [startpos | fen <fen>] [moves ...]`
    fn set_position(&mut self, parts: &[String]) {
        let mut index = 0;
        let board = match parts.first().map(String::as_str) {
            Some("startpos") => {
                index = 1;
                Some(Board::new())
            }
            Some("fen") => {
                let fen_end = parts
                    .iter()
                    .position(|p| p == "moves")
                    .unwrap_or(parts.len());
                let fen = parts[1..fen_end].join(" ");
                index = fen_end;
                match Board::try_from_fen(&fen) {
                    Ok(board) => Some(board),
                    Err(e) => {
                        println!("info string rejected fen: {e}");
                        None
                    }
                }
            }
            _ => None,
        };
        // A bad FEN leaves the current position untouched
        let Some(mut board) = board else { return };

        if parts.get(index).map(String::as_str) == Some("moves") {
            for text in &parts[index + 1..] {
                let Ok(mv) = board.parse_move(text) else {
                    // Malformed or illegal move strings are dropped, along
                    // with everything after them
                    break;
                };
                let mut next = board.clone();
                if !next.make_move(mv, None) {
                    break;
                }
                board = next;
            }
        }

        self.board = board;
    }

    fn go(&mut self, params: &GoParams) {
        self.abort_search();

        let tc = TimeControl {
            wtime: params.wtime,
            btime: params.btime,
            winc: params.winc,
            binc: params.binc,
            movestogo: params.movestogo,
            movetime: params.movetime,
            infinite: params.infinite,
        };
        let budget = compute_budget(&tc, self.board.white_to_move(), self.options.move_overhead_ms);
        self.pending_budget = budget;

        self.handle.stop.store(false, Ordering::Relaxed);
        self.handle.pondering.store(params.ponder, Ordering::Relaxed);
        let now = Instant::now();
        if params.ponder {
            // Deadlines suppressed until ponderhit
            self.handle.clock.reset(now, None, None);
        } else {
            self.handle.clock.reset(
                now,
                budget.optimal.map(|d| now + d),
                budget.maximum.map(|d| now + d),
            );
        }

        let settings = SearchSettings {
            max_depth: params.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH),
            node_limit: params.nodes.unwrap_or(0),
            multipv: self.options.multipv,
        };

        let board = self.board.clone();
        let handle = self.handle.clone();
        let threads = self.options.threads;
        let mut tables = self.tables.take().unwrap_or_else(SearchTables::new);
        let info: InfoCallback = Arc::new(print_info);

        let spawned = std::thread::Builder::new()
            .name("search-main".to_string())
            .spawn(move || {
                let result =
                    smp_search(&board, &handle, &settings, &mut tables, threads, Some(info));
                print_bestmove(&result);
                tables
            });

        match spawned {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => println!("info string failed to start search: {e}"),
        }
    }

    fn perft(&mut self, depth: usize) {
        self.abort_search();
        let start = Instant::now();
        let results = self.board.perft_divide(depth);
        let mut total = 0u64;
        for (mv, nodes) in &results {
            println!("{mv}: {nodes}");
            total += nodes;
        }
        let elapsed = start.elapsed();
        let nps = if elapsed.as_millis() > 0 {
            total as u128 * 1000 / elapsed.as_millis()
        } else {
            0
        };
        println!("perft {depth}: {total} nodes in {elapsed:.2?} ({nps} nps)");
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        self.abort_search();
        match self.options.apply(name, value) {
            OptionAction::ResizeHash(mb) => match TranspositionTable::try_new(mb) {
                Ok(table) => {
                    self.tt = Arc::new(table);
                    self.handle = SearchHandle::new(Arc::clone(&self.tt), self.nnue.clone());
                }
                // Keep the current table on allocation failure
                Err(e) => println!("info string hash resize to {mb} MB failed: {e}"),
            },
            OptionAction::ReloadEvalFile(path) => {
                self.nnue = load_network(&path, true);
                self.handle = SearchHandle::new(Arc::clone(&self.tt), self.nnue.clone());
            }
            OptionAction::None => {}
        }
    }

    /// Stop the running search, if any, and recover the ordering tables.
    fn abort_search(&mut self) {
        self.handle.stop.store(true, Ordering::Relaxed);
        self.handle.pondering.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(tables) => self.tables = Some(tables),
                Err(_) => self.tables = Some(SearchTables::new()),
            }
        }
    }

    /// The current position (for tests and tooling).
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Block until the running search finishes on its own terms.
    pub fn wait_for_search(&mut self) {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(tables) => self.tables = Some(tables),
                Err(_) => self.tables = Some(SearchTables::new()),
            }
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        UciEngine::new()
    }
}

fn print_info(info: &SearchInfo) {
    let score = match info.mate {
        Some(mate) => format!("mate {mate}"),
        None => format!("cp {}", info.score),
    };
    let pv = info
        .pv
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "info depth {} seldepth {} multipv {} score {} nodes {} nps {} hashfull {} time {} pv {}",
        info.depth,
        info.seldepth,
        info.multipv,
        score,
        info.nodes,
        info.nps,
        info.hashfull,
        info.time_ms,
        pv
    );
}

fn print_bestmove(result: &SearchResult) {
    match (result.best_move, result.ponder_move) {
        (Some(best), Some(ponder)) => println!("bestmove {best} ponder {ponder}"),
        (Some(best), None) => println!("bestmove {best}"),
        (None, _) => println!("bestmove 0000"),
    }
}

/// Load a network, falling back to the classical evaluation on any error.
fn load_network(path: &str, announce: bool) -> Option<Arc<NnueNetwork>> {
    match NnueNetwork::load(path) {
        Ok(net) => {
            if announce {
                println!("info string loaded eval file {path} ({})", net.description());
            }
            #[cfg(feature = "logging")]
            log::info!("loaded NNUE network from {path}");
            Some(Arc::new(net))
        }
        Err(e) => {
            if announce {
                println!("info string eval file {path} unusable ({e}), using classical eval");
            }
            #[cfg(feature = "logging")]
            log::warn!("NNUE load failed for {path}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_position_startpos_with_moves() {
        let mut engine = UciEngine::new();
        let parts: Vec<String> = ["startpos", "moves", "e2e4", "e7e5", "g1f3"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        engine.set_position(&parts);
        assert!(!engine.board().white_to_move());
        assert_eq!(engine.board().fullmove_number(), 2);
    }

    #[test]
    fn test_set_position_fen() {
        let mut engine = UciEngine::new();
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut parts = vec!["fen".to_string()];
        parts.extend(fen.split_whitespace().map(str::to_string));
        engine.set_position(&parts);
        assert_eq!(engine.board().to_fen(), fen);
    }

    #[test]
    fn test_bad_fen_keeps_previous_position() {
        let mut engine = UciEngine::new();
        let before = engine.board().to_fen();
        let parts = vec!["fen".to_string(), "garbage".to_string()];
        engine.set_position(&parts);
        assert_eq!(engine.board().to_fen(), before);
    }

    #[test]
    fn test_bad_move_is_dropped_with_tail() {
        let mut engine = UciEngine::new();
        let parts: Vec<String> = ["startpos", "moves", "e2e4", "e2e4", "d7d5"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        engine.set_position(&parts);
        // Only the first move applied; the illegal repeat and its tail
        // are silently dropped
        assert!(!engine.board().white_to_move());
    }

    #[test]
    fn test_go_depth_emits_bestmove_and_stops() {
        let mut engine = UciEngine::new();
        engine.dispatch(UciCommand::Position(
            ["startpos"].iter().map(|s| (*s).to_string()).collect(),
        ));
        let go = parse_uci_command("go depth 3").unwrap();
        assert!(engine.dispatch(go));
        engine.wait_for_search();
    }

    #[test]
    fn test_quit_returns_false() {
        let mut engine = UciEngine::new();
        assert!(!engine.dispatch(UciCommand::Quit));
    }
}
