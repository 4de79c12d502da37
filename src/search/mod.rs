//! Game-tree search.
//!
//! Iterative deepening with aspiration windows around a principal
//! variation search, quiescence at the frontier, a shared lock-free
//! transposition table and thread-local move ordering state. Parallelism
//! is lazy SMP: every thread runs the same search, helpers perturb their
//! depth, and the table does the coordinating.

mod constants;
mod iterative;
mod negamax;
mod ordering;
mod quiescence;
mod see;
mod smp;

pub use constants::{MATE_SCORE, MATE_THRESHOLD, MAX_DEPTH, SCORE_INFINITE};
pub use iterative::SearchResult;
pub use ordering::SearchTables;
pub use smp::smp_search;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::{Move, Piece, EMPTY_MOVE, MAX_PLY};
use crate::nnue::NnueNetwork;
use crate::tt::TranspositionTable;

use constants::STOP_CHECK_INTERVAL;

/// Per-`go` search limits. Time limits live in [`SearchClock`].
#[derive(Clone)]
pub struct SearchSettings {
    /// Iteration ceiling (defaults to `MAX_DEPTH`)
    pub max_depth: u32,
    /// Node budget, 0 for unlimited
    pub node_limit: u64,
    /// Number of principal variations to report
    pub multipv: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            max_depth: MAX_DEPTH,
            node_limit: 0,
            multipv: 1,
        }
    }
}

impl SearchSettings {
    /// Depth-limited settings.
    #[must_use]
    pub fn depth(max_depth: u32) -> Self {
        SearchSettings {
            max_depth: max_depth.clamp(1, MAX_DEPTH),
            ..Default::default()
        }
    }
}

/// Soft and hard deadlines for the running search.
///
/// The soft deadline stops iterative deepening between iterations; the
/// hard deadline trips the shared stop flag mid-search. Both are absent
/// for depth-limited, node-limited and infinite searches, and they are
/// installed late on a ponderhit.
pub struct SearchClock {
    inner: Mutex<ClockState>,
}

#[derive(Clone, Copy)]
struct ClockState {
    start: Instant,
    soft: Option<Instant>,
    hard: Option<Instant>,
}

impl SearchClock {
    /// A clock with no deadlines, starting now.
    #[must_use]
    pub fn unlimited() -> Self {
        SearchClock {
            inner: Mutex::new(ClockState {
                start: Instant::now(),
                soft: None,
                hard: None,
            }),
        }
    }

    /// Restart the clock with new deadlines.
    pub fn reset(&self, start: Instant, soft: Option<Instant>, hard: Option<Instant>) {
        let mut state = self.inner.lock();
        *state = ClockState { start, soft, hard };
    }

    /// Install deadlines relative to now without touching the start time
    /// (ponderhit).
    pub fn arm(&self, soft: Option<std::time::Duration>, hard: Option<std::time::Duration>) {
        let now = Instant::now();
        let mut state = self.inner.lock();
        state.soft = soft.map(|d| now + d);
        state.hard = hard.map(|d| now + d);
    }

    #[must_use]
    pub fn snapshot(&self) -> (Instant, Option<Instant>, Option<Instant>) {
        let state = self.inner.lock();
        (state.start, state.soft, state.hard)
    }

    /// Milliseconds since the search started.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.inner.lock().start.elapsed().as_millis() as u64
    }
}

impl Default for SearchClock {
    fn default() -> Self {
        SearchClock::unlimited()
    }
}

/// Everything a search shares with its siblings and the UCI layer.
#[derive(Clone)]
pub struct SearchHandle {
    pub tt: Arc<TranspositionTable>,
    pub nnue: Option<Arc<NnueNetwork>>,
    pub stop: Arc<AtomicBool>,
    pub pondering: Arc<AtomicBool>,
    pub clock: Arc<SearchClock>,
}

impl SearchHandle {
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>, nnue: Option<Arc<NnueNetwork>>) -> Self {
        SearchHandle {
            tt,
            nnue,
            stop: Arc::new(AtomicBool::new(false)),
            pondering: Arc::new(AtomicBool::new(false)),
            clock: Arc::new(SearchClock::unlimited()),
        }
    }
}

/// One iteration's report for the UCI `info` line.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub multipv: u32,
    pub score: i32,
    /// Moves to mate when the score is a mate score, signed by winner
    pub mate: Option<i32>,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Callback receiving each completed iteration.
pub type InfoCallback = Arc<dyn Fn(&SearchInfo) + Send + Sync>;

/// Triangular principal variation buffer.
pub(crate) struct PvTable {
    lines: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    lens: [usize; MAX_PLY],
}

impl PvTable {
    fn new() -> Self {
        PvTable {
            lines: Box::new([[EMPTY_MOVE; MAX_PLY]; MAX_PLY]),
            lens: [0; MAX_PLY],
        }
    }

    #[inline]
    pub(crate) fn clear(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.lens[ply] = 0;
        }
    }

    /// Prepend `mv` to the child line one ply deeper.
    pub(crate) fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child_len = if ply + 1 < MAX_PLY {
            self.lens[ply + 1].min(MAX_PLY - 1 - ply)
        } else {
            0
        };
        self.lines[ply][0] = mv;
        if child_len > 0 {
            let (head, tail) = self.lines.split_at_mut(ply + 1);
            head[ply][1..=child_len].copy_from_slice(&tail[0][..child_len]);
        }
        self.lens[ply] = child_len + 1;
    }

    pub(crate) fn line(&self, ply: usize) -> &[Move] {
        &self.lines[ply][..self.lens[ply]]
    }
}

/// Per-thread search state threaded down the recursion: node counters,
/// ordering tables, PV buffer and previous-move context. Nothing in here
/// is shared; the transposition table is the only cross-thread state.
pub(crate) struct SearchContext<'a> {
    pub(crate) tt: &'a TranspositionTable,
    pub(crate) net: Option<&'a NnueNetwork>,
    pub(crate) stop: &'a AtomicBool,
    pub(crate) pondering: &'a AtomicBool,
    pub(crate) clock: &'a SearchClock,
    pub(crate) node_limit: u64,
    pub(crate) nodes: u64,
    pub(crate) seldepth: u32,
    pub(crate) tables: &'a mut SearchTables,
    pub(crate) pv: PvTable,
    pub(crate) prev_moves: [Move; MAX_PLY],
    pub(crate) prev_pieces: [Option<Piece>; MAX_PLY],
    stopped: bool,
}

impl<'a> SearchContext<'a> {
    pub(crate) fn new(
        handle: &'a SearchHandle,
        tables: &'a mut SearchTables,
        settings: &SearchSettings,
    ) -> Self {
        SearchContext {
            tt: handle.tt.as_ref(),
            net: handle.nnue.as_deref(),
            stop: handle.stop.as_ref(),
            pondering: handle.pondering.as_ref(),
            clock: handle.clock.as_ref(),
            node_limit: settings.node_limit,
            nodes: 0,
            seldepth: 0,
            tables,
            pv: PvTable::new(),
            prev_moves: [EMPTY_MOVE; MAX_PLY],
            prev_pieces: [None; MAX_PLY],
            stopped: false,
        }
    }

    /// Cooperative cancellation: cheap flag reads every node, deadline and
    /// node-budget checks every `STOP_CHECK_INTERVAL` nodes. Once true it
    /// stays true for this thread.
    #[inline]
    pub(crate) fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.stop.load(Ordering::Relaxed) {
            self.stopped = true;
            return true;
        }
        if self.nodes % STOP_CHECK_INTERVAL == 0 {
            if self.node_limit > 0 && self.nodes >= self.node_limit {
                self.stop.store(true, Ordering::Relaxed);
                self.stopped = true;
                return true;
            }
            if !self.pondering.load(Ordering::Relaxed) {
                let (_, _, hard) = self.clock.snapshot();
                if let Some(hard) = hard {
                    if Instant::now() >= hard {
                        self.stop.store(true, Ordering::Relaxed);
                        self.stopped = true;
                        return true;
                    }
                }
            }
        }
        false
    }

    #[inline]
    pub(crate) fn stopped(&self) -> bool {
        self.stopped
    }

    /// The (piece, target) pair of the move that led to this ply, for
    /// counter-move and continuation-history lookups.
    #[inline]
    pub(crate) fn previous(&self, ply: usize) -> Option<(Piece, usize)> {
        if ply == 0 || ply > MAX_PLY {
            return None;
        }
        self.prev_pieces[ply - 1].map(|piece| (piece, self.prev_moves[ply - 1].to().index()))
    }
}
