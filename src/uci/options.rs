//! UCI options and their ranges.

/// Default network file probed at startup and on `ucinewgame`.
pub const DEFAULT_EVAL_FILE: &str = "nn-c0ae49f08b40.nnue";

pub const HASH_DEFAULT_MB: usize = 64;
pub const HASH_MIN_MB: usize = 1;
pub const HASH_MAX_MB: usize = 1024;

pub const THREADS_MIN: usize = 1;
pub const THREADS_MAX: usize = 512;

pub const MULTIPV_MIN: u32 = 1;
pub const MULTIPV_MAX: u32 = 500;

pub const MOVE_OVERHEAD_DEFAULT_MS: u64 = 10;
pub const MOVE_OVERHEAD_MAX_MS: u64 = 5000;

/// Current option values.
#[derive(Debug, Clone)]
pub struct UciOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub multipv: u32,
    pub move_overhead_ms: u64,
    pub ponder: bool,
    pub eval_file: String,
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions {
            hash_mb: HASH_DEFAULT_MB,
            threads: 1,
            multipv: 1,
            move_overhead_ms: MOVE_OVERHEAD_DEFAULT_MS,
            ponder: false,
            eval_file: DEFAULT_EVAL_FILE.to_string(),
        }
    }
}

impl UciOptions {
    /// Print the `option` lines of the `uci` handshake.
    pub fn print(&self) {
        println!(
            "option name Hash type spin default {HASH_DEFAULT_MB} min {HASH_MIN_MB} max {HASH_MAX_MB}"
        );
        println!("option name EvalFile type string default {DEFAULT_EVAL_FILE}");
        println!(
            "option name Move Overhead type spin default {MOVE_OVERHEAD_DEFAULT_MS} min 0 max {MOVE_OVERHEAD_MAX_MS}"
        );
        println!("option name MultiPV type spin default 1 min {MULTIPV_MIN} max {MULTIPV_MAX}");
        println!("option name Ponder type check default false");
        println!("option name Threads type spin default 1 min {THREADS_MIN} max {THREADS_MAX}");
    }
}

/// What the engine must do after an option change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionAction {
    None,
    ResizeHash(usize),
    ReloadEvalFile(String),
}

impl UciOptions {
    /// Apply a `setoption`; option names are case-insensitive.
    pub fn apply(&mut self, name: &str, value: Option<&str>) -> OptionAction {
        match name.trim().to_ascii_lowercase().as_str() {
            "hash" => {
                let mb = value
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(HASH_DEFAULT_MB)
                    .clamp(HASH_MIN_MB, HASH_MAX_MB);
                if mb != self.hash_mb {
                    self.hash_mb = mb;
                    return OptionAction::ResizeHash(mb);
                }
            }
            "threads" => {
                if let Some(v) = value.and_then(|v| v.parse::<usize>().ok()) {
                    self.threads = v.clamp(THREADS_MIN, THREADS_MAX);
                }
            }
            "multipv" => {
                if let Some(v) = value.and_then(|v| v.parse::<u32>().ok()) {
                    self.multipv = v.clamp(MULTIPV_MIN, MULTIPV_MAX);
                }
            }
            "move overhead" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.move_overhead_ms = v.min(MOVE_OVERHEAD_MAX_MS);
                }
            }
            "ponder" => {
                if let Some(v) = value {
                    self.ponder = matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1");
                }
            }
            "evalfile" => {
                if let Some(path) = value {
                    self.eval_file = path.to_string();
                    return OptionAction::ReloadEvalFile(self.eval_file.clone());
                }
            }
            _ => {}
        }
        OptionAction::None
    }
}
