//! Shared transposition table.
//!
//! A fixed-size, open-addressed, single-bucket table keyed by the Zobrist
//! hash. It is the only mutable state shared between search threads, and
//! it is lock-free: the payload is packed into one word written first, and
//! the key word - stored XORed with the payload as a commit marker - is
//! published last with release ordering. A reader that acquires the key
//! word and finds it consistent with the payload saw a complete entry;
//! any torn or stale pairing fails the XOR check and reads as a miss,
//! which only costs a recomputation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::Move;

/// What a stored score proves about the node it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is the exact value of the node
    Exact,
    /// Score is an upper bound (the node failed low)
    Upper,
    /// Score is a lower bound (the node failed high)
    Lower,
}

impl Bound {
    fn to_bits(self) -> u64 {
        match self {
            Bound::Exact => 0,
            Bound::Upper => 1,
            Bound::Lower => 2,
        }
    }

    fn from_bits(bits: u64) -> Bound {
        match bits & 0x3 {
            0 => Bound::Exact,
            1 => Bound::Upper,
            _ => Bound::Lower,
        }
    }
}

/// A decoded table entry.
#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub best_move: Move,
    pub score: i32,
    pub depth: u32,
    pub bound: Bound,
}

impl TtEntry {
    /// Pack into the payload word: move in the low 16 bits, then score,
    /// depth and bound.
    fn pack(self) -> u64 {
        let mv = u64::from(self.best_move.as_u16());
        let score = (self.score.clamp(-32000, 32000) as i16) as u16 as u64;
        let depth = u64::from(self.depth.min(255) as u8);
        let bound = self.bound.to_bits();
        mv | (score << 16) | (depth << 32) | (bound << 40)
    }

    fn unpack(data: u64) -> TtEntry {
        TtEntry {
            best_move: Move::from_u16((data & 0xFFFF) as u16),
            score: i32::from(((data >> 16) & 0xFFFF) as u16 as i16),
            depth: ((data >> 32) & 0xFF) as u32,
            bound: Bound::from_bits(data >> 40),
        }
    }
}

/// One slot: the payload word plus the XOR-committed key word.
#[derive(Default)]
struct TtSlot {
    key: AtomicU64,
    data: AtomicU64,
}

pub struct TranspositionTable {
    slots: Vec<TtSlot>,
}

/// Keep an existing entry for a different position when it is this much
/// deeper than the incoming one.
const REPLACE_DEPTH_MARGIN: u32 = 2;

impl TranspositionTable {
    /// Allocate `size_mb` megabytes of zeroed entries.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        match Self::try_new(size_mb) {
            Ok(table) => table,
            // Fall back to the smallest table rather than dying; a tiny
            // TT only costs strength
            Err(_) => Self::try_new(1).unwrap_or(TranspositionTable { slots: Vec::new() }),
        }
    }

    /// Allocate, reporting failure so a resize can keep the old table.
    pub fn try_new(size_mb: usize) -> Result<Self, std::collections::TryReserveError> {
        let entry_size = std::mem::size_of::<TtSlot>();
        let count = ((size_mb.max(1) * (1 << 20)) / entry_size).max(1);
        let mut slots = Vec::new();
        slots.try_reserve_exact(count)?;
        slots.resize_with(count, TtSlot::default);
        Ok(TranspositionTable { slots })
    }

    #[inline]
    fn slot(&self, key: u64) -> Option<&TtSlot> {
        if self.slots.is_empty() {
            return None;
        }
        let index = (key % self.slots.len() as u64) as usize;
        Some(&self.slots[index])
    }

    /// Read the entry for `key`, if a consistent one is stored.
    #[must_use]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let slot = self.slot(key)?;
        let stored_key = slot.key.load(Ordering::Acquire);
        let data = slot.data.load(Ordering::Relaxed);
        if stored_key == 0 && data == 0 {
            return None;
        }
        // The key word carries key ^ data; a mismatch means empty, another
        // position, or a torn pair from a concurrent writer
        if stored_key ^ data != key {
            return None;
        }
        Some(TtEntry::unpack(data))
    }

    /// Bound-aware probe: returns a score usable at this node, per the
    /// entry's bound type, when the stored depth covers `depth`.
    #[must_use]
    pub fn probe_cutoff(&self, key: u64, alpha: i32, beta: i32, depth: u32) -> Option<i32> {
        let entry = self.probe(key)?;
        if entry.depth < depth {
            return None;
        }
        match entry.bound {
            Bound::Exact => Some(entry.score),
            Bound::Upper if entry.score <= alpha => Some(alpha),
            Bound::Lower if entry.score >= beta => Some(beta),
            _ => None,
        }
    }

    /// Store an entry, payload first, key published last.
    ///
    /// Replacement is depth-preferring: an existing entry for a different
    /// position survives only if it is more than `REPLACE_DEPTH_MARGIN`
    /// plies deeper than the incoming one.
    pub fn store(&self, key: u64, best_move: Move, score: i32, depth: u32, bound: Bound) {
        let Some(slot) = self.slot(key) else { return };

        let stored_key = slot.key.load(Ordering::Acquire);
        let stored_data = slot.data.load(Ordering::Relaxed);
        if stored_key != 0 || stored_data != 0 {
            let existing_key = stored_key ^ stored_data;
            if existing_key != key {
                let existing = TtEntry::unpack(stored_data);
                if existing.depth > depth + REPLACE_DEPTH_MARGIN {
                    return;
                }
            }
        }

        let entry = TtEntry {
            best_move,
            score,
            depth,
            bound,
        };
        let data = entry.pack();
        slot.data.store(data, Ordering::Relaxed);
        slot.key.store(key ^ data, Ordering::Release);
    }

    /// Drop all entries (new game).
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.data.store(0, Ordering::Relaxed);
            slot.key.store(0, Ordering::Relaxed);
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fill estimate in permille, sampled from the table head, for the
    /// `info hashfull` field.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let used = self.slots[..sample]
            .iter()
            .filter(|slot| {
                slot.key.load(Ordering::Relaxed) != 0 || slot.data.load(Ordering::Relaxed) != 0
            })
            .count();
        (used * 1000 / sample) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn test_move() -> Move {
        Move::quiet(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn test_store_then_probe() {
        let tt = TranspositionTable::new(1);
        tt.store(0xABCD, test_move(), 42, 7, Bound::Exact);

        let entry = tt.probe(0xABCD).expect("entry should be present");
        assert_eq!(entry.best_move, test_move());
        assert_eq!(entry.score, 42);
        assert_eq!(entry.depth, 7);
        assert_eq!(entry.bound, Bound::Exact);
    }

    #[test]
    fn test_probe_miss_on_other_key() {
        let tt = TranspositionTable::new(1);
        tt.store(0xABCD, test_move(), 42, 7, Bound::Exact);
        assert!(tt.probe(0xDCBA).is_none());
    }

    #[test]
    fn test_negative_scores_roundtrip() {
        let tt = TranspositionTable::new(1);
        tt.store(1, test_move(), -28950, 3, Bound::Lower);
        assert_eq!(tt.probe(1).unwrap().score, -28950);
    }

    #[test]
    fn test_cutoff_semantics() {
        let tt = TranspositionTable::new(1);

        tt.store(10, test_move(), 500, 6, Bound::Exact);
        assert_eq!(tt.probe_cutoff(10, -100, 100, 6), Some(500));
        // Insufficient depth misses
        assert_eq!(tt.probe_cutoff(10, -100, 100, 7), None);

        tt.store(11, test_move(), -50, 6, Bound::Upper);
        // Upper bound below alpha fails low to alpha
        assert_eq!(tt.probe_cutoff(11, 0, 100, 6), Some(0));
        assert_eq!(tt.probe_cutoff(11, -100, 100, 6), None);

        tt.store(12, test_move(), 250, 6, Bound::Lower);
        // Lower bound above beta fails high to beta
        assert_eq!(tt.probe_cutoff(12, 0, 100, 6), Some(100));
        assert_eq!(tt.probe_cutoff(12, 0, 300, 6), None);
    }

    #[test]
    fn test_depth_preferring_replacement() {
        let tt = TranspositionTable::new(1);
        let len = tt.len() as u64;
        // Two keys colliding on the same slot
        let deep_key = 5u64;
        let shallow_key = 5 + len;

        tt.store(deep_key, test_move(), 10, 12, Bound::Exact);
        // A much shallower entry must not evict it
        tt.store(shallow_key, test_move(), 20, 3, Bound::Exact);
        assert!(tt.probe(deep_key).is_some());
        assert!(tt.probe(shallow_key).is_none());

        // Within the margin the newcomer wins
        tt.store(shallow_key, test_move(), 20, 10, Bound::Exact);
        assert!(tt.probe(shallow_key).is_some());
        assert!(tt.probe(deep_key).is_none());
    }

    #[test]
    fn test_same_key_always_overwrites() {
        let tt = TranspositionTable::new(1);
        tt.store(7, test_move(), 10, 12, Bound::Exact);
        tt.store(7, test_move(), 99, 1, Bound::Lower);
        let entry = tt.probe(7).unwrap();
        assert_eq!(entry.score, 99);
        assert_eq!(entry.depth, 1);
    }

    #[test]
    fn test_clear_empties_table() {
        let tt = TranspositionTable::new(1);
        tt.store(7, test_move(), 10, 12, Bound::Exact);
        tt.clear();
        assert!(tt.probe(7).is_none());
        assert_eq!(tt.hashfull_per_mille(), 0);
    }

    #[test]
    fn test_concurrent_stores_never_tear() {
        use std::sync::Arc;

        let tt = Arc::new(TranspositionTable::new(1));
        let mut handles = Vec::new();

        for t in 0..4u64 {
            let tt = Arc::clone(&tt);
            handles.push(std::thread::spawn(move || {
                let len = tt.len() as u64;
                for i in 0..20_000u64 {
                    // All threads hammer the same few slots
                    let key = (i % 8) + t * len;
                    tt.store(key, test_move(), (key % 1000) as i32, 5, Bound::Exact);
                    for probe_key in 0..8 {
                        if let Some(entry) = tt.probe(probe_key) {
                            // A hit must carry the payload stored under
                            // that key, never a mixture
                            assert_eq!(entry.score, (probe_key % 1000) as i32);
                        }
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("tt stress thread panicked");
        }
    }
}
