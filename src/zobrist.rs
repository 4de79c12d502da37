//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position hashes for the
//! transposition table. Keys are generated once from a fixed seed so that
//! hashes are reproducible across runs.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::board::{Color, Piece, Square};

pub(crate) struct ZobristKeys {
    // piece_keys[piece_type][color][square_index]
    pub(crate) piece_keys: [[[u64; 64]; 2]; 6],
    pub(crate) black_to_move_key: u64,
    // castling_keys[rights_mask] - one key per 4-bit rights combination
    pub(crate) castling_keys: [u64; 16],
    // en_passant_keys[file_index] (only the file matters for the EP target)
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        let mut piece_keys = [[[0u64; 64]; 2]; 6];
        let mut castling_keys = [0u64; 16];
        let mut en_passant_keys = [0u64; 8];

        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let black_to_move_key = rng.gen();

        // Index 0 (no rights) hashes to nothing so that an empty mask is a
        // no-op when XORed in and out.
        for key in castling_keys.iter_mut().skip(1) {
            *key = rng.gen();
        }

        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            black_to_move_key,
            castling_keys,
            en_passant_keys,
        }
    }

    #[inline]
    pub(crate) fn piece(&self, color: Color, piece: Piece, sq: Square) -> u64 {
        self.piece_keys[piece.index()][color.index()][sq.index()]
    }

    #[inline]
    pub(crate) fn castling(&self, rights: u8) -> u64 {
        self.castling_keys[(rights & 0xF) as usize]
    }

    #[inline]
    pub(crate) fn en_passant(&self, sq: Square) -> u64 {
        self.en_passant_keys[sq.file()]
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);
