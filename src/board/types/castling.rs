//! Castling rights bitmask.

use super::piece::Color;

pub(crate) const CASTLE_WHITE_K: u8 = 1;
pub(crate) const CASTLE_WHITE_Q: u8 = 2;
pub(crate) const CASTLE_BLACK_K: u8 = 4;
pub(crate) const CASTLE_BLACK_Q: u8 = 8;

pub(crate) const ALL_CASTLING_RIGHTS: u8 =
    CASTLE_WHITE_K | CASTLE_WHITE_Q | CASTLE_BLACK_K | CASTLE_BLACK_Q;

/// Bit for a color/side combination. `side` is 'K' or 'Q'.
pub(crate) const fn castle_bit(color: Color, side: char) -> u8 {
    match (color, side) {
        (Color::White, 'K') => CASTLE_WHITE_K,
        (Color::White, _) => CASTLE_WHITE_Q,
        (Color::Black, 'K') => CASTLE_BLACK_K,
        (Color::Black, _) => CASTLE_BLACK_Q,
    }
}

/// Per-square castling rights mask, ANDed into the rights on every move
/// using both the source and target square. Corner squares clear the
/// matching rook's bit; the king squares clear both bits for that color;
/// every other square leaves the rights untouched.
pub(crate) const CASTLING_RIGHTS_MASK: [u8; 64] = {
    let mut mask = [ALL_CASTLING_RIGHTS; 64];
    mask[0] = ALL_CASTLING_RIGHTS & !CASTLE_WHITE_Q; // a1
    mask[4] = ALL_CASTLING_RIGHTS & !(CASTLE_WHITE_K | CASTLE_WHITE_Q); // e1
    mask[7] = ALL_CASTLING_RIGHTS & !CASTLE_WHITE_K; // h1
    mask[56] = ALL_CASTLING_RIGHTS & !CASTLE_BLACK_Q; // a8
    mask[60] = ALL_CASTLING_RIGHTS & !(CASTLE_BLACK_K | CASTLE_BLACK_Q); // e8
    mask[63] = ALL_CASTLING_RIGHTS & !CASTLE_BLACK_K; // h8
    mask
};
