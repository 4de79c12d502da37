//! The board state: bitboards, mailbox, castling, hash and NNUE accumulators.

use crate::nnue::Accumulator;
use crate::zobrist::ZOBRIST;

use super::{
    bit_for_square, Bitboard, Color, Piece, Square, ALL_CASTLING_RIGHTS,
};

/// A full chess position.
///
/// The board is a plain value type: search makes a move on a copy and
/// discards the copy on unwind, so there is no unmake path. The mailbox is
/// a redundant square-to-piece index kept in lockstep with the bitboards;
/// `debug_validate` cross-checks the two representations in debug builds.
#[derive(Clone)]
pub struct Board {
    /// One bitboard per (color, piece type)
    pub(crate) pieces: [[Bitboard; 6]; 2],
    /// Cached per-color occupancy unions
    pub(crate) occupied: [Bitboard; 2],
    /// Cached union of both colors
    pub(crate) all_occupied: Bitboard,
    /// Redundant square -> piece lookup
    pub(crate) mailbox: [Option<(Color, Piece)>; 64],
    pub(crate) white_to_move: bool,
    /// Set only after a double pawn push, always on rank 3 or 6
    pub(crate) en_passant: Option<Square>,
    /// Bitmask of `CASTLE_*` flags
    pub(crate) castling_rights: u8,
    /// Incrementally maintained Zobrist hash
    pub(crate) hash: u64,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    /// NNUE hidden state, one accumulator per king perspective
    pub(crate) accumulators: [Accumulator; 2],
}

impl Board {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            board.set_piece(Square::new(0, file), Color::White, *piece);
            board.set_piece(Square::new(7, file), Color::Black, *piece);
            board.set_piece(Square::new(1, file), Color::White, Piece::Pawn);
            board.set_piece(Square::new(6, file), Color::Black, Piece::Pawn);
        }

        board.castling_rights = ALL_CASTLING_RIGHTS;
        board.white_to_move = true;
        board.fullmove_number = 1;
        board.hash = board.zobrist_from_scratch();
        board
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            mailbox: [None; 64],
            white_to_move: true,
            en_passant: None,
            castling_rights: 0,
            hash: 0,
            halfmove_clock: 0,
            fullmove_number: 1,
            accumulators: [Accumulator::zeroed(), Accumulator::zeroed()],
        }
    }

    pub(crate) fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bit = bit_for_square(sq).0;
        let c_idx = color.index();
        self.pieces[c_idx][piece.index()].0 |= bit;
        self.occupied[c_idx].0 |= bit;
        self.all_occupied.0 |= bit;
        self.mailbox[sq.index()] = Some((color, piece));
    }

    pub(crate) fn remove_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let bit = bit_for_square(sq).0;
        let c_idx = color.index();
        self.pieces[c_idx][piece.index()].0 &= !bit;
        self.occupied[c_idx].0 &= !bit;
        self.all_occupied.0 &= !bit;
        self.mailbox[sq.index()] = None;
    }

    /// Look up the piece on a square. One mailbox load.
    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        self.mailbox[sq.index()]
    }

    #[inline]
    pub(crate) fn is_empty_square(&self, sq: Square) -> bool {
        self.mailbox[sq.index()].is_none()
    }

    #[inline]
    pub(crate) fn side_to_move(&self) -> Color {
        if self.white_to_move {
            Color::White
        } else {
            Color::Black
        }
    }

    /// The square of `color`'s king. A well-formed position always has one.
    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces[color.index()][Piece::King.index()].lsb()
    }

    pub(crate) fn has_castling_right(&self, color: Color, side: char) -> bool {
        self.castling_rights & super::castle_bit(color, side) != 0
    }

    /// True when `color` has any piece besides pawns and the king. Used to
    /// guard null-move pruning against zugzwang endgames.
    pub(crate) fn has_non_pawn_material(&self, color: Color) -> bool {
        let c_idx = color.index();
        let non_pawn = self.pieces[c_idx][Piece::Knight.index()].0
            | self.pieces[c_idx][Piece::Bishop.index()].0
            | self.pieces[c_idx][Piece::Rook.index()].0
            | self.pieces[c_idx][Piece::Queen.index()].0;
        non_pawn != 0
    }

    /// Recompute the Zobrist hash from the board contents. The maintained
    /// `hash` field must always equal this value.
    #[must_use]
    pub fn zobrist_from_scratch(&self) -> u64 {
        let mut hash: u64 = 0;

        for idx in 0..64 {
            if let Some((color, piece)) = self.mailbox[idx] {
                hash ^= ZOBRIST.piece(color, piece, Square::from_index(idx));
            }
        }

        if !self.white_to_move {
            hash ^= ZOBRIST.black_to_move_key;
        }

        hash ^= ZOBRIST.castling(self.castling_rights);

        if let Some(ep) = self.en_passant {
            hash ^= ZOBRIST.en_passant(ep);
        }

        hash
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[must_use]
    pub fn castling_rights(&self) -> u8 {
        self.castling_rights
    }

    #[must_use]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Board {{")?;
        for rank in (0..8).rev() {
            write!(f, "  ")?;
            for file in 0..8 {
                let c = match self.piece_at(Square::new(rank, file)) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  fen: {}", self.to_fen())?;
        writeln!(f, "  hash: {:#018x}", self.hash)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_piece_counts() {
        let board = Board::new();
        assert_eq!(board.all_occupied.popcount(), 32);
        assert_eq!(board.occupied[0].popcount(), 16);
        assert_eq!(board.occupied[1].popcount(), 16);
        assert_eq!(
            board.pieces[0][Piece::Pawn.index()].popcount(),
            8
        );
    }

    #[test]
    fn test_startpos_hash_matches_scratch() {
        let board = Board::new();
        assert_eq!(board.hash(), board.zobrist_from_scratch());
    }

    #[test]
    fn test_king_square() {
        let board = Board::new();
        assert_eq!(board.king_square(Color::White), Some(Square::new(0, 4)));
        assert_eq!(board.king_square(Color::Black), Some(Square::new(7, 4)));
    }

    #[test]
    fn test_mailbox_agrees_with_bitboards() {
        let board = Board::new();
        board.debug_validate();
    }
}
