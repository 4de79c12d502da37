//! FEN parsing and serialization, plus long-algebraic move parsing.

use super::error::{FenError, MoveParseError};
use super::{
    file_to_index, rank_to_index, Board, Color, Move, Piece, Square, CASTLE_BLACK_K,
    CASTLE_BLACK_Q, CASTLE_WHITE_K, CASTLE_WHITE_Q,
};

impl Board {
    /// Parse a board position from the standard six-field FEN notation.
    /// The last two fields (halfmove clock, fullmove number) are optional.
    pub fn try_from_fen(fen: &str) -> Result<Self, FenError> {
        let mut board = Board::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();

        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        // Piece placement, rank 8 first
        for (rank_idx, rank_str) in parts[0].split('/').enumerate() {
            if rank_idx >= 8 {
                return Err(FenError::InvalidRank { rank: rank_idx });
            }
            let mut file = 0;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let color = if c.is_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    if file >= 8 {
                        return Err(FenError::TooManyFiles {
                            rank: rank_idx,
                            files: file + 1,
                        });
                    }
                    board.set_piece(Square::new(7 - rank_idx, file), color, piece);
                    file += 1;
                }
            }
        }

        match parts[1] {
            "w" => board.white_to_move = true,
            "b" => board.white_to_move = false,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        }

        for c in parts[2].chars() {
            match c {
                'K' => board.castling_rights |= CASTLE_WHITE_K,
                'Q' => board.castling_rights |= CASTLE_WHITE_Q,
                'k' => board.castling_rights |= CASTLE_BLACK_K,
                'q' => board.castling_rights |= CASTLE_BLACK_Q,
                '-' => {}
                _ => return Err(FenError::InvalidCastling { char: c }),
            }
        }

        board.en_passant = if parts[3] == "-" {
            None
        } else {
            let chars: Vec<char> = parts[3].chars().collect();
            if chars.len() == 2
                && ('a'..='h').contains(&chars[0])
                && ('1'..='8').contains(&chars[1])
            {
                Some(Square::new(rank_to_index(chars[1]), file_to_index(chars[0])))
            } else {
                return Err(FenError::InvalidEnPassant {
                    found: parts[3].to_string(),
                });
            }
        };

        if let Some(clock) = parts.get(4) {
            board.halfmove_clock = clock.parse().unwrap_or(0);
        }
        if let Some(number) = parts.get(5) {
            board.fullmove_number = number.parse().unwrap_or(1).max(1);
        }

        board.hash = board.zobrist_from_scratch();
        board.debug_assert_valid();
        Ok(board)
    }

    /// Parse a FEN string, panicking on malformed input.
    ///
    /// # Panics
    /// Panics if the FEN string is invalid. Use `try_from_fen` for
    /// fallible parsing.
    #[must_use]
    pub fn from_fen(fen: &str) -> Self {
        match Self::try_from_fen(fen) {
            Ok(board) => board,
            Err(e) => panic!("invalid FEN '{fen}': {e}"),
        }
    }

    /// Serialize the position to FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(rank, file)) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap_or('0'));
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap_or('0'));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.white_to_move { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & CASTLE_WHITE_K != 0 {
                fen.push('K');
            }
            if self.castling_rights & CASTLE_WHITE_Q != 0 {
                fen.push('Q');
            }
            if self.castling_rights & CASTLE_BLACK_K != 0 {
                fen.push('k');
            }
            if self.castling_rights & CASTLE_BLACK_Q != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// Parse a move in long algebraic notation ("e2e4", "e7e8q") against
    /// the legal moves of this position.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveParseError> {
        if !(4..=5).contains(&text.len()) {
            return Err(MoveParseError::InvalidLength { len: text.len() });
        }

        let from: Square = text[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: text.to_string(),
            })?;
        let to: Square = text[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: text.to_string(),
            })?;

        let promotion = match text.chars().nth(4) {
            None => None,
            Some(c) => match Piece::from_char(c) {
                Some(p) if p != Piece::Pawn && p != Piece::King => Some(p),
                _ => return Err(MoveParseError::InvalidPromotion { char: c }),
            },
        };

        self.generate_moves()
            .iter()
            .find(|m| m.from() == from && m.to() == to && m.promoted() == promotion)
            .copied()
            .ok_or(MoveParseError::IllegalMove {
                notation: text.to_string(),
            })
    }
}
