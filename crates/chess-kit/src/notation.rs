//! Move notation: UCI parsing/formatting and SAN parsing/rendering.

use chess::{Board, BoardStatus, ChessMove, File, MoveGen, Piece, Rank, Square};
use thiserror::Error;

use crate::geometry::is_castling_move;

#[derive(Error, Debug)]
pub enum NotationError {
    #[error("empty SAN move")]
    Empty,
    #[error("unknown piece letter: {0}")]
    UnknownPiece(char),
    #[error("invalid destination in SAN: {0}")]
    BadDestination(String),
    #[error("no legal move matches SAN: {0}")]
    NoMatch(String),
    #[error("ambiguous SAN: {0} ({1} candidates)")]
    Ambiguous(String, usize),
}

fn square_from_bytes(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((rank - b'1') as usize),
        File::from_index((file - b'a') as usize),
    ))
}

/// Parse a UCI move string ("e2e4", "e7e8q"). Returns None on malformed
/// input; legality against `board` is the caller's concern.
pub fn parse_uci(uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let from = square_from_bytes(bytes[0], bytes[1])?;
    let to = square_from_bytes(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4) {
        Some(b'q') | Some(b'Q') => Some(Piece::Queen),
        Some(b'r') | Some(b'R') => Some(Piece::Rook),
        Some(b'b') | Some(b'B') => Some(Piece::Bishop),
        Some(b'n') | Some(b'N') => Some(Piece::Knight),
        Some(_) => return None,
        None => None,
    };
    Some(ChessMove::new(from, to, promotion))
}

/// Format a move as UCI.
pub fn to_uci(mv: ChessMove) -> String {
    let promo = match mv.get_promotion() {
        Some(Piece::Queen) => "q",
        Some(Piece::Rook) => "r",
        Some(Piece::Bishop) => "b",
        Some(Piece::Knight) => "n",
        _ => "",
    };
    format!("{}{}{}", mv.get_source(), mv.get_dest(), promo)
}

fn file_char(file: File) -> char {
    (b'a' + file.to_index() as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank.to_index() as u8) as char
}

fn piece_letter(piece: Piece) -> Option<char> {
    match piece {
        Piece::Pawn => None,
        Piece::Knight => Some('N'),
        Piece::Bishop => Some('B'),
        Piece::Rook => Some('R'),
        Piece::Queen => Some('Q'),
        Piece::King => Some('K'),
    }
}

/// Render a legal move in SAN, including disambiguation, capture marker,
/// promotion and check/checkmate suffix.
pub fn to_san(board: &Board, mv: ChessMove) -> String {
    let piece = match board.piece_on(mv.get_source()) {
        Some(p) => p,
        None => return to_uci(mv),
    };

    let after = board.make_move_new(mv);
    let suffix = if after.checkers().popcnt() > 0 {
        if after.status() == BoardStatus::Checkmate {
            "#"
        } else {
            "+"
        }
    } else {
        ""
    };

    if is_castling_move(board, mv) {
        let kingside = mv.get_dest().get_file().to_index() > mv.get_source().get_file().to_index();
        return format!("{}{}", if kingside { "O-O" } else { "O-O-O" }, suffix);
    }

    let is_capture = crate::geometry::is_capture(board, mv);
    let dest = mv.get_dest().to_string();
    let promo = match mv.get_promotion().and_then(piece_letter) {
        Some(letter) => format!("={letter}"),
        None => String::new(),
    };

    if piece == Piece::Pawn {
        let stem = if is_capture {
            format!("{}x{}", file_char(mv.get_source().get_file()), dest)
        } else {
            dest
        };
        return format!("{stem}{promo}{suffix}");
    }

    // Disambiguate against other same-type pieces that can legally reach
    // the destination.
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|m| {
            m.get_dest() == mv.get_dest()
                && m.get_source() != mv.get_source()
                && board.piece_on(m.get_source()) == Some(piece)
        })
        .map(|m| m.get_source())
        .collect();

    let mut disambig = String::new();
    if !rivals.is_empty() {
        let same_file = rivals
            .iter()
            .any(|s| s.get_file() == mv.get_source().get_file());
        let same_rank = rivals
            .iter()
            .any(|s| s.get_rank() == mv.get_source().get_rank());
        if !same_file {
            disambig.push(file_char(mv.get_source().get_file()));
        } else if !same_rank {
            disambig.push(rank_char(mv.get_source().get_rank()));
        } else {
            disambig = mv.get_source().to_string();
        }
    }

    let capture = if is_capture { "x" } else { "" };
    let letter = piece_letter(piece).unwrap_or('?');
    format!("{letter}{disambig}{capture}{dest}{promo}{suffix}")
}

/// Parse a SAN move against a position. Tolerates trailing `+`/`#`/`!`/`?`
/// annotations.
pub fn parse_san(board: &Board, san: &str) -> Result<ChessMove, NotationError> {
    let clean = san.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    if clean.is_empty() {
        return Err(NotationError::Empty);
    }

    let legal: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if clean == "O-O" || clean == "0-0" || clean == "O-O-O" || clean == "0-0-0" {
        let kingside = clean == "O-O" || clean == "0-0";
        return legal
            .iter()
            .copied()
            .find(|m| {
                is_castling_move(board, *m)
                    && (m.get_dest().get_file().to_index() > m.get_source().get_file().to_index())
                        == kingside
            })
            .ok_or_else(|| NotationError::NoMatch(san.to_string()));
    }

    let bytes = clean.as_bytes();
    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            other => return Err(NotationError::UnknownPiece(other as char)),
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    let (rest, promotion) = match rest.find('=') {
        Some(idx) => {
            let promo = match rest.as_bytes().get(idx + 1) {
                Some(b'Q') => Some(Piece::Queen),
                Some(b'R') => Some(Piece::Rook),
                Some(b'B') => Some(Piece::Bishop),
                Some(b'N') => Some(Piece::Knight),
                _ => None,
            };
            (&rest[..idx], promo)
        }
        None => (rest, None),
    };

    let rest = rest.replace('x', "");
    let bytes = rest.as_bytes();
    if bytes.len() < 2 {
        return Err(NotationError::BadDestination(san.to_string()));
    }
    let dest = square_from_bytes(bytes[bytes.len() - 2], bytes[bytes.len() - 1])
        .ok_or_else(|| NotationError::BadDestination(san.to_string()))?;
    let disambig = &rest[..rest.len() - 2];

    let mut candidates: Vec<ChessMove> = legal
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .collect();

    if candidates.len() > 1 && !disambig.is_empty() {
        candidates.retain(|m| {
            disambig.bytes().all(|b| match b {
                b'a'..=b'h' => m.get_source().get_file().to_index() == (b - b'a') as usize,
                b'1'..=b'8' => m.get_source().get_rank().to_index() == (b - b'1') as usize,
                _ => true,
            })
        });
    }

    match candidates.len() {
        1 => Ok(candidates[0]),
        0 => Err(NotationError::NoMatch(san.to_string())),
        n => Err(NotationError::Ambiguous(san.to_string(), n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn uci_round_trip() {
        let mv = parse_uci("e2e4").unwrap();
        assert_eq!(to_uci(mv), "e2e4");
        let promo = parse_uci("e7e8q").unwrap();
        assert_eq!(promo.get_promotion(), Some(Piece::Queen));
        assert_eq!(to_uci(promo), "e7e8q");
        assert!(parse_uci("e9e4").is_none());
        assert!(parse_uci("xx").is_none());
    }

    #[test]
    fn san_parse_from_start() {
        let board = Board::default();
        let mv = parse_san(&board, "Nf3").unwrap();
        assert_eq!(to_uci(mv), "g1f3");
        let pawn = parse_san(&board, "e4").unwrap();
        assert_eq!(to_uci(pawn), "e2e4");
    }

    #[test]
    fn san_render_basics() {
        let board = Board::default();
        assert_eq!(to_san(&board, parse_uci("e2e4").unwrap()), "e4");
        assert_eq!(to_san(&board, parse_uci("g1f3").unwrap()), "Nf3");
    }

    #[test]
    fn san_render_capture_and_mate() {
        // Scholar's mate delivery.
        let board = Board::from_str(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        )
        .unwrap();
        assert_eq!(to_san(&board, parse_uci("h5f7").unwrap()), "Qxf7#");
    }

    #[test]
    fn san_render_disambiguates_by_file() {
        // Two knights (b1, f3) can both reach d2.
        let board = Board::from_str("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1").unwrap();
        assert_eq!(to_san(&board, parse_uci("b1d2").unwrap()), "Nbd2");
        assert_eq!(to_san(&board, parse_uci("f3d2").unwrap()), "Nfd2");
    }

    #[test]
    fn san_parse_rejects_garbage() {
        let board = Board::default();
        assert!(parse_san(&board, "Zf3").is_err());
        assert!(parse_san(&board, "Nf6").is_err()); // not legal for white
    }
}
