//! Piece-safety predicates: defended, hanging, attackable by a cheaper
//! piece, trapped. These feed motif evidence, so they stay deliberately
//! direct — no capture-sequence search.

use chess::{BitBoard, Board, Color, MoveGen, Piece, Square, EMPTY};

use crate::geometry::attackers_of;
use crate::material::piece_value;

/// Is the piece of `color` on `square` covered by at least one friendly
/// piece? Direct defenders only.
pub fn is_defended(board: &Board, color: Color, square: Square) -> bool {
    attackers_of(board, color, square) != EMPTY
}

/// A piece with no defender at all.
pub fn is_hanging(board: &Board, color: Color, square: Square) -> bool {
    !is_defended(board, color, square)
}

/// Can the piece on `square` be captured by an enemy piece worth less?
/// King captures are excluded — a king "attack" never wins material.
pub fn can_be_taken_by_lower_piece(board: &Board, square: Square) -> bool {
    let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
        (Some(p), Some(c)) => (p, c),
        _ => return false,
    };
    for attacker_sq in attackers_of(board, !color, square) {
        if let Some(attacker) = board.piece_on(attacker_sq) {
            if attacker != Piece::King && piece_value(attacker) < piece_value(piece) {
                return true;
            }
        }
    }
    false
}

/// An attacked piece that is either undefended or attackable by something
/// cheaper.
pub fn is_in_bad_spot(board: &Board, square: Square) -> bool {
    let color = match board.color_on(square) {
        Some(c) => c,
        None => return false,
    };
    if attackers_of(board, !color, square) == EMPTY {
        return false;
    }
    is_hanging(board, color, square) || can_be_taken_by_lower_piece(board, square)
}

/// Is the piece on `square` trapped: in a bad spot with every move leading
/// to another bad spot and no compensating capture available?
///
/// The owner of the piece must be the side to move — legal moves are
/// generated for the side to move only.
pub fn is_trapped(board: &Board, square: Square) -> bool {
    if board.checkers().popcnt() > 0 {
        return false;
    }
    if (*board.pinned() & BitBoard::from_square(square)) != EMPTY {
        return false;
    }

    let piece = match board.piece_on(square) {
        Some(p) => p,
        None => return false,
    };
    // Pawns and kings are never "trapped" in the tactical sense.
    if piece == Piece::Pawn || piece == Piece::King {
        return false;
    }
    if !is_in_bad_spot(board, square) {
        return false;
    }

    for mv in MoveGen::new_legal(board) {
        if mv.get_source() != square {
            continue;
        }
        // Trading for equal or greater value is an escape.
        if let Some(captured) = board.piece_on(mv.get_dest()) {
            if piece_value(captured) >= piece_value(piece) {
                return false;
            }
        }
        let next = board.make_move_new(mv);
        if !is_in_bad_spot(&next, mv.get_dest()) {
            return false;
        }
    }
    true
}
