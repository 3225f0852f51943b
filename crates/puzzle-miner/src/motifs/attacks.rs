//! Attack-pressure mechanisms: fork, overloaded defender, trapped piece.

use chess::{BitBoard, Board, ChessMove, Color, Piece, Square, EMPTY};

use chess_kit::geometry::{attacked_enemy_pieces, attackers_of};
use chess_kit::material::target_value;
use chess_kit::safety::{is_hanging, is_in_bad_spot, is_trapped};

use crate::attribution::Motif;

use super::MotifEvidence;

/// The moved piece attacks two or more pieces that are each worth more
/// than it, or hanging with no way to answer on the fork square.
pub fn fork(after: &Board, mv: ChessMove, mover: Color) -> Option<MotifEvidence> {
    let dest = mv.get_dest();
    let moved = match after.piece_on(dest) {
        Some(Piece::King) | None => return None,
        Some(p) => p,
    };
    // A fork from a square the opponent can profitably take is no fork.
    if is_in_bad_spot(after, dest) {
        return None;
    }

    let mut prongs: Vec<Square> = Vec::new();
    for (piece, square) in attacked_enemy_pieces(after, dest, mover) {
        if piece == Piece::Pawn {
            continue;
        }
        let outguns_attacker = target_value(piece) > target_value(moved);
        let helpless = is_hanging(after, !mover, square)
            && (attackers_of(after, !mover, dest) & BitBoard::from_square(square)) == EMPTY;
        if outguns_attacker || helpless {
            prongs.push(square);
        }
    }

    if prongs.len() < 2 {
        return None;
    }
    let mut squares = vec![dest];
    squares.extend(prongs);
    Some(MotifEvidence::new(Motif::Fork, squares))
}

/// An enemy piece that is the sole defender of two or more attacked
/// pieces — it cannot hold both.
pub fn overloaded_piece(after: &Board, mover: Color) -> Option<MotifEvidence> {
    let enemy = *after.color_combined(!mover);

    for defender_sq in enemy {
        let mut held: Vec<Square> = Vec::new();
        for target_sq in enemy {
            if target_sq == defender_sq {
                continue;
            }
            if after.piece_on(target_sq) == Some(Piece::Pawn) {
                continue;
            }
            if attackers_of(after, mover, target_sq) == EMPTY {
                continue;
            }
            let defenders = attackers_of(after, !mover, target_sq);
            if defenders.popcnt() == 1
                && (defenders & BitBoard::from_square(defender_sq)) != EMPTY
            {
                held.push(target_sq);
            }
        }
        if held.len() >= 2 {
            let mut squares = vec![defender_sq];
            squares.extend(held);
            return Some(MotifEvidence::new(Motif::OverloadedPiece, squares));
        }
    }
    None
}

/// An attacked enemy piece with no safe square to go to.
pub fn trapped_piece(after: &Board, mover: Color) -> Option<MotifEvidence> {
    let enemy = *after.color_combined(!mover);
    for square in enemy {
        match after.piece_on(square) {
            Some(Piece::Pawn) | Some(Piece::King) | None => continue,
            Some(_) => {}
        }
        if attackers_of(after, mover, square) == EMPTY {
            continue;
        }
        // The enemy is to move in `after`, which is what is_trapped needs.
        if is_trapped(after, square) {
            return Some(MotifEvidence::new(Motif::TrappedPiece, vec![square]));
        }
    }
    None
}
