//! Named mate-shape recognition on a final board. Pure pedagogy: these
//! never influence the outcome classification, only decorate it.

use chess::{Board, BoardStatus, Color, File, Piece, Rank, Square, EMPTY};

use chess_kit::geometry::{attackers_of, king_square};

use super::MatePattern;

/// Identify a trivially recognizable mate shape, if any.
/// `winner` is the side that delivered the mate.
pub fn mate_pattern(board: &Board, winner: Color) -> Option<MatePattern> {
    if board.status() != BoardStatus::Checkmate {
        return None;
    }
    if is_smothered_mate(board, winner) {
        Some(MatePattern::Smothered)
    } else if is_back_rank_mate(board, winner) {
        Some(MatePattern::BackRank)
    } else {
        None
    }
}

/// Knight checkmate with every square around the king occupied by the
/// mated side's own pieces.
pub fn is_smothered_mate(board: &Board, winner: Color) -> bool {
    let king_sq = king_square(board, !winner);

    let checker_is_knight = (*board.checkers())
        .into_iter()
        .any(|sq| board.piece_on(sq) == Some(Piece::Knight));
    if !checker_is_knight {
        return false;
    }

    for escape in chess::get_king_moves(king_sq) {
        match board.color_on(escape) {
            Some(color) if color == !winner => continue,
            _ => return false,
        }
    }
    true
}

/// Mate on the defender's back rank: the king is sealed in by its own
/// pieces one rank up and checked along the rank itself.
pub fn is_back_rank_mate(board: &Board, winner: Color) -> bool {
    let king_sq = king_square(board, !winner);
    let back_rank = match winner {
        Color::White => 7,
        Color::Black => 0,
    };
    if king_sq.get_rank().to_index() != back_rank {
        return false;
    }

    let front_rank = match winner {
        Color::White => back_rank - 1,
        Color::Black => back_rank + 1,
    };
    let king_file = king_sq.get_file().to_index();
    let mut files = vec![king_file];
    if king_file > 0 {
        files.push(king_file - 1);
    }
    if king_file < 7 {
        files.push(king_file + 1);
    }

    // Escape squares one rank up must be blocked by the defender's own
    // pieces, and not under attack from the winner (a covered empty square
    // would make this a generic rank mate, not the back-rank shape).
    for file in files {
        let front = Square::make_square(Rank::from_index(front_rank), File::from_index(file));
        if board.color_on(front) != Some(!winner)
            || attackers_of(board, winner, front) != EMPTY
        {
            return false;
        }
    }

    (*board.checkers())
        .into_iter()
        .any(|sq| sq.get_rank().to_index() == back_rank)
}

/// Did the move land in stalemate? Helper used by the attribution phase.
pub fn is_stalemate(board: &Board) -> bool {
    board.status() == BoardStatus::Stalemate
}
