//! Material accounting in pawn units.

use chess::{Board, Color, Piece};

pub const PAWN: i32 = 1;
pub const KNIGHT: i32 = 3;
pub const BISHOP: i32 = 3;
pub const ROOK: i32 = 5;
pub const QUEEN: i32 = 9;

/// Exchange value of a piece; the king counts as zero here.
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => 0,
    }
}

/// Like [`piece_value`] but the king outranks everything — useful when
/// comparing attack targets, where a king is always worth attacking.
pub fn target_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => 99,
        other => piece_value(other),
    }
}

/// Total material for one side, kings excluded.
pub fn side_material(board: &Board, color: Color) -> i32 {
    let ours = *board.color_combined(color);
    [
        (Piece::Pawn, PAWN),
        (Piece::Knight, KNIGHT),
        (Piece::Bishop, BISHOP),
        (Piece::Rook, ROOK),
        (Piece::Queen, QUEEN),
    ]
    .iter()
    .map(|&(piece, value)| (*board.pieces(piece) & ours).popcnt() as i32 * value)
    .sum()
}

/// Material balance from `side`'s point of view.
pub fn material_diff(board: &Board, side: Color) -> i32 {
    side_material(board, side) - side_material(board, !side)
}

/// Combined non-pawn material of both sides, kings excluded.
/// Low totals mean the position has simplified into an endgame.
pub fn non_pawn_total(board: &Board) -> i32 {
    let pieces = *board.combined()
        & !*board.pieces(Piece::Pawn)
        & !*board.pieces(Piece::King);
    pieces
        .into_iter()
        .filter_map(|sq| board.piece_on(sq))
        .map(piece_value)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn starting_material_is_balanced() {
        let board = Board::default();
        assert_eq!(side_material(&board, Color::White), 39);
        assert_eq!(side_material(&board, Color::Black), 39);
        assert_eq!(material_diff(&board, Color::White), 0);
        assert_eq!(non_pawn_total(&board), 62);
    }

    #[test]
    fn king_and_pawn_endgame_has_no_piece_material() {
        let board = Board::from_str("4k3/4p3/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(non_pawn_total(&board), 0);
        assert_eq!(side_material(&board, Color::White), 1);
    }
}
