//! Attack and ray geometry over bitboards.

use chess::{
    BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square, EMPTY,
};

/// Squares a pawn of `color` attacks from `square` (captures only, no pushes).
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index() as i32;
    let forward = match color {
        Color::White => rank + 1,
        Color::Black => rank - 1,
    };
    if !(0..=7).contains(&forward) {
        return EMPTY;
    }

    let mut result = EMPTY;
    if file > 0 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(forward as usize),
            File::from_index(file - 1),
        ));
    }
    if file < 7 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(forward as usize),
            File::from_index(file + 1),
        ));
    }
    result
}

/// All squares attacked by the piece standing on `square`.
/// Empty if the square is empty.
pub fn attacks_from(board: &Board, square: Square) -> BitBoard {
    let piece = match board.piece_on(square) {
        Some(p) => p,
        None => return EMPTY,
    };
    let occupied = *board.combined();

    match piece {
        Piece::Pawn => match board.color_on(square) {
            Some(color) => pawn_attacks(square, color),
            None => EMPTY,
        },
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, occupied),
        Piece::Rook => chess::get_rook_moves(square, occupied),
        Piece::Queen => {
            chess::get_bishop_moves(square, occupied) | chess::get_rook_moves(square, occupied)
        }
    }
}

/// All pieces of `color` that attack `square`, as a bitboard.
/// Sliding attacks respect the current occupancy; pawns are found by the
/// reverse lookup (pawn attacks from the target with the opposite color).
pub fn attackers_of(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let ours = *board.color_combined(color);

    let mut result = pawn_attacks(square, !color) & *board.pieces(Piece::Pawn) & ours;
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight) & ours;
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King) & ours;

    let diag = *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen);
    result |= chess::get_bishop_moves(square, occupied) & diag & ours;

    let ortho = *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    result |= chess::get_rook_moves(square, occupied) & ortho & ours;

    result
}

/// The king square for `color`.
pub fn king_square(board: &Board, color: Color) -> Square {
    let king = *board.pieces(Piece::King) & *board.color_combined(color);
    debug_assert_eq!(king.popcnt(), 1);
    king.to_square()
}

/// Does this piece slide along rays?
pub fn is_ray_piece(piece: Piece) -> bool {
    matches!(piece, Piece::Bishop | Piece::Rook | Piece::Queen)
}

/// Enemy pieces attacked from `square`, with their locations.
pub fn attacked_enemy_pieces(board: &Board, square: Square, pov: Color) -> Vec<(Piece, Square)> {
    let mut result = Vec::new();
    for sq in attacks_from(board, square) {
        if let (Some(piece), Some(color)) = (board.piece_on(sq), board.color_on(sq)) {
            if color != pov {
                result.push((piece, sq));
            }
        }
    }
    result
}

/// A piece absolutely pinned against its own king.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRay {
    pub pinned: Square,
    pub pinner: Square,
}

fn on_diagonal(a: Square, b: Square) -> bool {
    let df = (a.get_file().to_index() as i32 - b.get_file().to_index() as i32).abs();
    let dr = (a.get_rank().to_index() as i32 - b.get_rank().to_index() as i32).abs();
    df == dr && df != 0
}

fn on_orthogonal(a: Square, b: Square) -> bool {
    (a.get_file() == b.get_file() || a.get_rank() == b.get_rank()) && a != b
}

/// All pieces of `color` absolutely pinned against their own king:
/// exactly one friendly piece stands between the king and an enemy slider
/// whose movement covers the shared ray.
pub fn absolute_pins(board: &Board, color: Color) -> Vec<PinRay> {
    let king_sq = king_square(board, color);
    let occupied = *board.combined();
    let own = *board.color_combined(color);
    let enemy = *board.color_combined(!color);

    let sliders = (*board.pieces(Piece::Bishop)
        | *board.pieces(Piece::Rook)
        | *board.pieces(Piece::Queen))
        & enemy;

    let mut pins = Vec::new();
    for slider_sq in sliders {
        let aligned = match board.piece_on(slider_sq) {
            Some(Piece::Bishop) => on_diagonal(king_sq, slider_sq),
            Some(Piece::Rook) => on_orthogonal(king_sq, slider_sq),
            Some(Piece::Queen) => {
                on_diagonal(king_sq, slider_sq) || on_orthogonal(king_sq, slider_sq)
            }
            _ => false,
        };
        if !aligned {
            continue;
        }
        let blockers = chess::between(king_sq, slider_sq) & occupied;
        if blockers.popcnt() == 1 && (blockers & own) == blockers {
            pins.push(PinRay {
                pinned: blockers.to_square(),
                pinner: slider_sq,
            });
        }
    }
    pins
}

/// Does this move capture anything? Covers en passant (pawn changing file
/// onto an empty square).
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    if board.piece_on(mv.get_dest()).is_some() {
        return true;
    }
    board.piece_on(mv.get_source()) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
}

/// Is this move castling? (king moving more than one file)
pub fn is_castling_move(board: &Board, mv: ChessMove) -> bool {
    if board.piece_on(mv.get_source()) != Some(Piece::King) {
        return false;
    }
    let from = mv.get_source().get_file().to_index() as i32;
    let to = mv.get_dest().get_file().to_index() as i32;
    (from - to).abs() > 1
}
