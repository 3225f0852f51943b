//! Line-based mechanisms: double check, discovered attack, pin, skewer.

use chess::{BitBoard, Board, ChessMove, Color, Piece, Square, EMPTY};

use chess_kit::geometry::{
    absolute_pins, attacked_enemy_pieces, attacks_from, is_ray_piece,
};
use chess_kit::material::{piece_value, target_value};

use crate::attribution::Motif;

use super::MotifEvidence;

/// Two pieces giving check at once.
pub fn double_check(after: &Board, _mover: Color) -> Option<MotifEvidence> {
    let checkers = *after.checkers();
    if checkers.popcnt() < 2 {
        return None;
    }
    Some(MotifEvidence::new(
        Motif::DoubleCheck,
        checkers.into_iter().collect(),
    ))
}

/// The move uncovered an attack from a piece that did not move: either a
/// discovered check, or a slider now bearing on a major piece through the
/// vacated square.
pub fn discovered_attack(
    before: &Board,
    mv: ChessMove,
    after: &Board,
    mover: Color,
) -> Option<MotifEvidence> {
    // Discovered check: a checker other than the piece that just moved.
    let checkers = *after.checkers();
    for checker in checkers {
        if checker != mv.get_dest() {
            return Some(MotifEvidence::new(
                Motif::DiscoveredAttack,
                vec![checker, mv.get_source()],
            ));
        }
    }

    // Quiet discovery: a friendly slider attacks a rook-or-better target
    // through the square the move vacated.
    let sliders = (*after.pieces(Piece::Bishop)
        | *after.pieces(Piece::Rook)
        | *after.pieces(Piece::Queen))
        & *after.color_combined(mover);
    for slider_sq in sliders {
        if slider_sq == mv.get_dest() {
            continue;
        }
        for (piece, target_sq) in attacked_enemy_pieces(after, slider_sq, mover) {
            if piece_value(piece) < piece_value(Piece::Rook) {
                continue;
            }
            let through =
                chess::between(slider_sq, target_sq) & BitBoard::from_square(mv.get_source());
            let attacked_before = attacks_from(before, slider_sq)
                & BitBoard::from_square(target_sq);
            if through != EMPTY && attacked_before == EMPTY {
                return Some(MotifEvidence::new(
                    Motif::DiscoveredAttack,
                    vec![slider_sq, target_sq],
                ));
            }
        }
    }
    None
}

/// An enemy piece newly pinned against its own king.
pub fn new_pin(before: &Board, after: &Board, mover: Color) -> Option<MotifEvidence> {
    let already_pinned: Vec<Square> = absolute_pins(before, !mover)
        .into_iter()
        .map(|pin| pin.pinned)
        .collect();

    for pin in absolute_pins(after, !mover) {
        if already_pinned.contains(&pin.pinned) {
            continue;
        }
        // Pinned pawns are routine; record pinned pieces only.
        if after.piece_on(pin.pinned) == Some(Piece::Pawn) {
            continue;
        }
        return Some(MotifEvidence::new(
            Motif::Pin,
            vec![pin.pinner, pin.pinned],
        ));
    }
    None
}

/// The moved slider attacks a valuable piece with a cheaper enemy piece
/// standing behind it on the same ray.
pub fn skewer(after: &Board, mv: ChessMove, mover: Color) -> Option<MotifEvidence> {
    let dest = mv.get_dest();
    let moved = match after.piece_on(dest) {
        Some(p) if is_ray_piece(p) => p,
        _ => return None,
    };

    let occupied = *after.combined();
    let enemy = *after.color_combined(!mover);

    for (front, front_sq) in attacked_enemy_pieces(after, dest, mover) {
        // The front piece must be worth chasing off the line.
        if target_value(front) <= piece_value(moved) || front == Piece::Pawn {
            continue;
        }
        for rear_sq in enemy {
            if rear_sq == front_sq {
                continue;
            }
            let on_ray = chess::line(dest, front_sq) & BitBoard::from_square(rear_sq);
            let front_between =
                chess::between(dest, rear_sq) & BitBoard::from_square(front_sq);
            if on_ray == EMPTY || front_between == EMPTY {
                continue;
            }
            // Nothing else between the front and rear pieces.
            if (chess::between(front_sq, rear_sq) & occupied) != EMPTY {
                continue;
            }
            let rear = match after.piece_on(rear_sq) {
                Some(p) => p,
                None => continue,
            };
            if target_value(front) > target_value(rear) && rear != Piece::Pawn {
                return Some(MotifEvidence::new(
                    Motif::Skewer,
                    vec![dest, front_sq, rear_sq],
                ));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_kit::notation::parse_uci;
    use std::str::FromStr;

    fn apply(fen: &str, uci: &str) -> (Board, ChessMove, Board, Color) {
        let before = Board::from_str(fen).unwrap();
        let mv = parse_uci(uci).unwrap();
        assert!(before.legal(mv), "fixture move {uci} illegal in {fen}");
        let mover = before.side_to_move();
        (before, mv, before.make_move_new(mv), mover)
    }

    #[test]
    fn knight_unmasking_bishop_while_checking_is_double_check() {
        let (_, _, after, mover) = apply("4k3/3N4/8/1B6/8/8/8/4K3 w - - 0 1", "d7f6");
        let evidence = double_check(&after, mover).unwrap();
        assert_eq!(evidence.squares.len(), 2);
    }

    #[test]
    fn knight_stepping_off_bishop_line_is_discovered_check() {
        let (before, mv, after, mover) = apply("4k3/3N4/8/1B6/8/8/8/4K3 w - - 0 1", "d7b6");
        assert!(double_check(&after, mover).is_none());
        let evidence = discovered_attack(&before, mv, &after, mover).unwrap();
        assert_eq!(evidence.motif, Motif::DiscoveredAttack);
    }

    #[test]
    fn rook_lining_up_with_king_pins_the_knight() {
        let (before, _, after, mover) = apply("4k3/8/8/4n3/8/8/8/R5K1 w - - 0 1", "a1e1");
        let evidence = new_pin(&before, &after, mover).unwrap();
        assert_eq!(evidence.motif, Motif::Pin);
        assert_eq!(evidence.squares[1].to_string(), "e5");
    }

    #[test]
    fn pre_existing_pin_is_not_reported_again() {
        // Knight already pinned; an unrelated king move changes nothing.
        let (before, _, after, mover) = apply("4k3/8/8/4n3/8/8/8/4R1K1 w - - 0 1", "g1g2");
        assert!(new_pin(&before, &after, mover).is_none());
    }

    #[test]
    fn bishop_attacking_queen_with_rook_behind_is_a_skewer() {
        let (_, mv, after, mover) = apply("r3k3/8/8/3q4/8/8/4P3/4K2B w - - 0 1", "h1f3");
        let evidence = skewer(&after, mv, mover).unwrap();
        let squares: Vec<String> = evidence.squares.iter().map(|s| s.to_string()).collect();
        assert_eq!(squares, vec!["f3", "d5", "a8"]);
    }

    #[test]
    fn pin_geometry_is_not_a_skewer() {
        // Rook attacks knight with the king behind: front is cheaper than
        // back, so this is pin territory, not a skewer.
        let (_, mv, after, mover) = apply("4k3/8/8/4n3/8/8/8/R5K1 w - - 0 1", "a1e1");
        assert!(skewer(&after, mv, mover).is_none());
    }
}
