//! Guard removal: capturing the piece that held the defense together.

use chess::{Board, ChessMove, Color, Piece, EMPTY};

use chess_kit::geometry::{attackers_of, attacks_from};
use chess_kit::safety::is_hanging;

use crate::attribution::Motif;

use super::MotifEvidence;

/// The move captures a defender, leaving something it was guarding
/// attacked and undefended.
pub fn removed_guard(
    before: &Board,
    mv: ChessMove,
    after: &Board,
    mover: Color,
) -> Option<MotifEvidence> {
    let dest = mv.get_dest();
    // Must capture an enemy piece standing on the destination square.
    if before.color_on(dest) != Some(!mover) {
        return None;
    }

    // Squares the captured piece was covering.
    for guarded_sq in attacks_from(before, dest) {
        if after.color_on(guarded_sq) != Some(!mover) {
            continue;
        }
        if after.piece_on(guarded_sq) == Some(Piece::Pawn) {
            continue;
        }
        if attackers_of(after, mover, guarded_sq) == EMPTY {
            continue;
        }
        if is_hanging(after, !mover, guarded_sq) {
            return Some(MotifEvidence::new(
                Motif::RemovingTheGuard,
                vec![dest, guarded_sq],
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_kit::notation::parse_uci;
    use std::str::FromStr;

    #[test]
    fn capturing_the_knight_leaves_the_bishop_unguarded() {
        // The c6 knight is the only defender of the e5 bishop, which the
        // d3 knight attacks. Rxc6 removes the guard.
        let before = Board::from_str("4k3/8/2n5/4b3/8/3N4/8/2R1K3 w - - 0 1").unwrap();
        let mv = parse_uci("c1c6").unwrap();
        assert!(before.legal(mv));
        let after = before.make_move_new(mv);
        let evidence = removed_guard(&before, mv, &after, Color::White).unwrap();
        let squares: Vec<String> = evidence.squares.iter().map(|s| s.to_string()).collect();
        assert_eq!(squares, vec!["c6", "e5"]);
    }

    #[test]
    fn quiet_move_removes_no_guard() {
        let before = Board::default();
        let mv = parse_uci("e2e4").unwrap();
        let after = before.make_move_new(mv);
        assert!(removed_guard(&before, mv, &after, Color::White).is_none());
    }
}
