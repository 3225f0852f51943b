//! Game-phase classification from move number and remaining material.

use chess::Board;
use serde::{Deserialize, Serialize};

use crate::material::non_pawn_total;

/// Fullmove number up to which a position still counts as opening
/// (when material is undiminished).
const OPENING_MOVE_LIMIT: u32 = 10;

/// Combined non-pawn material (pawn units, both sides) at or below which
/// a position counts as an endgame. Roughly rook + minor each.
const ENDGAME_MATERIAL_LIMIT: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

/// Classify a position. Material dominates: a queen trade on move 8 is not
/// an opening position for training purposes, it is whatever the board says.
pub fn classify(board: &Board, fullmove_number: u32) -> Phase {
    if non_pawn_total(board) <= ENDGAME_MATERIAL_LIMIT {
        Phase::Endgame
    } else if fullmove_number <= OPENING_MOVE_LIMIT {
        Phase::Opening
    } else {
        Phase::Middlegame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn start_position_is_opening() {
        assert_eq!(classify(&Board::default(), 1), Phase::Opening);
    }

    #[test]
    fn full_material_past_move_ten_is_middlegame() {
        assert_eq!(classify(&Board::default(), 20), Phase::Middlegame);
    }

    #[test]
    fn bare_kings_and_pawns_are_endgame_regardless_of_move() {
        let board = Board::from_str("4k3/4p3/8/8/8/8/4P3/4K3 w - - 0 9").unwrap();
        assert_eq!(classify(&board, 9), Phase::Endgame);
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Endgame).unwrap(), "\"endgame\"");
    }
}
