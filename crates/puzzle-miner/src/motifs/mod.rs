//! Mechanism detectors. Each one is an independent check over a single
//! (board-before, move, board-after) triple and returns evidence — the
//! squares involved — rather than a bare boolean, so the attribution can
//! record constraints regardless of which motif wins the label.

pub mod attacks;
pub mod guard;
pub mod line_geometry;

use chess::{Board, ChessMove, Color, Square};

use crate::attribution::{Constraint, Motif};

/// Evidence tier: whether the mechanism is exerted by the moved piece
/// itself or is a positional byproduct discovered on the resulting board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
}

/// One detected mechanism.
#[derive(Debug, Clone)]
pub struct MotifEvidence {
    pub motif: Motif,
    pub squares: Vec<Square>,
}

impl MotifEvidence {
    pub fn new(motif: Motif, squares: Vec<Square>) -> Self {
        Self { motif, squares }
    }

    pub fn tier(&self) -> Tier {
        match self.motif {
            Motif::OverloadedPiece | Motif::TrappedPiece => Tier::Secondary,
            _ => Tier::Primary,
        }
    }

    pub fn constraint(&self) -> Constraint {
        Constraint::new(self.motif, &self.squares)
    }
}

/// Run every detector and return the findings sorted by motif precedence
/// (highest-precedence first).
pub fn sweep(
    before: &Board,
    mv: ChessMove,
    after: &Board,
    mover: Color,
) -> Vec<MotifEvidence> {
    let mut found = Vec::new();

    found.extend(line_geometry::double_check(after, mover));
    found.extend(line_geometry::discovered_attack(before, mv, after, mover));
    found.extend(guard::removed_guard(before, mv, after, mover));
    found.extend(attacks::overloaded_piece(after, mover));
    found.extend(attacks::trapped_piece(after, mover));
    found.extend(attacks::fork(after, mv, mover));
    found.extend(line_geometry::new_pin(before, after, mover));
    found.extend(line_geometry::skewer(after, mv, mover));

    found.sort_by_key(|evidence| evidence.motif.precedence());
    found
}
