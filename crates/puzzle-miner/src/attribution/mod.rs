//! The attribution data model: what a move *achieves* (outcome) versus the
//! machinery it uses to achieve it (motifs and their evidence).
//!
//! The two are kept strictly apart. A fork that forces mate is a checkmate
//! puzzle — the fork survives only as suppressed, explanatory evidence.

mod attributor;
pub mod mates;

pub use attributor::attribute;

use chess::Square;
use serde::{Deserialize, Serialize};

/// Final classification slot. At most one, and a committed terminal value
/// (`Checkmate`/`StalemateTrap`) can never be replaced — see
/// [`AttributionBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryOutcome {
    Checkmate,
    StalemateTrap,
    MaterialWin,
    Other,
    None,
}

/// Tactical mechanism labels, declared in precedence order: when several
/// motifs are detected, the earliest listed wins the composite label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Motif {
    DoubleCheck,
    DiscoveredAttack,
    RemovingTheGuard,
    OverloadedPiece,
    TrappedPiece,
    Fork,
    Pin,
    Skewer,
}

impl Motif {
    /// Lower ranks first.
    pub fn precedence(self) -> u8 {
        match self {
            Motif::DoubleCheck => 0,
            Motif::DiscoveredAttack => 1,
            Motif::RemovingTheGuard => 2,
            Motif::OverloadedPiece => 3,
            Motif::TrappedPiece => 4,
            Motif::Fork => 5,
            Motif::Pin => 6,
            Motif::Skewer => 7,
        }
    }
}

/// Named mate shapes we point out when they are trivially recognizable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatePattern {
    BackRank,
    Smothered,
}

/// Evidence for one detected mechanism: the motif kind and the squares
/// involved, in detection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: Motif,
    pub squares: Vec<String>,
}

impl Constraint {
    pub fn new(kind: Motif, squares: &[Square]) -> Self {
        Self {
            kind,
            squares: squares.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The classification result for one position + move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAttribution {
    pub primary_outcome: PrimaryOutcome,
    /// Named mate shape, only on the checkmate path.
    #[serde(default)]
    pub mate_pattern: Option<MatePattern>,
    /// Mover moves until mate, counting the attributed move itself.
    #[serde(default)]
    pub mate_in: Option<u32>,
    /// Pedagogical motif label; never set on a mate/stalemate outcome.
    #[serde(default)]
    pub composite_pattern: Option<Motif>,
    /// Evidence from mechanisms exerted by the moved piece.
    #[serde(default)]
    pub primary_constraints: Vec<Constraint>,
    /// Evidence from positional byproducts on the resulting board.
    #[serde(default)]
    pub secondary_constraints: Vec<Constraint>,
    /// Motifs detected but overridden by a higher-priority outcome.
    /// Explanatory only — never used for classification.
    #[serde(default)]
    pub suppressed_patterns: Vec<Motif>,
}

/// A forced terminal result of the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Checkmate {
        pattern: Option<MatePattern>,
        mate_in: u32,
    },
    StalemateTrap,
}

/// Accumulates constraint evidence, then is *consumed* by exactly one of
/// the two finishers. Committing a terminal outcome takes the builder by
/// value, so no later step can observe or overwrite the attribution — the
/// write-once rule is enforced by ownership, not by runtime checks.
#[derive(Debug, Default)]
pub struct AttributionBuilder {
    primary_constraints: Vec<Constraint>,
    secondary_constraints: Vec<Constraint>,
}

impl AttributionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_primary(&mut self, constraint: Constraint) {
        self.primary_constraints.push(constraint);
    }

    pub fn push_secondary(&mut self, constraint: Constraint) {
        self.secondary_constraints.push(constraint);
    }

    /// Commit a final forced outcome. Mechanisms that were detected along
    /// the way are retained as suppressed patterns for explanatory UI; the
    /// composite label stays empty.
    pub fn commit_terminal(
        self,
        outcome: TerminalOutcome,
        suppressed: Vec<Motif>,
    ) -> PatternAttribution {
        let (primary_outcome, mate_pattern, mate_in) = match outcome {
            TerminalOutcome::Checkmate { pattern, mate_in } => {
                (PrimaryOutcome::Checkmate, pattern, Some(mate_in))
            }
            TerminalOutcome::StalemateTrap => (PrimaryOutcome::StalemateTrap, None, None),
        };
        PatternAttribution {
            primary_outcome,
            mate_pattern,
            mate_in,
            composite_pattern: None,
            primary_constraints: self.primary_constraints,
            secondary_constraints: self.secondary_constraints,
            suppressed_patterns: suppressed,
        }
    }

    /// Finish without a terminal outcome: the motif (if any) carries the
    /// label, and the outcome slot records material win / other.
    pub fn finish(self, composite: Option<Motif>, won_material: bool) -> PatternAttribution {
        let primary_outcome = if won_material {
            PrimaryOutcome::MaterialWin
        } else if composite.is_some() {
            PrimaryOutcome::None
        } else {
            PrimaryOutcome::Other
        };
        PatternAttribution {
            primary_outcome,
            mate_pattern: None,
            mate_in: None,
            composite_pattern: composite,
            primary_constraints: self.primary_constraints,
            secondary_constraints: self.secondary_constraints,
            suppressed_patterns: Vec::new(),
        }
    }
}
