//! Extraction data model: evaluated input moves, candidates, persisted
//! puzzles, and the content hashes that key caching and dedup.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use chess_kit::phase::Phase;

use crate::attribution::PatternAttribution;
use crate::config::ExtractorConfig;

/// One upstream-analyzed half-move of a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMove {
    /// Fullmove number of the player who moved.
    pub move_number: u32,
    pub played_san: String,
    pub played_uci: String,
    pub fen_before: String,
    pub best_move_uci: String,
    /// How much the played move lost versus the best move, in centipawns.
    pub eval_loss_cp: i32,
}

/// A game as delivered by upstream analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub moves: Vec<ScoredMove>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Band by loss magnitude: the bigger the miss, the easier the puzzle.
    pub fn from_loss(loss_cp: i32, config: &ExtractorConfig) -> Self {
        if loss_cp >= config.easy_loss_cp {
            Difficulty::Easy
        } else if loss_cp >= config.medium_loss_cp {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    /// One level harder; saturates at Hard. Simplified positions are
    /// harder to calculate correctly despite the lower material.
    pub fn harder(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PuzzleType {
    OpeningError,
    EndgameTechnique,
    MissedTactic,
}

/// A single erred move extracted from a game. Immutable once created;
/// becomes a [`Puzzle`] only if it survives per-game prioritization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleCandidate {
    pub move_number: u32,
    pub fen_before: String,
    pub played_move_san: String,
    pub played_move_uci: String,
    pub best_move_san: String,
    pub best_move_uci: String,
    pub eval_loss_cp: i32,
    pub phase: Phase,
    pub puzzle_type: PuzzleType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tactical_patterns: Option<PatternAttribution>,
}

/// The persisted, sharable unit. `tactical_patterns` stays nullable:
/// records written before pattern attribution existed must keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub puzzle_id: String,
    pub fen: String,
    pub best_move_san: String,
    pub best_move_uci: String,
    pub played_move_san: String,
    pub eval_loss_cp: i32,
    pub phase: Phase,
    pub puzzle_type: PuzzleType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tactical_patterns: Option<PatternAttribution>,
}

impl Puzzle {
    pub fn from_candidate(game_id: &str, candidate: PuzzleCandidate) -> Self {
        Self {
            puzzle_id: format!("{}_{}", game_id, candidate.move_number),
            fen: candidate.fen_before,
            best_move_san: candidate.best_move_san,
            best_move_uci: candidate.best_move_uci,
            played_move_san: candidate.played_move_san,
            eval_loss_cp: candidate.eval_loss_cp,
            phase: candidate.phase,
            puzzle_type: candidate.puzzle_type,
            difficulty: candidate.difficulty,
            tactical_patterns: candidate.tactical_patterns,
        }
    }

    /// Content key used for cross-user dedup.
    pub fn key(&self) -> String {
        puzzle_key(&self.fen, &self.best_move_uci)
    }
}

/// Stable content hash of a position + solution. Identical across calls
/// and across process restarts by construction.
pub fn puzzle_key(fen: &str, best_move_uci: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fen.as_bytes());
    hasher.update(b"|");
    hasher.update(best_move_uci.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Content signature of a game's move list. Any changed move changes the
/// signature; a cache entry is valid only for an exact match.
pub fn game_signature(moves: &[ScoredMove]) -> String {
    let mut hasher = Sha256::new();
    for scored in moves {
        hasher.update(scored.played_uci.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
