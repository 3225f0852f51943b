//! Puzzle mining core: tactical attribution and per-game extraction.
//!
//! The attribution engine classifies a single position + move into a final
//! forced outcome (checkmate, stalemate trap, material win) or an
//! intermediate mechanism (fork, pin, skewer, ...), with a strict priority
//! ordering between the two. The extractor turns a game's evaluated move
//! list into capped, difficulty-rated puzzle candidates.

pub mod attribution;
pub mod candidate;
pub mod config;
pub mod eval;
pub mod extract;
pub mod motifs;
