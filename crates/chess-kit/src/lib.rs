//! Board-level building blocks for tactical analysis: attack geometry,
//! material accounting, piece-safety predicates, SAN/UCI notation and
//! game-phase classification. Everything here is a pure function over
//! `chess::Board` — no I/O, no engine.

pub use chess;

pub mod geometry;
pub mod material;
pub mod notation;
pub mod phase;
pub mod safety;
