//! Extraction tunables. All thresholds are configuration with defaults,
//! not fixed contracts — tests should lean on ordering properties, not on
//! the exact numbers.

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Minimum centipawn loss for a move to become a candidate at all.
    pub min_loss_cp: i32,
    /// Loss at or above which a puzzle is rated Easy (an obvious blunder).
    pub easy_loss_cp: i32,
    /// Loss at or above which a puzzle is rated Medium.
    pub medium_loss_cp: i32,
    /// Minimum loss for an endgame-technique puzzle.
    pub endgame_min_loss_cp: i32,
    /// Fullmove number up to which an error counts as an opening error.
    pub opening_move_limit: u32,
    /// Combined non-pawn material at or below which a position counts as
    /// simplified for endgame-technique classification.
    pub simplification_material: i32,
    /// Hard cap on candidates kept per game.
    pub max_per_game: usize,
    /// Search depth for the forced-mate verification probe.
    pub max_lookahead_depth: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_loss_cp: 80,
            easy_loss_cp: 300,
            medium_loss_cp: 200,
            endgame_min_loss_cp: 100,
            opening_move_limit: 10,
            simplification_material: 6,
            max_per_game: 3,
            max_lookahead_depth: 12,
        }
    }
}
