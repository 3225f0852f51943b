//! Per-game puzzle extraction: cheap pre-filter, deterministic type and
//! difficulty classification, tactical attribution, and a per-game cap.

use std::str::FromStr;

use chess::Board;
use tracing::{debug, warn};

use chess_kit::notation::{parse_uci, to_san};
use chess_kit::phase::{self, Phase};
use chess_kit::material::non_pawn_total;

use crate::attribution::attribute;
use crate::candidate::{Difficulty, GameRecord, PuzzleCandidate, PuzzleType, ScoredMove};
use crate::config::ExtractorConfig;
use crate::eval::Evaluator;

pub struct PuzzleExtractor {
    config: ExtractorConfig,
}

impl PuzzleExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract puzzle candidates from one game. A malformed FEN or illegal
    /// move skips that single candidate — never the rest of the game.
    pub async fn extract<E: Evaluator>(
        &self,
        game: &GameRecord,
        evaluator: &mut E,
    ) -> Vec<PuzzleCandidate> {
        let mut candidates = Vec::new();

        for scored in &game.moves {
            // Cheap rejection before any board or engine work.
            if scored.eval_loss_cp < self.config.min_loss_cp {
                continue;
            }
            if let Some(candidate) = self.build_candidate(game, scored, evaluator).await {
                candidates.push(candidate);
            }
        }

        // Keep the worst misses; earlier moves win ties.
        candidates.sort_by(|a, b| {
            b.eval_loss_cp
                .cmp(&a.eval_loss_cp)
                .then(a.move_number.cmp(&b.move_number))
        });
        candidates.truncate(self.config.max_per_game);

        debug!(
            game_id = %game.game_id,
            kept = candidates.len(),
            "extraction finished"
        );
        candidates
    }

    async fn build_candidate<E: Evaluator>(
        &self,
        game: &GameRecord,
        scored: &ScoredMove,
        evaluator: &mut E,
    ) -> Option<PuzzleCandidate> {
        let board = match Board::from_str(&scored.fen_before) {
            Ok(board) => board,
            Err(error) => {
                warn!(
                    game_id = %game.game_id,
                    move_number = scored.move_number,
                    error = %error,
                    "skipping candidate with invalid FEN"
                );
                return None;
            }
        };

        let best_move = match parse_uci(&scored.best_move_uci) {
            Some(mv) if board.legal(mv) => mv,
            _ => {
                warn!(
                    game_id = %game.game_id,
                    move_number = scored.move_number,
                    best_move = %scored.best_move_uci,
                    "skipping candidate with illegal best move"
                );
                return None;
            }
        };

        let phase = phase::classify(&board, scored.move_number);
        let puzzle_type = self.classify_type(&board, scored, phase);

        let mut difficulty = Difficulty::from_loss(scored.eval_loss_cp, &self.config);
        if phase == Phase::Endgame {
            difficulty = difficulty.harder();
        }

        let tactical_patterns = Some(
            attribute(
                &board,
                best_move,
                evaluator,
                self.config.max_lookahead_depth,
            )
            .await,
        );

        Some(PuzzleCandidate {
            move_number: scored.move_number,
            fen_before: scored.fen_before.clone(),
            played_move_san: scored.played_san.clone(),
            played_move_uci: scored.played_uci.clone(),
            best_move_san: to_san(&board, best_move),
            best_move_uci: scored.best_move_uci.clone(),
            eval_loss_cp: scored.eval_loss_cp,
            phase,
            puzzle_type,
            difficulty,
            tactical_patterns,
        })
    }

    fn classify_type(&self, board: &Board, scored: &ScoredMove, phase: Phase) -> PuzzleType {
        if phase == Phase::Opening && scored.move_number <= self.config.opening_move_limit {
            PuzzleType::OpeningError
        } else if phase == Phase::Endgame
            && non_pawn_total(board) <= self.config.simplification_material
            && scored.eval_loss_cp >= self.config.endgame_min_loss_cp
        {
            PuzzleType::EndgameTechnique
        } else {
            PuzzleType::MissedTactic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalError, Evaluation};

    struct NoMate;

    impl Evaluator for NoMate {
        async fn evaluate(&mut self, _fen: &str, _depth: u32) -> Result<Evaluation, EvalError> {
            Ok(Evaluation {
                best_move_uci: String::new(),
                score_cp: 30,
                mate_in: None,
            })
        }
    }

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const MIDGAME_FEN: &str =
        "r1bq1rk1/pp2ppbp/2np1np1/8/2BNP3/2N1B3/PPP2PPP/R2Q1RK1 w - - 0 11";
    const ENDGAME_FEN: &str = "8/4k3/4p3/8/3PK3/8/8/8 w - - 0 41";

    fn scored(move_number: u32, fen: &str, best: &str, loss: i32) -> ScoredMove {
        ScoredMove {
            move_number,
            played_san: "?".to_string(),
            played_uci: format!("m{move_number}"),
            fen_before: fen.to_string(),
            best_move_uci: best.to_string(),
            eval_loss_cp: loss,
        }
    }

    fn game(moves: Vec<ScoredMove>) -> GameRecord {
        GameRecord {
            game_id: "test-game".to_string(),
            moves,
        }
    }

    #[tokio::test]
    async fn keeps_the_worst_three_misses() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![
            scored(5, MIDGAME_FEN, "d4f5", 400),
            scored(8, MIDGAME_FEN, "d4f5", 150),
            scored(12, MIDGAME_FEN, "d4f5", 350),
            scored(15, MIDGAME_FEN, "d4f5", 90),
            scored(20, MIDGAME_FEN, "d4f5", 500),
        ]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        let losses: Vec<i32> = candidates.iter().map(|c| c.eval_loss_cp).collect();
        assert_eq!(losses, vec![500, 400, 350]);
    }

    #[tokio::test]
    async fn ties_break_toward_the_earlier_move() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![
            scored(9, MIDGAME_FEN, "d4f5", 300),
            scored(3, MIDGAME_FEN, "d4f5", 300),
            scored(6, MIDGAME_FEN, "d4f5", 300),
            scored(12, MIDGAME_FEN, "d4f5", 300),
        ]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        let moves: Vec<u32> = candidates.iter().map(|c| c.move_number).collect();
        assert_eq!(moves, vec![3, 6, 9]);
    }

    #[tokio::test]
    async fn below_threshold_moves_are_never_candidates() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![scored(5, MIDGAME_FEN, "d4f5", 79)]);
        assert!(extractor.extract(&game, &mut NoMate).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_fen_skips_only_that_candidate() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![
            scored(5, "definitely not a fen", "d4f5", 400),
            scored(8, MIDGAME_FEN, "d4f5", 300),
            scored(9, MIDGAME_FEN, "h9z1", 300), // unparseable best move
        ]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].move_number, 8);
    }

    #[tokio::test]
    async fn early_opening_errors_are_typed_as_such() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![scored(3, START_FEN, "e2e4", 250)]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        assert_eq!(candidates[0].puzzle_type, PuzzleType::OpeningError);
        assert_eq!(candidates[0].difficulty, Difficulty::Medium);
    }

    #[tokio::test]
    async fn simplified_endgames_are_technique_puzzles_and_bumped_harder() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![scored(41, ENDGAME_FEN, "e4e5", 350)]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        assert_eq!(candidates[0].puzzle_type, PuzzleType::EndgameTechnique);
        assert_eq!(candidates[0].phase, Phase::Endgame);
        // 350cp would be Easy; the endgame bump makes it Medium.
        assert_eq!(candidates[0].difficulty, Difficulty::Medium);
    }

    #[tokio::test]
    async fn midgame_captures_default_to_missed_tactic() {
        let extractor = PuzzleExtractor::new(ExtractorConfig::default());
        let game = game(vec![scored(15, MIDGAME_FEN, "d4f5", 220)]);
        let candidates = extractor.extract(&game, &mut NoMate).await;
        assert_eq!(candidates[0].puzzle_type, PuzzleType::MissedTactic);
    }
}
