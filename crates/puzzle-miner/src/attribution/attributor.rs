//! Two-phase attribution with an early-return priority order.
//!
//! Phase 1 decides final forced outcomes (immediate mate, engine-verified
//! forced mate, stalemate) and commits them through the consuming builder.
//! Phase 2 — mechanism classification — runs only when Phase 1 found
//! nothing, so a mating fork can never end up labeled "fork": by the time
//! motifs could claim the label, the outcome is already sealed and the
//! motifs land in `suppressed_patterns` instead.

use chess::{Board, BoardStatus, ChessMove, Color};
use tracing::debug;

use chess_kit::geometry::is_capture;

use crate::eval::Evaluator;
use crate::motifs::{self, Tier};

use super::mates;
use super::{AttributionBuilder, PatternAttribution, TerminalOutcome};

#[cfg(test)]
thread_local! {
    /// Test hook: how many times mechanism classification ran on this
    /// thread. Forced-mate fixtures must leave it untouched.
    pub(crate) static MECHANISM_RUNS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Classify what `best_move` achieves from `board`.
///
/// `best_move` must be legal in `board`. The function always returns a
/// valid attribution: evaluator failures during the forced-mate probe are
/// treated as "no mate found", never propagated.
pub async fn attribute<E: Evaluator>(
    board: &Board,
    best_move: ChessMove,
    evaluator: &mut E,
    max_lookahead_depth: u32,
) -> PatternAttribution {
    let mover = board.side_to_move();
    let after = board.make_move_new(best_move);

    // Phase 1: final outcomes, each committing and returning immediately.
    if after.status() == BoardStatus::Checkmate {
        return terminal(
            board,
            best_move,
            &after,
            mover,
            TerminalOutcome::Checkmate {
                pattern: mates::mate_pattern(&after, mover),
                mate_in: 1,
            },
        );
    }

    if let Some(distance) = forced_mate_distance(evaluator, &after, max_lookahead_depth).await {
        return terminal(
            board,
            best_move,
            &after,
            mover,
            TerminalOutcome::Checkmate {
                pattern: None,
                mate_in: distance + 1,
            },
        );
    }

    if mates::is_stalemate(&after) {
        return terminal(board, best_move, &after, mover, TerminalOutcome::StalemateTrap);
    }

    // Phase 2: no forced ending — the mechanisms carry the classification.
    classify_mechanisms(board, best_move, &after, mover)
}

/// Commit a terminal outcome. The motif sweep still runs so the detected
/// mechanisms are preserved as suppressed, explanatory evidence, but it
/// happens against an already-decided outcome: the builder is consumed
/// here and `classify_mechanisms` is never reached.
fn terminal(
    board: &Board,
    best_move: ChessMove,
    after: &Board,
    mover: Color,
    outcome: TerminalOutcome,
) -> PatternAttribution {
    let suppressed = motifs::sweep(board, best_move, after, mover)
        .into_iter()
        .map(|evidence| evidence.motif)
        .collect();
    AttributionBuilder::new().commit_terminal(outcome, suppressed)
}

/// Ask the engine whether the side to move in `after` is getting mated.
/// Positive mate favors the side to move, so a mate *against* them —
/// i.e. for the mover — shows up negative.
async fn forced_mate_distance<E: Evaluator>(
    evaluator: &mut E,
    after: &Board,
    depth: u32,
) -> Option<u32> {
    match evaluator.evaluate(&after.to_string(), depth).await {
        Ok(evaluation) => match evaluation.mate_in {
            Some(mate) if mate < 0 => Some(mate.unsigned_abs()),
            _ => None,
        },
        Err(error) => {
            debug!(error = %error, "forced-mate probe inconclusive");
            None
        }
    }
}

fn classify_mechanisms(
    board: &Board,
    best_move: ChessMove,
    after: &Board,
    mover: Color,
) -> PatternAttribution {
    #[cfg(test)]
    MECHANISM_RUNS.with(|runs| runs.set(runs.get() + 1));

    let evidence = motifs::sweep(board, best_move, after, mover);
    let composite = evidence.first().map(|e| e.motif);

    let mut builder = AttributionBuilder::new();
    for item in &evidence {
        match item.tier() {
            Tier::Primary => builder.push_primary(item.constraint()),
            Tier::Secondary => builder.push_secondary(item.constraint()),
        }
    }
    builder.finish(composite, is_capture(board, best_move))
}
