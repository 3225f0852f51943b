//! Concurrent fan-out of per-game extraction over a fixed worker pool.
//!
//! Games are partitioned into fixed-size batches and dealt round-robin to
//! the workers; each worker exclusively owns one evaluator handle for its
//! whole lifetime. A batch either completes or contributes nothing — a
//! failed batch is logged and discarded, never half-written. Puzzle order
//! within one game is deterministic; order across games is not part of
//! the contract.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

use puzzle_miner::candidate::{game_signature, GameRecord, Puzzle};
use puzzle_miner::config::ExtractorConfig;
use puzzle_miner::eval::Evaluator;
use puzzle_miner::extract::PuzzleExtractor;

use crate::cache::PuzzleCache;
use crate::error::WorkerError;

pub struct ExtractionPipeline {
    batch_size: usize,
    extractor_config: ExtractorConfig,
}

impl ExtractionPipeline {
    pub fn new(batch_size: usize, extractor_config: ExtractorConfig) -> Self {
        Self {
            batch_size: batch_size.max(1),
            extractor_config,
        }
    }

    /// Process `games` across one worker per evaluator handle.
    pub async fn run<E>(
        &self,
        games: Vec<GameRecord>,
        evaluators: Vec<E>,
        cache: Arc<PuzzleCache>,
    ) -> Vec<Puzzle>
    where
        E: Evaluator + Send + 'static,
    {
        let worker_count = evaluators.len();
        if worker_count == 0 {
            error!("no evaluators supplied, nothing to run");
            return Vec::new();
        }

        let game_count = games.len();
        let batches = partition(games, self.batch_size);
        let batch_count = batches.len();

        // Deal batches round-robin so the assignment is deterministic for
        // a given worker count.
        let mut per_worker: Vec<Vec<Vec<GameRecord>>> =
            (0..worker_count).map(|_| Vec::new()).collect();
        for (index, batch) in batches.into_iter().enumerate() {
            per_worker[index % worker_count].push(batch);
        }

        info!(
            games = game_count,
            batches = batch_count,
            workers = worker_count,
            "starting extraction"
        );

        let handles: Vec<_> = evaluators
            .into_iter()
            .zip(per_worker)
            .enumerate()
            .map(|(worker_id, (evaluator, batches))| {
                let cache = Arc::clone(&cache);
                let config = self.extractor_config.clone();
                tokio::spawn(run_worker(worker_id, evaluator, batches, cache, config))
            })
            .collect();

        let mut puzzles = Vec::new();
        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(worker_puzzles) => puzzles.extend(worker_puzzles),
                Err(join_error) => {
                    error!(worker_id, error = %join_error, "worker crashed; its batches are discarded");
                }
            }
        }

        info!(puzzles = puzzles.len(), "extraction complete");
        puzzles
    }
}

fn partition(games: Vec<GameRecord>, batch_size: usize) -> Vec<Vec<GameRecord>> {
    let mut batches = Vec::new();
    let mut current = Vec::with_capacity(batch_size);
    for game in games {
        current.push(game);
        if current.len() == batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

async fn run_worker<E: Evaluator>(
    worker_id: usize,
    mut evaluator: E,
    batches: Vec<Vec<GameRecord>>,
    cache: Arc<PuzzleCache>,
    config: ExtractorConfig,
) -> Vec<Puzzle> {
    let extractor = PuzzleExtractor::new(config);
    let mut puzzles = Vec::new();

    for batch in batches {
        match run_batch(&extractor, &mut evaluator, &batch, &cache).await {
            Ok(batch_puzzles) => puzzles.extend(batch_puzzles),
            Err(err) => {
                error!(worker_id, error = %err, "batch failed; discarding its results");
            }
        }
    }
    puzzles
}

async fn run_batch<E: Evaluator>(
    extractor: &PuzzleExtractor,
    evaluator: &mut E,
    batch: &[GameRecord],
    cache: &PuzzleCache,
) -> Result<Vec<Puzzle>, WorkerError> {
    let mut puzzles = Vec::new();
    for game in batch {
        let signature = game_signature(&game.moves);
        // Fresh reborrow per game so the compute future can own it.
        let engine = &mut *evaluator;
        let game_puzzles = cache
            .get_or_compute(&signature, move || async move {
                let candidates = extractor.extract(game, engine).await;
                Ok(candidates
                    .into_iter()
                    .map(|candidate| Puzzle::from_candidate(&game.game_id, candidate))
                    .collect())
            })
            .await?;
        puzzles.extend(game_puzzles);
    }
    Ok(puzzles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzle_miner::candidate::ScoredMove;
    use puzzle_miner::eval::{EvalError, Evaluation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEvaluator {
        calls: Arc<AtomicUsize>,
    }

    impl Evaluator for CountingEvaluator {
        async fn evaluate(&mut self, _fen: &str, _depth: u32) -> Result<Evaluation, EvalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Evaluation {
                best_move_uci: String::new(),
                score_cp: 20,
                mate_in: None,
            })
        }
    }

    const FEN: &str = "r1bq1rk1/pp2ppbp/2np1np1/8/2BNP3/2N1B3/PPP2PPP/R2Q1RK1 w - - 0 11";

    fn game(id: &str, losses: &[i32]) -> GameRecord {
        GameRecord {
            game_id: id.to_string(),
            moves: losses
                .iter()
                .enumerate()
                .map(|(i, &loss)| ScoredMove {
                    move_number: (i + 11) as u32,
                    played_san: "?".to_string(),
                    played_uci: format!("{id}-{i}"),
                    fen_before: FEN.to_string(),
                    best_move_uci: "d4f5".to_string(),
                    eval_loss_cp: loss,
                })
                .collect(),
        }
    }

    fn evaluators(n: usize, calls: &Arc<AtomicUsize>) -> Vec<CountingEvaluator> {
        (0..n)
            .map(|_| CountingEvaluator {
                calls: Arc::clone(calls),
            })
            .collect()
    }

    #[tokio::test]
    async fn every_game_is_processed_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(PuzzleCache::new(dir.path().to_path_buf(), 24));
        let pipeline = ExtractionPipeline::new(2, ExtractorConfig::default());

        let games: Vec<GameRecord> = (0..5)
            .map(|i| game(&format!("g{i}"), &[300, 150]))
            .collect();
        let calls = Arc::new(AtomicUsize::new(0));

        let puzzles = pipeline
            .run(games, evaluators(3, &calls), Arc::clone(&cache))
            .await;

        // Two candidates per game survive the threshold.
        assert_eq!(puzzles.len(), 10);
        for i in 0..5 {
            let per_game = puzzles
                .iter()
                .filter(|p| p.puzzle_id.starts_with(&format!("g{i}_")))
                .count();
            assert_eq!(per_game, 2, "game g{i} processed exactly once");
        }
    }

    #[tokio::test]
    async fn rerun_with_warm_cache_skips_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(PuzzleCache::new(dir.path().to_path_buf(), 24));
        let pipeline = ExtractionPipeline::new(4, ExtractorConfig::default());

        let games: Vec<GameRecord> =
            (0..4).map(|i| game(&format!("g{i}"), &[250])).collect();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = pipeline
            .run(games.clone(), evaluators(2, &calls), Arc::clone(&cache))
            .await;
        let calls_after_first = calls.load(Ordering::SeqCst);
        assert!(calls_after_first > 0);

        let second = pipeline
            .run(games, evaluators(2, &calls), Arc::clone(&cache))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn per_game_puzzle_order_is_deterministic() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let pipeline = ExtractionPipeline::new(1, ExtractorConfig::default());
        let games: Vec<GameRecord> = vec![game("g0", &[120, 500, 90, 300, 450])];
        let calls = Arc::new(AtomicUsize::new(0));

        let run_a = pipeline
            .run(
                games.clone(),
                evaluators(1, &calls),
                Arc::new(PuzzleCache::new(dir_a.path().to_path_buf(), 24)),
            )
            .await;
        let run_b = pipeline
            .run(
                games,
                evaluators(1, &calls),
                Arc::new(PuzzleCache::new(dir_b.path().to_path_buf(), 24)),
            )
            .await;

        let ids_a: Vec<&str> = run_a.iter().map(|p| p.puzzle_id.as_str()).collect();
        let ids_b: Vec<&str> = run_b.iter().map(|p| p.puzzle_id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        // Worst miss first, capped at three.
        assert_eq!(run_a[0].eval_loss_cp, 500);
        assert_eq!(run_a.len(), 3);
    }
}
