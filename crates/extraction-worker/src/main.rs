//! Extraction worker entry point.
//!
//! Reads evaluated games (one JSON file per game) from a directory, runs
//! the concurrent extraction pipeline against a pool of Stockfish
//! processes, and persists the surviving puzzles into the shared store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use extraction_worker::cache::PuzzleCache;
use extraction_worker::config::WorkerConfig;
use extraction_worker::error::WorkerError;
use extraction_worker::pipeline::ExtractionPipeline;
use extraction_worker::stockfish::StockfishEngine;
use extraction_worker::store::GlobalPuzzleStore;
use puzzle_miner::candidate::GameRecord;

/// Parse `--games <dir>` and `--user <name>` from the CLI args.
fn parse_args() -> (Option<PathBuf>, Option<String>) {
    let args: Vec<String> = std::env::args().collect();
    let mut games_dir = None;
    let mut user = None;
    for i in 0..args.len() {
        match args[i].as_str() {
            "--games" => games_dir = args.get(i + 1).map(PathBuf::from),
            "--user" => user = args.get(i + 1).cloned(),
            _ => {}
        }
    }
    (games_dir, user)
}

/// Load every `*.json` game file under `dir`. A file that fails to parse
/// is skipped with a warning; it never aborts the run.
fn load_games(dir: &Path) -> Result<Vec<GameRecord>, WorkerError> {
    let mut games = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    entries.sort();

    for path in entries {
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "unreadable game file, skipping");
                continue;
            }
        };
        match serde_json::from_str::<GameRecord>(&contents) {
            Ok(game) => games.push(game),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "invalid game file, skipping");
            }
        }
    }
    Ok(games)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let (games_dir, user) = parse_args();
    let games_dir = games_dir
        .ok_or_else(|| anyhow::anyhow!("usage: extraction-worker --games <dir> [--user <name>]"))?;
    let user = user.unwrap_or_else(|| "local".to_string());

    let config = WorkerConfig::load()?;
    info!(
        stockfish_path = %config.stockfish_path,
        workers = config.worker_count,
        batch_size = config.batch_size,
        "worker config loaded"
    );

    let games = load_games(&games_dir)?;
    if games.is_empty() {
        info!(dir = %games_dir.display(), "no games to process");
        return Ok(());
    }
    info!(games = games.len(), "games loaded");

    // One engine per worker; a handle is never shared.
    let mut engines = Vec::with_capacity(config.worker_count);
    for engine_id in 0..config.worker_count {
        let engine = StockfishEngine::new(&config.stockfish_path).await?;
        info!(engine_id, "engine ready");
        engines.push(engine);
    }

    let cache = Arc::new(PuzzleCache::new(
        config.cache_dir.clone(),
        config.cache_ttl_hours,
    ));
    let pipeline = ExtractionPipeline::new(config.batch_size, config.extractor_config());

    let puzzles = pipeline.run(games, engines, cache).await;

    let mut store = GlobalPuzzleStore::open(&config.store_dir)?;
    let new_count = store.save(&puzzles, &user)?;

    let stats = store.stats();
    info!(
        extracted = puzzles.len(),
        newly_stored = new_count,
        total_in_store = stats.puzzle_count,
        "run complete"
    );

    Ok(())
}
