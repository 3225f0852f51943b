//! Worker configuration from environment variables.

use std::env;
use std::path::PathBuf;

use puzzle_miner::config::ExtractorConfig;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Path to the Stockfish binary.
    pub stockfish_path: String,

    /// Number of extraction workers, each owning one engine process.
    /// Set WORKER_COUNT=0 to use one worker per CPU.
    pub worker_count: usize,

    /// Games per batch handed to a worker.
    pub batch_size: usize,

    /// Directory for per-game cache entries.
    pub cache_dir: PathBuf,

    /// Directory for the append-only puzzle and rating logs.
    pub store_dir: PathBuf,

    /// Cache entry lifetime in hours.
    pub cache_ttl_hours: i64,

    /// Search depth for the forced-mate verification probe.
    pub lookahead_depth: u32,

    /// Minimum centipawn loss for a move to become a puzzle candidate.
    pub min_loss_cp: i32,

    /// Cap on puzzles kept per game.
    pub max_per_game: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    pub fn load() -> Result<Self, WorkerError> {
        let stockfish_path =
            env::var("STOCKFISH_PATH").unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let worker_count: usize = env::var("WORKER_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);
        let worker_count = if worker_count == 0 {
            num_cpus::get()
        } else {
            worker_count
        };

        let batch_size = env::var("BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(8);

        let cache_dir = env::var("PUZZLE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".puzzle-cache"));

        let store_dir = env::var("PUZZLE_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".puzzle-store"));

        let cache_ttl_hours = env::var("CACHE_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        let lookahead_depth = env::var("LOOKAHEAD_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(12);

        let min_loss_cp = env::var("MIN_LOSS_CP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(80);

        let max_per_game = env::var("MAX_PUZZLES_PER_GAME")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(3);

        Ok(Self {
            stockfish_path,
            worker_count,
            batch_size,
            cache_dir,
            store_dir,
            cache_ttl_hours,
            lookahead_depth,
            min_loss_cp,
            max_per_game,
        })
    }

    /// Extraction tunables derived from this config.
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            min_loss_cp: self.min_loss_cp,
            max_per_game: self.max_per_game,
            max_lookahead_depth: self.lookahead_depth,
            ..ExtractorConfig::default()
        }
    }
}
