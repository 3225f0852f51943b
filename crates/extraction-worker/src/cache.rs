//! Disk-backed memoization of per-game extraction results.
//!
//! One JSON file per game signature, written via temp-file + atomic
//! rename so concurrent writers can never leave a torn entry. Anything
//! unreadable, unparseable, mismatched or expired is simply a miss —
//! the pipeline always has a path to regenerate.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use puzzle_miner::candidate::Puzzle;

use crate::error::WorkerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub signature: String,
    pub created_at: DateTime<Utc>,
    pub puzzles: Vec<Puzzle>,
}

pub struct PuzzleCache {
    dir: PathBuf,
    ttl: Duration,
    write_seq: AtomicU64,
}

impl PuzzleCache {
    pub fn new(dir: PathBuf, ttl_hours: i64) -> Self {
        Self {
            dir,
            ttl: Duration::hours(ttl_hours),
            write_seq: AtomicU64::new(0),
        }
    }

    fn entry_path(&self, signature: &str) -> PathBuf {
        self.dir.join(format!("{signature}.json"))
    }

    /// Look up a fresh entry. Any defect — unreadable file, bad JSON,
    /// signature mismatch, expired timestamp — is a miss.
    pub fn lookup(&self, signature: &str) -> Option<Vec<Puzzle>> {
        let path = self.entry_path(signature);
        let contents = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "corrupt cache entry, treating as miss");
                return None;
            }
        };
        if entry.signature != signature {
            warn!(path = %path.display(), "cache entry signature mismatch, treating as miss");
            return None;
        }
        if Utc::now() - entry.created_at >= self.ttl {
            debug!(signature, "cache entry expired");
            return None;
        }
        Some(entry.puzzles)
    }

    /// Write an entry atomically (temp file, then rename into place).
    pub fn insert(&self, signature: &str, puzzles: &[Puzzle]) -> Result<(), WorkerError> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry {
            signature: signature.to_string(),
            created_at: Utc::now(),
            puzzles: puzzles.to_vec(),
        };
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{signature}.json.tmp.{}.{seq}", std::process::id()));
        std::fs::write(&tmp, serde_json::to_vec(&entry)?)?;
        std::fs::rename(&tmp, self.entry_path(signature))?;
        Ok(())
    }

    /// Return the cached result for `signature`, or run `compute`, cache
    /// its result and return it. A failed cache write degrades to a log
    /// line — the computed puzzles are still returned.
    pub async fn get_or_compute<F, Fut>(
        &self,
        signature: &str,
        compute: F,
    ) -> Result<Vec<Puzzle>, WorkerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Puzzle>, WorkerError>>,
    {
        if let Some(puzzles) = self.lookup(signature) {
            debug!(signature, "cache hit");
            return Ok(puzzles);
        }
        let puzzles = compute().await?;
        if let Err(error) = self.insert(signature, &puzzles) {
            warn!(signature, error = %error, "failed to write cache entry");
        }
        Ok(puzzles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_kit::phase::Phase;
    use puzzle_miner::candidate::{Difficulty, PuzzleType};

    fn puzzle(id: &str) -> Puzzle {
        Puzzle {
            puzzle_id: id.to_string(),
            fen: "8/8/8/8/8/8/8/K6k w - - 0 1".to_string(),
            best_move_san: "Ka2".to_string(),
            best_move_uci: "a1a2".to_string(),
            played_move_san: "Kb1".to_string(),
            eval_loss_cp: 200,
            phase: Phase::Endgame,
            puzzle_type: PuzzleType::EndgameTechnique,
            difficulty: Difficulty::Medium,
            tactical_patterns: None,
        }
    }

    #[tokio::test]
    async fn computes_once_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PuzzleCache::new(dir.path().to_path_buf(), 24);
        let mut calls = 0;

        let first = cache
            .get_or_compute("sig-a", || {
                calls += 1;
                async { Ok(vec![puzzle("p1"), puzzle("p2")]) }
            })
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(calls, 1);

        let second = cache
            .get_or_compute("sig-a", || {
                calls += 1;
                async { Ok(vec![]) }
            })
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(calls, 1, "compute must not run again on a fresh entry");
    }

    #[tokio::test]
    async fn different_signature_forces_recomputation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PuzzleCache::new(dir.path().to_path_buf(), 24);
        let mut calls = 0;

        for signature in ["sig-a", "sig-b"] {
            cache
                .get_or_compute(signature, || {
                    calls += 1;
                    async { Ok(vec![puzzle("p")]) }
                })
                .await
                .unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PuzzleCache::new(dir.path().to_path_buf(), 24);

        let stale = CacheEntry {
            signature: "sig-old".to_string(),
            created_at: Utc::now() - Duration::hours(25),
            puzzles: vec![puzzle("p")],
        };
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("sig-old.json"),
            serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();

        assert!(cache.lookup("sig-old").is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PuzzleCache::new(dir.path().to_path_buf(), 24);
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path().join("sig-bad.json"), b"{ not json").unwrap();
        assert!(cache.lookup("sig-bad").is_none());
    }

    #[test]
    fn mismatched_signature_inside_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PuzzleCache::new(dir.path().to_path_buf(), 24);
        cache.insert("sig-real", &[puzzle("p")]).unwrap();
        // Copy the entry under a different signature's filename.
        std::fs::copy(
            dir.path().join("sig-real.json"),
            dir.path().join("sig-fake.json"),
        )
        .unwrap();
        assert!(cache.lookup("sig-fake").is_none());
        assert!(cache.lookup("sig-real").is_some());
    }
}
