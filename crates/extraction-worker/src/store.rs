//! Cross-user puzzle store: append-only JSONL logs with an in-memory
//! index rebuilt on open.
//!
//! `puzzles.jsonl` holds one record per line: the first writer of a
//! puzzle key contributes the full puzzle payload, later writers of the
//! same key contribute provenance-only records (`puzzle: null`). Ratings
//! live in `ratings.jsonl`; the displayed counts are a projection of that
//! log and can always be rebuilt. Readers skip corrupt lines and discard
//! a partially-written final line — only failing to open the store at
//! all is fatal.

use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chess_kit::phase::Phase;
use puzzle_miner::candidate::{Puzzle, PuzzleType};

use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Like,
    Meh,
    Dislike,
}

/// Aggregate of community votes for one puzzle. Derived, recomputable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub likes: u32,
    pub mehs: u32,
    pub dislikes: u32,
}

impl RatingCounts {
    pub fn score(&self) -> i32 {
        self.likes as i32 - self.dislikes as i32
    }

    fn apply(&mut self, rating: Rating) {
        match rating {
            Rating::Like => self.likes += 1,
            Rating::Meh => self.mehs += 1,
            Rating::Dislike => self.dislikes += 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PuzzleLogRecord {
    puzzle_key: String,
    source_user: String,
    timestamp: DateTime<Utc>,
    /// Full payload for the first writer; `null` for provenance-only rows.
    #[serde(default)]
    puzzle: Option<Puzzle>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RatingLogRecord {
    puzzle_key: String,
    user: String,
    rating: Rating,
    timestamp: DateTime<Utc>,
}

/// A stored puzzle with its provenance and current rating projection.
#[derive(Debug, Clone)]
pub struct StoredPuzzle {
    pub puzzle: Puzzle,
    pub source_user: String,
    pub first_seen: DateTime<Utc>,
    pub ratings: RatingCounts,
}

/// Composable AND filters for [`GlobalPuzzleStore::load`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleFilter {
    pub min_loss_cp: Option<i32>,
    pub phase: Option<Phase>,
    pub puzzle_type: Option<PuzzleType>,
}

impl PuzzleFilter {
    fn matches(&self, puzzle: &Puzzle) -> bool {
        self.min_loss_cp.is_none_or(|min| puzzle.eval_loss_cp >= min)
            && self.phase.is_none_or(|phase| puzzle.phase == phase)
            && self
                .puzzle_type
                .is_none_or(|kind| puzzle.puzzle_type == kind)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SortBy {
    RatingScore,
    Difficulty,
    Recency,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub puzzle_count: usize,
    pub provenance_count: usize,
    pub rating_count: usize,
}

pub struct GlobalPuzzleStore {
    puzzle_log: PathBuf,
    rating_log: PathBuf,
    /// Insertion-ordered puzzles; `index` maps key → position here.
    puzzles: Vec<StoredPuzzle>,
    index: HashMap<String, usize>,
    /// Users already recorded as sources per key.
    sources: HashMap<String, HashSet<String>>,
    rating_count: usize,
    provenance_count: usize,
}

impl GlobalPuzzleStore {
    /// Open (or create) the store under `dir`, replaying both logs.
    /// This is the one operation allowed to fail hard.
    pub fn open(dir: &Path) -> Result<Self, WorkerError> {
        std::fs::create_dir_all(dir)?;
        let puzzle_log = dir.join("puzzles.jsonl");
        let rating_log = dir.join("ratings.jsonl");

        let mut store = Self {
            puzzle_log: puzzle_log.clone(),
            rating_log: rating_log.clone(),
            puzzles: Vec::new(),
            index: HashMap::new(),
            sources: HashMap::new(),
            rating_count: 0,
            provenance_count: 0,
        };

        for record in read_log::<PuzzleLogRecord>(&puzzle_log) {
            store.replay_puzzle_record(record);
        }
        for record in read_log::<RatingLogRecord>(&rating_log) {
            store.replay_rating_record(record);
        }

        info!(
            puzzles = store.puzzles.len(),
            ratings = store.rating_count,
            "puzzle store opened"
        );
        Ok(store)
    }

    fn replay_puzzle_record(&mut self, record: PuzzleLogRecord) {
        self.provenance_count += 1;
        self.sources
            .entry(record.puzzle_key.clone())
            .or_default()
            .insert(record.source_user.clone());

        let Some(puzzle) = record.puzzle else {
            return;
        };
        // First full payload for a key wins; replays of later duplicates
        // (possible after concurrent appends) change nothing.
        if self.index.contains_key(&record.puzzle_key) {
            return;
        }
        self.index
            .insert(record.puzzle_key.clone(), self.puzzles.len());
        self.puzzles.push(StoredPuzzle {
            puzzle,
            source_user: record.source_user,
            first_seen: record.timestamp,
            ratings: RatingCounts::default(),
        });
    }

    fn replay_rating_record(&mut self, record: RatingLogRecord) {
        self.rating_count += 1;
        if let Some(&pos) = self.index.get(&record.puzzle_key) {
            self.puzzles[pos].ratings.apply(record.rating);
        }
    }

    /// Persist puzzles for `source_user`. Returns how many were new;
    /// already-known keys only gain provenance.
    pub fn save(&mut self, puzzles: &[Puzzle], source_user: &str) -> Result<usize, WorkerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.puzzle_log)?;

        let mut new_count = 0;
        for puzzle in puzzles {
            let key = puzzle.key();
            let is_new = !self.index.contains_key(&key);
            if !is_new {
                let known = self
                    .sources
                    .get(&key)
                    .is_some_and(|users| users.contains(source_user));
                if known {
                    continue;
                }
            }

            let record = PuzzleLogRecord {
                puzzle_key: key,
                source_user: source_user.to_string(),
                timestamp: Utc::now(),
                puzzle: is_new.then(|| puzzle.clone()),
            };
            append_line(&mut file, &record)?;
            self.replay_puzzle_record(record);
            if is_new {
                new_count += 1;
            }
        }
        file.flush()?;
        Ok(new_count)
    }

    /// Append one community rating. The log is authoritative; the counts
    /// update incrementally.
    pub fn record_rating(
        &mut self,
        puzzle_key: &str,
        rating: Rating,
        user: &str,
    ) -> Result<(), WorkerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.rating_log)?;
        let record = RatingLogRecord {
            puzzle_key: puzzle_key.to_string(),
            user: user.to_string(),
            rating,
            timestamp: Utc::now(),
        };
        append_line(&mut file, &record)?;
        file.flush()?;
        self.replay_rating_record(record);
        Ok(())
    }

    /// Filtered, sorted view of the stored puzzles.
    pub fn load(&self, filter: &PuzzleFilter, sort: SortBy, limit: usize) -> Vec<StoredPuzzle> {
        let mut matches: Vec<StoredPuzzle> = self
            .puzzles
            .iter()
            .filter(|stored| filter.matches(&stored.puzzle))
            .cloned()
            .collect();

        match sort {
            SortBy::RatingScore => {
                matches.sort_by_key(|stored| std::cmp::Reverse(stored.ratings.score()))
            }
            SortBy::Difficulty => {
                matches.sort_by_key(|stored| std::cmp::Reverse(stored.puzzle.difficulty))
            }
            SortBy::Recency => matches.sort_by_key(|stored| std::cmp::Reverse(stored.first_seen)),
        }
        matches.truncate(limit);
        matches
    }

    pub fn rating_counts(&self, puzzle_key: &str) -> RatingCounts {
        self.index
            .get(puzzle_key)
            .map(|&pos| self.puzzles[pos].ratings)
            .unwrap_or_default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            puzzle_count: self.puzzles.len(),
            provenance_count: self.provenance_count,
            rating_count: self.rating_count,
        }
    }
}

fn append_line<T: Serialize>(file: &mut std::fs::File, record: &T) -> Result<(), WorkerError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    // One write per record keeps concurrent appends line-atomic on
    // ordinary filesystems.
    file.write_all(&line)?;
    Ok(())
}

/// Read an append-only JSONL log leniently: a missing file is an empty
/// log, corrupt interior lines are skipped with a warning, and a
/// truncated final line (no trailing newline from an interrupted writer)
/// is silently discarded.
fn read_log<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return Vec::new(),
    };

    let complete = match contents.rfind('\n') {
        Some(last) => &contents[..=last],
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for (lineno, line) in complete.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    error = %error,
                    "skipping corrupt log line"
                );
            }
        }
    }
    records
}
