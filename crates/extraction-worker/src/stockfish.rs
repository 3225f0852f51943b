//! Stockfish engine wrapper using the UCI protocol (async I/O).
//!
//! One process per handle; a handle is exclusively owned by one worker —
//! concurrent `go` commands on a single engine are undefined behavior.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use puzzle_miner::eval::{EvalError, Evaluation, Evaluator};

use crate::error::WorkerError;

/// Centipawn magnitude used to fold mate scores into the score field.
const MATE_SCORE: i32 = 10_000;

pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a Stockfish process and run the UCI handshake.
    pub async fn new(path: &str) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::Engine(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Engine("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Engine("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("setoption name Threads value 1").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| WorkerError::Engine(format!("Failed to read from Stockfish: {e}")))?;
            if read == 0 {
                return Err(WorkerError::Engine("Stockfish closed its pipe".into()));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    async fn search(&mut self, fen: &str, depth: u32) -> Result<Evaluation, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut cp: Option<i32> = None;
        let mut mate: Option<i32> = None;
        let mut best_move = String::new();

        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| WorkerError::Engine(format!("Failed to read from Stockfish: {e}")))?;
            if read == 0 {
                return Err(WorkerError::Engine("Stockfish closed its pipe".into()));
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if let Some(score) = parse_cp(trimmed) {
                    cp = Some(score);
                    mate = None;
                }
                if let Some(distance) = parse_mate(trimmed) {
                    mate = Some(distance);
                    cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                if let Some(mv) = trimmed.split_whitespace().nth(1) {
                    best_move = mv.to_string();
                }
                break;
            }
        }

        let score_cp = match (cp, mate) {
            (Some(score), _) => score,
            (None, Some(m)) if m > 0 => MATE_SCORE - m * 10,
            (None, Some(m)) => -MATE_SCORE - m * 10,
            (None, None) => 0,
        };

        Ok(Evaluation {
            best_move_uci: best_move,
            score_cp,
            mate_in: mate,
        })
    }

    /// Send quit and wait for the process to exit.
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Evaluator for StockfishEngine {
    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<Evaluation, EvalError> {
        self.search(fen, depth)
            .await
            .map_err(|e| EvalError::Unavailable(e.to_string()))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill.
        let _ = self.process.start_kill();
    }
}

/// Parse "score cp N" from an info line.
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .iter()
        .position(|&p| p == "cp")
        .and_then(|i| parts.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Parse "score mate N" from an info line.
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .iter()
        .position(|&p| p == "mate")
        .and_then(|i| parts.get(i + 1))
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_centipawn_score() {
        let line = "info depth 12 seldepth 16 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_mate(line), None);
    }

    #[test]
    fn parses_mate_score() {
        let line = "info depth 12 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(-3));
        assert_eq!(parse_cp(line), None);
    }

    #[test]
    fn parses_negative_centipawns() {
        let line = "info depth 8 score cp -210 pv d2d4";
        assert_eq!(parse_cp(line), Some(-210));
    }
}
