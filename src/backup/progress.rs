//! Progress reporting for long-running archive work

use std::fmt;
use std::time::{Duration, Instant};

/// Phase of an export or restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    WritingImages,
    ReadingImages,
    Reconciling,
    WritingTrades,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::WritingImages => write!(f, "Archiving images"),
            Stage::ReadingImages => write!(f, "Decoding images"),
            Stage::Reconciling => write!(f, "Matching images to trades"),
            Stage::WritingTrades => write!(f, "Restoring trades"),
        }
    }
}

/// A progress update
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
    /// Estimated time left, once throughput is known
    pub eta: Option<Duration>,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.done as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.stage, self.done, self.total)?;
        if let Some(eta) = self.eta {
            write!(f, " (about {}s left)", eta.as_secs_f64().ceil() as u64)?;
        }
        Ok(())
    }
}

/// Receives progress updates
pub trait ProgressReporter {
    fn report(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressReporter for F {
    fn report(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Discards every update
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _progress: &Progress) {}
}

/// Estimates time left from observed throughput
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    started: Instant,
}

impl Throughput {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time left to finish `total` items after `done` were processed
    pub fn eta(&self, done: usize, total: usize) -> Option<Duration> {
        estimate(self.started.elapsed(), done, total)
    }

    /// Build a progress update for `stage`
    pub fn progress(&self, stage: Stage, done: usize, total: usize) -> Progress {
        Progress {
            stage,
            done,
            total,
            eta: self.eta(done, total),
        }
    }
}

fn estimate(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 || done >= total {
        return None;
    }
    let per_item = elapsed.as_secs_f64() / done as f64;
    Some(Duration::from_secs_f64(per_item * (total - done) as f64))
}
