//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Observable state of a request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Handlers may still run and the response is not committed.
    Running,
    /// The writer was obtained; status, headers and cookies are fixed.
    Committed,
    /// The cursor hit the exit sentinel; no further handler runs.
    Exited,
    /// The chain is exhausted or short-circuited and the body is closed.
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Committed => "committed",
            Self::Exited => "exited",
            Self::Done => "done",
        }
    }
}

/// Timing marks for one request.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark; the first mark for a name wins.
    pub fn mark(&mut self, name: &str) {
        self.marks.entry(name.to_string()).or_insert_with(Instant::now);
    }

    /// Time from start to a mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Get time to commit.
    pub fn time_to_commit(&self) -> Option<Duration> {
        self.since_start("commit")
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_mark_wins() {
        let mut timing = TimingContext::new();
        timing.mark("commit");
        let first = timing.time_to_commit().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        timing.mark("commit");

        assert_eq!(timing.time_to_commit().unwrap(), first);
        assert!(timing.since_start("missing").is_none());
    }
}
