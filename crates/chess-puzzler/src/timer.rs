//! Per-session stopwatch with an optional countdown limit.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct PuzzleTimer {
    started: Instant,
    limit: Option<Duration>,
}

impl PuzzleTimer {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left on the countdown, saturating at zero. `None` without a limit.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed()))
    }

    pub fn is_time_up(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }
}

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(d: Duration) -> String {
    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
