use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Per-angle timing and attempt bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleStats {
    pub attempts: u32,
    /// Start of the attempt currently being timed
    #[serde(skip)]
    pub started_at: Option<Instant>,
    pub time_spent: Duration,
    pub completed: bool,
}

impl AngleStats {
    /// Start (or restart) timing. Any stale start time is overwritten.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    pub fn record_attempt(&mut self, successful: bool, now: Instant) {
        self.attempts = self.attempts.saturating_add(1);
        if let Some(start) = self.started_at {
            self.time_spent += now.saturating_duration_since(start);
        }
        if successful {
            self.completed = true;
            self.started_at = None;
        } else {
            // Next attempt is measured from this failure, not the original start.
            self.started_at = Some(now);
        }
    }

    pub fn is_timing(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time spent including the attempt in progress
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.time_spent
            + self
                .started_at
                .map(|start| now.saturating_duration_since(start))
                .unwrap_or_default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_attempt_accumulates_and_completes() {
        let t0 = Instant::now();
        let mut stats = AngleStats::default();
        stats.start(t0);
        stats.record_attempt(true, t0 + Duration::from_secs(4));
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.time_spent, Duration::from_secs(4));
        assert!(stats.completed);
        assert!(!stats.is_timing());
    }

    #[test]
    fn test_failed_attempt_restarts_timer() {
        let t0 = Instant::now();
        let mut stats = AngleStats::default();
        stats.start(t0);
        stats.record_attempt(false, t0 + Duration::from_secs(2));
        assert_eq!(stats.started_at, Some(t0 + Duration::from_secs(2)));
        stats.record_attempt(true, t0 + Duration::from_secs(5));
        assert_eq!(stats.attempts, 2);
        // 2s for the first attempt, 3s for the second; no double counting.
        assert_eq!(stats.time_spent, Duration::from_secs(5));
    }

    #[test]
    fn test_attempt_without_start_adds_no_time() {
        let mut stats = AngleStats::default();
        stats.record_attempt(false, Instant::now());
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.time_spent, Duration::ZERO);
        assert!(stats.is_timing());
    }

    #[test]
    fn test_restart_overwrites_stale_start() {
        let t0 = Instant::now();
        let mut stats = AngleStats::default();
        stats.start(t0);
        stats.start(t0 + Duration::from_secs(10));
        stats.record_attempt(true, t0 + Duration::from_secs(11));
        assert_eq!(stats.time_spent, Duration::from_secs(1));
    }
}
