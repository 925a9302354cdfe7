use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// One doneness sample of the side currently facing the heat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DonenessReading {
    pub value: f32,
    pub at: Instant,
}

/// Sliding window over the last W doneness readings.
///
/// "Progress" is any change in value. The window is owned by the
/// controller task, so reads from the watchdog path are serialized with
/// the writes from ingress.
#[derive(Debug, Clone)]
pub struct TelemetryWindow {
    capacity: usize,
    readings: VecDeque<DonenessReading>,
    last_progress: Instant,
}

impl TelemetryWindow {
    pub fn new(capacity: usize, now: Instant) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
            last_progress: now,
        }
    }

    pub fn record(&mut self, value: f32, now: Instant) {
        let changed = match self.readings.back() {
            Some(prev) => prev.value != value,
            None => true,
        };
        if changed {
            self.last_progress = now;
        }

        if self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(DonenessReading { value, at: now });
    }

    /// Full window, every entry numerically equal.
    pub fn is_stuck(&self) -> bool {
        if self.readings.len() < self.capacity {
            return false;
        }
        match self.readings.front() {
            Some(first) => self.readings.iter().all(|r| r.value == first.value),
            None => false,
        }
    }

    pub fn staleness(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_progress)
    }

    pub fn latest(&self) -> Option<f32> {
        self.readings.back().map(|r| r.value)
    }

    /// Start a new stagnation episode: keep only the newest reading and
    /// count `now` as progress. Called after a committed action or a reset.
    pub fn rebase(&mut self, now: Instant) {
        while self.readings.len() > 1 {
            self.readings.pop_front();
        }
        self.last_progress = now;
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
