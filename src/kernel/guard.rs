use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::action::ActionKind;
use super::telemetry::event::BlockKind;
use crate::config::ControllerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    CoolingDown { remaining: Duration },
    SeasoningLimit { count: u32, max: u32 },
}

impl From<Blocked> for BlockKind {
    fn from(b: Blocked) -> Self {
        match b {
            Blocked::CoolingDown { .. } => BlockKind::CoolingDown,
            Blocked::SeasoningLimit { .. } => BlockKind::SeasoningLimit,
        }
    }
}

/// Per-kind cooldowns plus the seasoning limit.
///
/// Only the controller mutates the guard, at commit time. The arbiter and
/// the watchdog path only ask `may_run`.
#[derive(Debug, Clone)]
pub struct CooldownGuard {
    not_before: HashMap<ActionKind, Instant>,
    cooldowns: HashMap<ActionKind, Duration>,
    seasoning_count: u32,
    max_seasoning: u32,
}

impl CooldownGuard {
    pub fn new(config: &ControllerConfig) -> Self {
        let cooldowns = ActionKind::ALL
            .iter()
            .map(|kind| (*kind, config.cooldown(*kind)))
            .collect();
        Self {
            not_before: HashMap::new(),
            cooldowns,
            seasoning_count: 0,
            max_seasoning: config.max_seasoning,
        }
    }

    pub fn may_run(&self, kind: ActionKind, now: Instant) -> bool {
        self.blocked_reason(kind, now).is_none()
    }

    pub fn blocked_reason(&self, kind: ActionKind, now: Instant) -> Option<Blocked> {
        if let Some(until) = self.not_before.get(&kind) {
            if now < *until {
                return Some(Blocked::CoolingDown { remaining: *until - now });
            }
        }
        if kind == ActionKind::Season && self.seasoning_count >= self.max_seasoning {
            return Some(Blocked::SeasoningLimit {
                count: self.seasoning_count,
                max: self.max_seasoning,
            });
        }
        None
    }

    pub fn commit(&mut self, kind: ActionKind, now: Instant) {
        let cooldown = self.cooldowns.get(&kind).copied().unwrap_or(Duration::ZERO);
        if cooldown.is_zero() {
            self.not_before.remove(&kind);
        } else {
            self.not_before.insert(kind, now + cooldown);
        }
        if kind == ActionKind::Season {
            self.seasoning_count = (self.seasoning_count + 1).min(self.max_seasoning);
        }
    }

    /// Active cooldowns only, sorted by kind.
    pub fn remaining(&self, now: Instant) -> Vec<(ActionKind, Duration)> {
        let mut active: Vec<_> = self
            .not_before
            .iter()
            .filter(|(_, until)| now < **until)
            .map(|(kind, until)| (*kind, *until - now))
            .collect();
        active.sort_by_key(|(kind, _)| *kind);
        active
    }

    /// Cooldowns survive; they guard the hardware, not the cook.
    pub fn reset_counters(&mut self) {
        self.seasoning_count = 0;
    }

    pub fn seasoning_count(&self) -> u32 {
        self.seasoning_count
    }

    pub fn max_seasoning(&self) -> u32 {
        self.max_seasoning
    }
}
