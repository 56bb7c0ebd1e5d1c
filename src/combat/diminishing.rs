//! Diminishing Returns Tracker
//!
//! Repeated crowd control of one category on one target within a window
//! is scaled down by a configured ladder until the target is immune.
//! The window starts at the first application and is not extended by
//! later ones. Applications past the end of the ladder are immune, so the
//! total controlled time per category in any window is bounded by
//! `base * sum(ladder)`.

use std::collections::HashMap;

use super::ability::{ActorId, CrowdControlCategory};
use super::config::DiminishingReturnsSettings;

pub trait DiminishingReturns: Send + Sync {
    /// Record an application and return the effective duration.
    /// Zero means immune; the caller must not apply the effect.
    fn apply(&mut self, target: ActorId, category: CrowdControlCategory, base_duration: f32) -> f32;

    /// Applications counted in the current window (0 when the window is
    /// expired or was never opened).
    fn dr_level(&self, target: ActorId, category: CrowdControlCategory) -> usize;

    /// Whether the next application would be reduced to zero.
    fn is_immune(&self, target: ActorId, category: CrowdControlCategory) -> bool;

    /// Forget every record for `target` (death, zone change).
    fn clear(&mut self, target: ActorId);

    /// Advance the tracker's clock.
    fn tick(&mut self, dt: f32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CrowdControlRecord {
    window_start: f32,
    applications: usize,
}

#[derive(Clone, Debug, Default)]
pub struct DiminishingReturnsTracker {
    settings: DiminishingReturnsSettings,
    now: f32,
    records: HashMap<(ActorId, CrowdControlCategory), CrowdControlRecord>,
}

impl DiminishingReturnsTracker {
    pub fn new(settings: DiminishingReturnsSettings) -> Self {
        Self {
            settings,
            now: 0.0,
            records: HashMap::new(),
        }
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    fn multiplier_for(&self, index: usize) -> f32 {
        self.settings.ladder.get(index).copied().unwrap_or(0.0)
    }

    fn live_record(
        &self,
        target: ActorId,
        category: CrowdControlCategory,
    ) -> Option<&CrowdControlRecord> {
        self.records
            .get(&(target, category))
            .filter(|r| self.now - r.window_start <= self.settings.window)
    }
}

impl DiminishingReturns for DiminishingReturnsTracker {
    fn apply(&mut self, target: ActorId, category: CrowdControlCategory, base_duration: f32) -> f32 {
        let index = self.dr_level(target, category);
        let multiplier = self.multiplier_for(index);
        let now = self.now;
        let record = self
            .records
            .entry((target, category))
            .or_insert(CrowdControlRecord {
                window_start: now,
                applications: 0,
            });
        if index == 0 {
            record.window_start = now;
            record.applications = 0;
        }
        record.applications += 1;
        (base_duration * multiplier).max(0.0)
    }

    fn dr_level(&self, target: ActorId, category: CrowdControlCategory) -> usize {
        self.live_record(target, category)
            .map_or(0, |r| r.applications)
    }

    fn is_immune(&self, target: ActorId, category: CrowdControlCategory) -> bool {
        self.multiplier_for(self.dr_level(target, category)) <= 0.0
    }

    fn clear(&mut self, target: ActorId) {
        self.records.retain(|(actor, _), _| *actor != target);
    }

    fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.now += dt;
        let window = self.settings.window;
        let now = self.now;
        self.records.retain(|_, r| now - r.window_start <= window);
    }
}
