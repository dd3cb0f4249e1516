//! Single-player level unlocking backed by the local store.

use std::{ops::RangeInclusive, sync::Arc};

use tracing::{info, warn};

use super::kv_store::{KeyValueStore, StoreResult};

/// Store key holding the highest unlocked level, as a decimal string.
pub const UNLOCKED_LEVELS_KEY: &str = "unlockedLevels";
/// Levels that must be unlocked in order. Anything outside is always playable.
pub const GATED_LEVELS: RangeInclusive<u32> = 1..=10;
/// Percentage a run must reach to unlock the next level.
pub const DEFAULT_UNLOCK_THRESHOLD: f64 = 75.0;
/// Points a single question can award at most.
pub const MAX_POINTS_PER_QUESTION: u32 = 10;

/// Result of recording a finished level run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// The counter did not move.
    Unchanged {
        /// Highest unlocked level.
        unlocked: u32,
    },
    /// The counter moved up by one.
    Unlocked {
        /// Newly unlocked level.
        unlocked: u32,
    },
}

/// Score of a run as a percentage of the maximum attainable points.
pub fn run_percentage(points: u32, total_questions: usize) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let max = total_questions as f64 * f64::from(MAX_POINTS_PER_QUESTION);
    f64::from(points) / max * 100.0
}

/// The unlocked-level counter. Never decreases; grows by exactly one per qualifying run.
#[derive(Clone)]
pub struct LevelProgress {
    store: Arc<dyn KeyValueStore>,
    threshold_percent: f64,
}

impl LevelProgress {
    /// Track progress in `store`, unlocking at `threshold_percent`.
    pub fn new(store: Arc<dyn KeyValueStore>, threshold_percent: f64) -> Self {
        Self {
            store,
            threshold_percent,
        }
    }

    /// Highest unlocked level. Defaults to 1 when nothing (or garbage) is stored.
    pub fn unlocked(&self) -> StoreResult<u32> {
        let Some(raw) = self.store.get(UNLOCKED_LEVELS_KEY)? else {
            return Ok(1);
        };
        match raw.trim().parse::<u32>() {
            Ok(level) if level >= 1 => Ok(level),
            _ => {
                warn!(value = %raw, "ignoring unparsable unlocked level counter");
                Ok(1)
            }
        }
    }

    /// Whether `level` may be started right now.
    pub fn is_playable(&self, level: u32) -> StoreResult<bool> {
        if !GATED_LEVELS.contains(&level) {
            return Ok(true);
        }
        Ok(level <= self.unlocked()?)
    }

    /// Record a finished run of `level` and bump the counter if it qualifies.
    ///
    /// A run qualifies when it scores at least the threshold on a gated level at
    /// or above the current counter.
    pub fn record_run(
        &self,
        level: u32,
        points: u32,
        total_questions: usize,
    ) -> StoreResult<ProgressUpdate> {
        let unlocked = self.unlocked()?;
        let percentage = run_percentage(points, total_questions);

        let qualifies = GATED_LEVELS.contains(&level)
            && level >= unlocked
            && percentage >= self.threshold_percent;
        if !qualifies {
            return Ok(ProgressUpdate::Unchanged { unlocked });
        }

        let next = unlocked + 1;
        self.store.set(UNLOCKED_LEVELS_KEY, &next.to_string())?;
        info!(level, percentage, unlocked = next, "unlocked next level");
        Ok(ProgressUpdate::Unlocked { unlocked: next })
    }
}
