//! Host capabilities the quiz flows call out to but never implement themselves.

use tracing::info;

/// Where an ad banner would be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdPlacement {
    /// Landing screen.
    Home,
    /// After a finished run.
    Results,
    /// Below a leaderboard.
    Leaderboard,
}

/// Shows ads. Real SDK integrations live outside this crate.
pub trait AdProvider: Send + Sync {
    /// Show a banner at `placement`.
    fn show_banner(&self, placement: AdPlacement);
}

/// Background music control.
pub trait AudioPlayer: Send + Sync {
    /// Start looping `track`.
    fn play(&self, track: &str);
    /// Stop whatever is playing.
    fn stop(&self);
}

/// [`AdProvider`] that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAds;

impl AdProvider for TracingAds {
    fn show_banner(&self, placement: AdPlacement) {
        info!(?placement, "ad banner requested");
    }
}

/// [`AudioPlayer`] that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudio;

impl AudioPlayer for TracingAudio {
    fn play(&self, track: &str) {
        info!(track, "audio playback requested");
    }

    fn stop(&self) {
        info!("audio stop requested");
    }
}
