/// Host capabilities (ads, audio) behind traits.
pub mod capabilities;
/// Weekly challenge registration and play.
pub mod challenge_service;
/// Leaderboard queries.
pub mod leaderboard_service;
/// Single-player level flow.
pub mod level_service;
/// Bounded, cancellable polling with backoff.
pub mod polling;
/// Real-time driver for a local quiz run.
pub mod quiz_runner;
/// Bundled quotes for the guess-the-team mode.
pub mod quote_bank;
/// Score submission and winner reconciliation.
pub mod reconciliation;
/// Room creation, joining and opponent polling.
pub mod session_service;
