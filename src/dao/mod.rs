/// Level, challenge and leaderboard endpoints.
pub mod content_api;
/// Transport errors.
pub mod error;
/// Stored weekly challenge identity.
pub mod identity;
/// Durable key-value storage.
pub mod kv_store;
/// Unlocked level counter.
pub mod progress;
/// Room Service client.
pub mod room_api;
