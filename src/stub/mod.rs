//! Local stand-in for the remote services, used by tests and the `stub-server` command.

/// In-memory content endpoints.
pub mod content;
/// In-memory Room Service.
pub mod rooms;
/// HTTP surface over the in-memory services.
#[cfg(feature = "stub-server")]
pub mod routes;
