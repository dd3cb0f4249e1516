//! Library crate for binge-brain: the client side of a themed trivia quiz, exposing
//! modules for the terminal client and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Remote service clients and the local key-value store.
pub mod dao;
/// Wire payloads and input validation.
pub mod dto;
/// Service-level errors and user-facing alerts.
pub mod error;
/// Flows built on top of the remote services.
pub mod services;
/// Room, quiz and cancellation state.
pub mod state;
/// Local stand-ins for the remote services.
pub mod stub;
