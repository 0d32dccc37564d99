//! Wire-facing request and response payloads.

/// Action envelope for the publish endpoint.
pub mod action;
/// Client-facing projection of a match.
pub mod game;
/// Health check payload.
pub mod health;
/// Long-poll request and response payloads.
pub mod poll;
/// Validation helpers for DTOs.
pub mod validation;
