//! Service layer: free async functions over the shared state, one module per
//! concern.

/// OpenAPI documentation generation.
pub mod documentation;
/// Move submission and match revalidation.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Pairing of waiting sessions into matches.
pub mod matchmaker;
/// Periodic reclamation of abandoned matches.
pub mod reaper;
/// Session resolution, heartbeat, and match binding.
pub mod session_service;
/// Store connection supervision and degraded mode.
pub mod storage_supervisor;
/// Long-poll state synchronization.
pub mod sync_service;
