//! # Outbox Core
//!
//! Collaborator interfaces for the outbox offline event store.
//!
//! The event store itself lives in `outbox-store`. Everything it needs from
//! its host environment is expressed here as a narrow trait so the same
//! eviction and persistence logic runs against an in-memory map in tests and
//! a real key-value backend in production.
//!
//! ## Key Traits
//!
//! - [`KeyValueBackend`]: Async get/set/remove by string key
//! - [`Clock`]: Time abstraction for testability

pub mod error;
pub mod traits;

// Re-export main types
pub use error::*;
pub use traits::*;
