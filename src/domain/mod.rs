//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (UserRecord, Incoming, Reply)
//! - Traits: Abstractions for infrastructure (Bot, UserStore)

pub mod entities;
pub mod traits;
