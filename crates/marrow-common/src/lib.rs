//! # Marrow Common
//!
//! Common types, utilities, and shared abstractions for Marrow Grow.
//!
//! This crate provides foundational types used across all Marrow crates:
//! - ID types (GrowerId, CycleId)
//! - Wall-clock timestamps and clock sources
//! - Version information for persisted data
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod time;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::time::*;
    pub use crate::version::*;
}

pub use prelude::*;
