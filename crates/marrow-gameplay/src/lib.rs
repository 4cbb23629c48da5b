//! # Marrow Gameplay
//!
//! The grow-cycle simulation for Marrow Grow.
//!
//! This crate provides:
//! - Catalog of seeds, soils, nutrient mixes and event tables
//! - Plant state with clamped resources and running accumulators
//! - Event engine for pests, raiders, nutrient boosts and acts of god
//! - Tick cadence and wall-clock deferred tasks
//! - Harvest scoring and the post-harvest pipeline
//! - Lives, lockouts and grower records
//! - A session facade tying it all together
//!
//! Nothing here touches the filesystem or sleeps. Time comes from a
//! [`marrow_common::Clock`] and randomness from a [`GrowRng`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod config;
pub mod cycle;
pub mod events;
pub mod feeding;
pub mod harvest;
pub mod incidents;
pub mod lives;
pub mod plant;
pub mod records;
pub mod rng;
pub mod session;
pub mod tasks;
pub mod time;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::cycle::*;
    pub use crate::events::*;
    pub use crate::feeding::*;
    pub use crate::harvest::*;
    pub use crate::incidents::*;
    pub use crate::lives::*;
    pub use crate::plant::*;
    pub use crate::records::*;
    pub use crate::rng::*;
    pub use crate::session::*;
    pub use crate::tasks::*;
    pub use crate::time::*;
}

pub use prelude::*;
