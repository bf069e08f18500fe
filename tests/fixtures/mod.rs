//! Test fixtures for itinerary-planner.
//!
//! Provides the Bangkok example data (a hotel plus nine cafés and attractions)
//! and scripted routing oracles.

#![allow(dead_code, unused_imports)]

pub mod bangkok_locations;
pub mod oracles;

pub use bangkok_locations::*;
pub use oracles::*;
