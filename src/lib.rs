//! Replayable modeling history for a polyhedral B-rep kernel.
//!
//! [`creators`] record single modeling steps, [`history`] orders them into
//! a rebuildable list, and [`topology::Shell`] is the body they build.

pub mod creators;
pub mod error;
pub mod geometry;
pub mod history;
pub mod math;
pub mod operations;
pub mod topology;

pub use error::{GeohistError, Result};
