//! Curves used as creator parameters and as helper geometry.

mod arc;
mod line;

pub use arc::Arc;
pub use line::Line;
