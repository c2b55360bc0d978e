//! Ordered creator histories.
//!
//! A body's persistent form is its [`Transactions`] list. Rebuilding walks
//! the active creators in order, feeding each step the shell produced by
//! the previous one.

mod progress;
mod transactions;

pub use progress::Progress;
pub use transactions::{AddMode, ProcessState, Transactions};
