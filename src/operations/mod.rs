pub mod boolean;
pub mod modification;
pub mod query;
pub mod shaping;
pub mod transform;

mod construction;

pub use construction::{AuxItem, Construction};
