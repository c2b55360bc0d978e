pub mod curve;
pub mod placement;
pub mod surface;

pub use curve::{Arc, Line};
pub use placement::Placement;
pub use surface::Plane;
