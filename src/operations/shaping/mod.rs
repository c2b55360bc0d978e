mod extrude;
mod revolve;

pub use extrude::Extrude;
pub use revolve::Revolve;
