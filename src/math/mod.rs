pub mod intersect_3d;
pub mod polygon_3d;
pub mod tolerance;
pub mod transform;

pub use tolerance::ToleranceConfig;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Numeric zero guard for normalising vectors and dividing by determinants.
///
/// Geometric decisions (coincidence, parallelism) use [`ToleranceConfig`].
pub const TOLERANCE: f64 = 1e-10;
