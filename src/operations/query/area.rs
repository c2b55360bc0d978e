use crate::error::Result;
use crate::math::polygon_3d::vector_area;
use crate::math::Vector3;
use crate::topology::Shell;

use super::volume::sum_over_faces;

/// Computes the total surface area of a shell.
///
/// Each face contributes the projection of its summed loop vector areas on
/// its normal, so holes are subtracted exactly.
#[derive(Debug, Default)]
pub struct Area;

impl Area {
    /// Creates a new `Area` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query, returning the total surface area.
    ///
    /// # Errors
    ///
    /// Returns an error if a face references an unknown vertex.
    pub fn execute(&self, shell: &Shell) -> Result<f64> {
        sum_over_faces(shell, |face| {
            let mut area = Vector3::zeros();
            for lp in face.loops() {
                area += vector_area(&shell.loop_points(lp)?);
            }
            Ok(area.dot(face.normal()))
        })
    }
}
