use crate::error::{GeometryError, Result};
use crate::geometry::surface::Plane;
use crate::math::transform::{is_reflection, linear_determinant, transform_point};
use crate::math::{Matrix4, TOLERANCE};
use crate::topology::Shell;

/// Applies an arbitrary 4x4 transformation matrix to a shell.
///
/// Vertices are mapped through the matrix and every face plane is refitted
/// to its transformed outer loop. A reflecting matrix turns loops inside
/// out, so their order is reversed to keep faces pointing outward.
pub struct GeneralTransform {
    matrix: Matrix4,
}

impl GeneralTransform {
    /// Creates a new `GeneralTransform` operation.
    #[must_use]
    pub fn new(matrix: Matrix4) -> Self {
        Self { matrix }
    }

    /// Executes the transformation, modifying the shell in place.
    ///
    /// The shell is left untouched if the matrix is rejected; a failure
    /// while refitting planes (a face collapsing under a degenerate but
    /// non-singular matrix) can leave it partly updated, so callers that
    /// need atomicity transform a clone.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the matrix is singular or a
    /// face collapses.
    pub fn execute(&self, shell: &mut Shell) -> Result<()> {
        if linear_determinant(&self.matrix).abs() < TOLERANCE {
            return Err(GeometryError::Degenerate("transformation matrix is singular".into()).into());
        }

        for (_, point) in shell.vertices_mut() {
            *point = transform_point(&self.matrix, point);
        }

        let mirrored = is_reflection(&self.matrix);
        let mut planes = Vec::with_capacity(shell.face_count());
        for face in shell.faces() {
            let mut points = shell.loop_points(&face.outer_loop)?;
            if mirrored {
                points.reverse();
            }
            planes.push(Plane::from_polygon(&points)?);
        }

        for (face, plane) in shell.faces_mut().iter_mut().zip(planes) {
            if mirrored {
                for lp in face.loops_mut() {
                    lp.reverse();
                }
            }
            face.plane = plane;
        }
        Ok(())
    }
}
