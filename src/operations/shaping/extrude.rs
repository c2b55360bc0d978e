use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::polygon_3d::{newell_normal, planarity_deviation};
use crate::math::{Point3, ToleranceConfig, Vector3, TOLERANCE};
use crate::topology::{index_name, NameMaker, Shell, VertexId};

/// Extrudes a planar contour along a direction vector into a prism.
///
/// Faces are produced in a fixed order so their names are stable: the base
/// (`[main, 0]`), the cap (`[main, 1]`), then one side per contour edge
/// (`[main, 2 + i]`).
pub struct Extrude {
    contour: Vec<Point3>,
    direction: Vector3,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(contour: Vec<Point3>, direction: Vector3) -> Self {
        Self { contour, direction }
    }

    /// Executes the extrusion, returning a new closed shell.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the direction is
    /// zero-length or lies in the contour plane, or if the contour has fewer
    /// than three points, no area, or is not planar.
    pub fn execute(&self, names: &NameMaker, tolerance: &ToleranceConfig) -> Result<Shell> {
        let length = self.direction.norm();
        if length < TOLERANCE {
            return Err(
                OperationError::InvalidInput("extrude direction must be non-zero".into()).into(),
            );
        }
        if self.contour.len() < 3 {
            return Err(OperationError::InvalidInput(
                "extrude contour needs at least three points".into(),
            )
            .into());
        }

        let normal = newell_normal(&self.contour)
            .map_err(|_| OperationError::InvalidInput("extrude contour has no area".into()))?;
        let plane = Plane::from_polygon(&self.contour)?;
        if planarity_deviation(&self.contour, &plane) > tolerance.metric {
            return Err(OperationError::InvalidInput("extrude contour is not planar".into()).into());
        }
        if normal.dot(&self.direction).abs() <= tolerance.angle * length {
            return Err(OperationError::InvalidInput(
                "extrude direction lies in the contour plane".into(),
            )
            .into());
        }

        // Order the base so its normal follows the direction; the base face
        // then takes the reversed loop and every side quad faces outward.
        let base: Vec<Point3> = if normal.dot(&self.direction) > 0.0 {
            self.contour.clone()
        } else {
            self.contour.iter().rev().copied().collect()
        };

        let mut shell = Shell::new();
        let bottom: Vec<VertexId> = base.iter().map(|p| shell.add_vertex(*p)).collect();
        let top: Vec<VertexId> = base
            .iter()
            .map(|p| shell.add_vertex(p + self.direction))
            .collect();

        shell.add_planar_face(bottom.iter().rev().copied().collect(), names.face_name(&[0]))?;
        shell.add_planar_face(top.clone(), names.face_name(&[1]))?;

        let n = base.len();
        for i in 0..n {
            let j = (i + 1) % n;
            shell.add_planar_face(
                vec![bottom[i], bottom[j], top[j], top[i]],
                names.face_name(&[index_name(i + 2)]),
            )?;
        }

        Ok(shell)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::operations::query::{IsValid, Volume};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn extrude(contour: Vec<Point3>, direction: Vector3) -> Result<Shell> {
        Extrude::new(contour, direction).execute(&NameMaker::new(3), &ToleranceConfig::default())
    }

    // ── Unit cube ──────────────────────────────────────────────

    #[test]
    fn unit_cube_has_6_faces() {
        let shell = extrude(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
            Vector3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_eq!(shell.face_count(), 6);
        assert_eq!(shell.edge_count(), 12);
        assert_eq!(shell.vertex_count(), 8);
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
        assert_relative_eq!(*shell.faces()[0].normal(), -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(*shell.faces()[1].normal(), Vector3::z(), epsilon = 1e-12);
    }

    // ── Winding independence ───────────────────────────────────

    #[test]
    fn clockwise_contour_still_faces_outward() {
        let shell = extrude(
            vec![p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
            Vector3::new(0.0, 0.0, 2.0),
        )
        .unwrap();
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 2.0, epsilon = 1e-12);
    }

    // ── L-shape ────────────────────────────────────────────────

    #[test]
    fn l_shape_has_8_faces() {
        let shell = extrude(
            vec![
                p(0.0, 0.0, 0.0),
                p(2.0, 0.0, 0.0),
                p(2.0, 1.0, 0.0),
                p(1.0, 1.0, 0.0),
                p(1.0, 2.0, 0.0),
                p(0.0, 2.0, 0.0),
            ],
            Vector3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_eq!(shell.face_count(), 8);
        assert_eq!(shell.faces()[7].name.path(), &[3, 7]);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 3.0, epsilon = 1e-12);
    }

    // ── Rejections ─────────────────────────────────────────────

    #[test]
    fn direction_in_plane_is_rejected() {
        let result = extrude(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)],
            Vector3::new(1.0, 1.0, 0.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_direction_is_rejected() {
        let result = extrude(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)],
            Vector3::zeros(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn non_planar_contour_is_rejected() {
        let result = extrude(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.5), p(0.0, 1.0, 0.0)],
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!(result.is_err());
    }
}
