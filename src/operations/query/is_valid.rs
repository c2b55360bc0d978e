use crate::error::{Result, TopologyError};
use crate::math::polygon_3d::{newell_normal, planarity_deviation, vector_area};
use crate::math::{ToleranceConfig, Vector3};
use crate::topology::Shell;

use super::Volume;

/// Validates the topological and geometric consistency of a shell.
///
/// A valid shell is non-empty and closed, every loop has at least three
/// distinct vertices lying on its face plane, every face has positive area
/// with its winding matching the plane normal, and the enclosed volume is
/// positive.
pub struct IsValid {
    tolerance: ToleranceConfig,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self { tolerance }
    }

    /// Executes the validation, returning `true` if the shell is valid.
    #[must_use]
    pub fn execute(&self, shell: &Shell) -> bool {
        self.check(shell).is_ok()
    }

    /// Like [`execute`](Self::execute) but reports the first defect found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] describing the defect.
    pub fn check(&self, shell: &Shell) -> Result<()> {
        let invalid = |reason: String| -> crate::error::GeohistError {
            TopologyError::InvalidTopology(reason).into()
        };

        if shell.is_empty() {
            return Err(invalid("shell has no faces".into()));
        }

        let metric = self.tolerance.metric;
        for (index, face) in shell.faces().iter().enumerate() {
            let mut area = Vector3::zeros();
            for lp in face.loops() {
                if lp.len() < 3 {
                    return Err(invalid(format!("face {index} has a loop with fewer than 3 vertices")));
                }
                if lp.iter().zip(lp.iter().cycle().skip(1)).any(|(a, b)| a == b) {
                    return Err(invalid(format!("face {index} repeats a vertex")));
                }
                let points = shell.loop_points(lp)?;
                if planarity_deviation(&points, &face.plane) > metric {
                    return Err(invalid(format!("face {index} is not planar")));
                }
                area += vector_area(&points);
            }
            if area.dot(face.normal()) <= metric * metric {
                return Err(invalid(format!("face {index} has no area")));
            }
            let outer = shell.loop_points(&face.outer_loop)?;
            if newell_normal(&outer)?.dot(face.normal()) <= 0.0 {
                return Err(invalid(format!("face {index} winds against its normal")));
            }
        }

        if !shell.is_closed() {
            return Err(invalid("shell is not closed".into()));
        }

        if Volume::new().execute(shell)? <= metric.powi(3) {
            return Err(invalid("shell does not enclose a positive volume".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::shaping::Extrude;
    use crate::topology::NameMaker;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube() -> Shell {
        Extrude::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
            Vector3::new(0.0, 0.0, 1.0),
        )
        .execute(&NameMaker::new(1), &ToleranceConfig::default())
        .unwrap()
    }

    #[test]
    fn extruded_cube_is_valid() {
        assert!(IsValid::new(ToleranceConfig::default()).execute(&cube()));
    }

    #[test]
    fn open_shell_is_invalid() {
        let mut shell = cube();
        shell.remove_faces(&[1]);
        let err = IsValid::new(ToleranceConfig::default()).check(&shell).unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn inverted_shell_is_invalid() {
        let mut shell = cube();
        shell.reverse();
        assert!(!IsValid::new(ToleranceConfig::default()).execute(&shell));
    }

    #[test]
    fn warped_face_is_invalid() {
        let mut shell = cube();
        let corner = shell.faces()[1].outer_loop[0];
        shell.vertex_mut(corner).unwrap().z += 0.1;
        assert!(!IsValid::new(ToleranceConfig::default()).execute(&shell));
    }

    #[test]
    fn empty_shell_is_invalid() {
        assert!(!IsValid::new(ToleranceConfig::default()).execute(&Shell::new()));
    }
}
