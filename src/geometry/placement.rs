use crate::error::{GeometryError, Result};
use crate::math::transform::{transform_direction, transform_point};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};

/// A right-handed local coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    origin: Point3,
    x_axis: Vector3,
    y_axis: Vector3,
    z_axis: Vector3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
            z_axis: Vector3::z(),
        }
    }
}

impl Placement {
    /// Creates a placement from an origin and two in-plane directions.
    ///
    /// `y_dir` is re-orthogonalised against `x_dir`; the Z axis completes a
    /// right-handed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the directions are zero-length or parallel.
    pub fn new(origin: Point3, x_dir: Vector3, y_dir: Vector3) -> Result<Self> {
        let x_len = x_dir.norm();
        if x_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let x_axis = x_dir / x_len;
        let z = x_axis.cross(&y_dir);
        let z_len = z.norm();
        if z_len < TOLERANCE {
            return Err(GeometryError::Degenerate("placement axes are parallel".into()).into());
        }
        let z_axis = z / z_len;
        Ok(Self {
            origin,
            x_axis,
            y_axis: z_axis.cross(&x_axis),
            z_axis,
        })
    }

    /// Placement at `origin` aligned with the global axes.
    #[must_use]
    pub fn at(origin: Point3) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// Returns the origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit X axis.
    #[must_use]
    pub fn x_axis(&self) -> &Vector3 {
        &self.x_axis
    }

    /// Returns the unit Y axis.
    #[must_use]
    pub fn y_axis(&self) -> &Vector3 {
        &self.y_axis
    }

    /// Returns the unit Z axis.
    #[must_use]
    pub fn z_axis(&self) -> &Vector3 {
        &self.z_axis
    }

    /// Maps local coordinates to a global point.
    #[must_use]
    pub fn point_at(&self, x: f64, y: f64, z: f64) -> Point3 {
        self.origin + self.x_axis * x + self.y_axis * y + self.z_axis * z
    }

    /// Applies a transformation.
    ///
    /// Returns the moved placement, the scale factors picked up by its X, Y
    /// and Z axes, and whether the transformation mirrored the frame (in
    /// which case the returned Z axis is opposite to the transformed one).
    ///
    /// # Errors
    ///
    /// Returns an error if the transformed axes collapse.
    pub fn transformed(&self, matrix: &Matrix4) -> Result<(Self, [f64; 3], bool)> {
        let x = transform_direction(matrix, &self.x_axis);
        let y = transform_direction(matrix, &self.y_axis);
        let z = transform_direction(matrix, &self.z_axis);
        let scales = [x.norm(), y.norm(), z.norm()];
        let placement = Self::new(transform_point(matrix, &self.origin), x, y)?;
        let mirrored = placement.z_axis.dot(&z) < 0.0;
        Ok((placement, scales, mirrored))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::math::transform::rotation_about_axis;

    #[test]
    fn frame_is_orthonormal() {
        let placement = Placement::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(*placement.y_axis(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(*placement.z_axis(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(placement.point_at(1.0, 1.0, 1.0), Point3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn rotation_moves_axes() {
        let m = rotation_about_axis(&Point3::origin(), &Vector3::z(), FRAC_PI_2).unwrap();
        let (moved, scales, mirrored) = Placement::at(Point3::new(1.0, 0.0, 0.0))
            .transformed(&m)
            .unwrap();
        assert_relative_eq!(*moved.origin(), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(*moved.x_axis(), Vector3::y(), epsilon = 1e-12);
        assert!(!mirrored);
        for s in scales {
            assert_relative_eq!(s, 1.0, epsilon = 1e-12);
        }
    }
}
