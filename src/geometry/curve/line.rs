use crate::error::{GeometryError, Result};
use crate::math::transform::{transform_direction, transform_point};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};

/// An infinite line defined by an origin point and a direction vector.
///
/// The parametric form is: `P(t) = origin + t * direction`.
/// Used as the axis of revolutions and the hinge line of drafts.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Parameter of the foot of the perpendicular from `point`.
    #[must_use]
    pub fn parameter_of(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.direction)
    }

    /// Distance from `point` to the line.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        let foot = self.origin + self.direction * self.parameter_of(point);
        (point - foot).norm()
    }

    /// Applies an affine transformation.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction collapses.
    pub fn transformed(&self, matrix: &Matrix4) -> Result<Self> {
        Self::new(
            transform_point(matrix, &self.origin),
            transform_direction(matrix, &self.direction),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn distance_from_z_axis() {
        let axis = Line::new(Point3::origin(), Vector3::z() * 3.0).unwrap();
        assert_relative_eq!(axis.distance_to(&Point3::new(3.0, 4.0, 10.0)), 5.0);
        assert_relative_eq!(axis.parameter_of(&Point3::new(3.0, 4.0, 10.0)), 10.0);
    }

    #[test]
    fn transformed_line_stays_normalised() {
        let line = Line::new(Point3::new(1.0, 0.0, 0.0), Vector3::y()).unwrap();
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 4.0, 1.0));
        let moved = line.transformed(&scale).unwrap();
        assert_relative_eq!(*moved.direction(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(moved.point_at(2.0), Point3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
    }
}
