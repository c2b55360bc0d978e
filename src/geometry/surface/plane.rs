use crate::error::{GeometryError, Result};
use crate::math::polygon_3d::{centroid, newell_normal};
use crate::math::transform::{transform_direction, transform_point};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};

/// An infinite oriented plane in 3D space.
///
/// Defined by an origin point and two orthonormal direction vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir x v_dir`.
///
/// Faces carry one each, oriented along their outward normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// `v_dir` is re-orthogonalised against `u_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE || v_dir.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(GeometryError::Degenerate("plane directions are parallel".into()).into());
        }
        let normal = normal / normal_len;

        Ok(Self {
            origin,
            u_dir,
            v_dir: normal.cross(&u_dir),
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Fits a plane through a closed polygon; the normal follows the
    /// polygon winding (right-hand rule) and the origin is its centroid.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon has no area.
    pub fn from_polygon(points: &[Point3]) -> Result<Self> {
        let normal = newell_normal(points)?;
        Self::from_normal(centroid(points), normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from a point; positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Orthogonal projection of a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// The same plane with the opposite orientation.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            u_dir: self.v_dir,
            v_dir: self.u_dir,
            normal: -self.normal,
        }
    }

    /// Applies an affine transformation.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformed directions collapse.
    pub fn transformed(&self, matrix: &Matrix4) -> Result<Self> {
        let origin = transform_point(matrix, &self.origin);
        let u_dir = transform_direction(matrix, &self.u_dir);
        let v_dir = transform_direction(matrix, &self.v_dir);
        Self::new(origin, u_dir, v_dir)
    }

    /// Returns `true` if both planes describe the same oriented surface.
    #[must_use]
    pub fn is_same(&self, other: &Self, metric: f64, angle: f64) -> bool {
        self.normal.dot(&other.normal) > 0.0
            && self.normal.cross(&other.normal).norm() <= angle
            && self.signed_distance(&other.origin).abs() <= metric
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::transform::rotation_about_axis;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn polygon_winding_sets_normal() {
        let plane = Plane::from_polygon(&[
            p(0.0, 0.0, 2.0),
            p(0.0, 1.0, 2.0),
            p(1.0, 1.0, 2.0),
            p(1.0, 0.0, 2.0),
        ])
        .unwrap();
        assert_relative_eq!(*plane.plane_normal(), -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&p(7.0, 3.0, 0.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn reversed_plane_is_not_same() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        assert!(plane.is_same(&plane.clone(), 1e-9, 1e-9));
        assert!(!plane.is_same(&plane.reversed(), 1e-9, 1e-9));
    }

    #[test]
    fn rotated_plane_keeps_orthonormal_frame() {
        let plane = Plane::from_normal(p(1.0, 0.0, 0.0), Vector3::x()).unwrap();
        let m = rotation_about_axis(&p(0.0, 0.0, 0.0), &Vector3::z(), 0.3).unwrap();
        let rotated = plane.transformed(&m).unwrap();
        assert_relative_eq!(rotated.u_dir().dot(rotated.v_dir()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.plane_normal().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.plane_normal().x, 0.3_f64.cos(), epsilon = 1e-12);
    }

    #[test]
    fn parallel_directions_are_rejected() {
        assert!(Plane::new(p(0.0, 0.0, 0.0), Vector3::x(), Vector3::x() * 2.0).is_err());
    }
}
