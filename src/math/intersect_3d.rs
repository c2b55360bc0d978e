use crate::error::{GeometryError, Result};
use crate::geometry::surface::Plane;

use super::{Point3, Vector3, TOLERANCE};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine {
        origin: Point3,
        direction: Vector3,
    },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same (coincident).
    Coincident,
}

/// Computes the intersection of two planes.
///
/// `angle` is the sine below which the normals count as parallel and
/// `metric` the distance below which parallel planes coincide.
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane, angle: f64, metric: f64) -> PlanePairRelation {
    let na = a.plane_normal();
    let nb = b.plane_normal();

    let dir = na.cross(nb);
    let dir_len = dir.norm();

    if dir_len <= angle {
        let dist = (b.origin() - a.origin()).dot(na).abs();
        if dist <= metric {
            PlanePairRelation::Coincident
        } else {
            PlanePairRelation::Parallel { distance: dist }
        }
    } else {
        let dir = dir / dir_len;
        // p = oa + s * na + t * nb, with na.(p - oa) = 0 and nb.(p - ob) = 0
        let d2 = nb.dot(&(b.origin() - a.origin()));
        let dot_nn = na.dot(nb);
        let denom = 1.0 - dot_nn * dot_nn;
        let s = -dot_nn * d2 / denom;
        let t = d2 / denom;
        let origin = a.origin() + na * s + nb * t;

        PlanePairRelation::IntersectionLine { origin, direction: dir }
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with a plane.
#[must_use]
pub fn line_plane_intersect(origin: &Point3, dir: &Vector3, plane: &Plane) -> LinePlaneRelation {
    let normal = plane.plane_normal();
    let denom = normal.dot(dir);
    let numer = normal.dot(&(plane.origin() - origin));

    if denom.abs() < TOLERANCE {
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        LinePlaneRelation::Point {
            point: origin + dir * t,
            t,
        }
    }
}

/// Finds the point shared by three or more planes.
///
/// Solves the least-squares system `n_i . x = n_i . o_i`; with exactly
/// three independent planes this is their unique common point.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if fewer than three planes are
/// given, the normals do not span space, or the planes have no common
/// point within `metric`.
pub fn planes_common_point(planes: &[&Plane], metric: f64) -> Result<Point3> {
    if planes.len() < 3 {
        return Err(GeometryError::Degenerate("need at least three planes".into()).into());
    }

    let mut ata = nalgebra::Matrix3::<f64>::zeros();
    let mut atb = Vector3::zeros();
    for plane in planes {
        let n = plane.plane_normal();
        let d = n.dot(&plane.origin().coords);
        ata += n * n.transpose();
        atb += n * d;
    }

    if ata.determinant().abs() < TOLERANCE {
        return Err(GeometryError::Degenerate("planes do not meet in a point".into()).into());
    }
    let inverse = ata
        .try_inverse()
        .ok_or_else(|| GeometryError::Degenerate("planes do not meet in a point".into()))?;
    let point = Point3::from(inverse * atb);

    let residual = planes
        .iter()
        .map(|plane| plane.signed_distance(&point).abs())
        .fold(0.0, f64::max);
    if residual > metric {
        return Err(GeometryError::Degenerate(format!(
            "planes miss a common point by {residual:.3e}"
        ))
        .into());
    }
    Ok(point)
}
