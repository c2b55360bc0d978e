use crate::error::{GeometryError, Result};
use crate::geometry::surface::Plane;

use super::{Point3, Vector3, TOLERANCE};

/// Projects a 3D point onto the UV coordinate system of a plane.
#[must_use]
fn project_to_uv(point: &Point3, plane: &Plane) -> (f64, f64) {
    let diff = point - plane.origin();
    (diff.dot(plane.u_dir()), diff.dot(plane.v_dir()))
}

/// Point-in-polygon test for a 3D point coplanar with the polygon.
///
/// Projects to the plane's UV coordinate space and uses the winding number
/// algorithm. Returns `true` if the point is inside (boundary points may go
/// either way).
#[must_use]
pub fn point_in_polygon_3d(point: &Point3, polygon: &[Point3], plane: &Plane) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (px, py) = project_to_uv(point, plane);
    let uvs: Vec<(f64, f64)> = polygon.iter().map(|p| project_to_uv(p, plane)).collect();

    winding_number_2d(px, py, &uvs) != 0
}

/// Distance in the plane from a point to the closest polygon edge.
#[must_use]
pub fn distance_to_polygon_boundary(point: &Point3, polygon: &[Point3]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| point_segment_distance(point, &polygon[i], &polygon[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from a point to a segment.
#[must_use]
pub fn point_segment_distance(point: &Point3, start: &Point3, end: &Point3) -> f64 {
    let dir = end - start;
    let len_sq = dir.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (point - start).norm();
    }
    let t = ((point - start).dot(&dir) / len_sq).clamp(0.0, 1.0);
    (point - (start + dir * t)).norm()
}

/// Winding number of point `(px, py)` with respect to polygon `verts`.
///
/// Non-zero => inside, zero => outside.
fn winding_number_2d(px: f64, py: f64, verts: &[(f64, f64)]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let (x0, y0) = verts[i];
        let (x1, y1) = verts[(i + 1) % n];

        if y0 <= py {
            if y1 > py && cross_2d(x1 - x0, y1 - y0, px - x0, py - y0) > 0.0 {
                winding += 1;
            }
        } else if y1 <= py && cross_2d(x1 - x0, y1 - y0, px - x0, py - y0) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Vector area of a closed loop: its direction is the loop normal
/// (right-hand rule) and its length is the enclosed area.
#[must_use]
pub fn vector_area(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut sum = Vector3::zeros();
    if n < 3 {
        return sum;
    }
    let o = points[0].coords;
    for i in 1..n - 1 {
        let a = points[i].coords - o;
        let b = points[i + 1].coords - o;
        sum += a.cross(&b);
    }
    sum * 0.5
}

/// Unit normal of a polygon using Newell's method.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the polygon has no area.
pub fn newell_normal(points: &[Point3]) -> Result<Vector3> {
    let n = points.len();
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate("polygon has no area".into()).into());
    }
    Ok(normal / len)
}

/// Arithmetic mean of a point set.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / points.len() as f64;
    Point3::from(points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) * inv_n)
}

/// Largest distance of any point from the plane.
#[must_use]
pub fn planarity_deviation(points: &[Point3], plane: &Plane) -> f64 {
    points
        .iter()
        .map(|p| plane.signed_distance(p).abs())
        .fold(0.0, f64::max)
}
