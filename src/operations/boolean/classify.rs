use crate::error::Result;
use crate::geometry::surface::Plane;
use crate::math::intersect_3d::{line_plane_intersect, LinePlaneRelation};
use crate::math::polygon_3d::{distance_to_polygon_boundary, point_in_polygon_3d};
use crate::math::{Point3, ToleranceConfig, Vector3};
use crate::topology::Shell;

/// Classification of a point relative to a closed shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Classifies a point as inside, outside, or on the boundary of a shell.
///
/// Uses ray casting: shoots a ray from the point and counts face crossings.
/// Odd crossings = inside, even = outside. If the ray is degenerate
/// (grazes an edge or runs inside a face plane), retries with another
/// direction.
///
/// # Errors
///
/// Returns an error if a face references an unknown vertex.
pub fn classify_point(
    point: &Point3,
    shell: &Shell,
    tolerance: &ToleranceConfig,
) -> Result<PointClassification> {
    let faces = collect_face_regions(shell)?;

    for face in &faces {
        if face.plane.signed_distance(point).abs() <= tolerance.metric {
            let foot = face.plane.project(point);
            if face.contains(&foot) || face.boundary_distance(&foot) <= tolerance.metric {
                return Ok(PointClassification::OnBoundary);
            }
        }
    }

    // Skewed directions make grazing hits on axis-aligned bodies unlikely.
    let directions = [
        Vector3::new(1.0, 0.271_828, 0.141_421),
        Vector3::new(0.318_31, 1.0, 0.577_215),
        Vector3::new(0.693_147, 0.414_214, 1.0),
        Vector3::new(-0.5, 0.866_025, 0.223_607),
        Vector3::new(0.0, 0.0, 1.0),
    ];

    for dir in &directions {
        if let RayCastResult::Clear(classification) =
            ray_cast_classify(point, &dir.normalize(), &faces, tolerance.metric)
        {
            return Ok(classification);
        }
    }

    // Every direction grazed something; treat as outside.
    Ok(PointClassification::Outside)
}

/// A face as a plane plus its boundary polygons.
pub(crate) struct FaceRegion {
    pub plane: Plane,
    pub outer: Vec<Point3>,
    pub holes: Vec<Vec<Point3>>,
}

impl FaceRegion {
    /// Whether a point of the face plane lies in the face (holes excluded).
    pub fn contains(&self, point: &Point3) -> bool {
        point_in_polygon_3d(point, &self.outer, &self.plane)
            && !self
                .holes
                .iter()
                .any(|hole| point_in_polygon_3d(point, hole, &self.plane))
    }

    /// Distance from a point of the face plane to the nearest boundary edge.
    pub fn boundary_distance(&self, point: &Point3) -> f64 {
        self.holes
            .iter()
            .map(|hole| distance_to_polygon_boundary(point, hole))
            .fold(distance_to_polygon_boundary(point, &self.outer), f64::min)
    }
}

pub(crate) fn collect_face_regions(shell: &Shell) -> Result<Vec<FaceRegion>> {
    shell
        .faces()
        .iter()
        .map(|face| {
            Ok(FaceRegion {
                plane: face.plane.clone(),
                outer: shell.loop_points(&face.outer_loop)?,
                holes: face
                    .inner_loops
                    .iter()
                    .map(|l| shell.loop_points(l))
                    .collect::<std::result::Result<_, _>>()?,
            })
        })
        .collect()
}

enum RayCastResult {
    Clear(PointClassification),
    Degenerate,
}

fn ray_cast_classify(
    point: &Point3,
    dir: &Vector3,
    faces: &[FaceRegion],
    metric: f64,
) -> RayCastResult {
    let mut crossings = 0u32;

    for face in faces {
        match line_plane_intersect(point, dir, &face.plane) {
            LinePlaneRelation::Point { point: hit, t } => {
                // Only count forward intersections
                if t <= metric {
                    continue;
                }
                if face.boundary_distance(&hit) <= metric {
                    return RayCastResult::Degenerate;
                }
                if face.contains(&hit) {
                    crossings += 1;
                }
            }
            LinePlaneRelation::OnPlane => {
                // Ray lies in the face plane
                return RayCastResult::Degenerate;
            }
            LinePlaneRelation::Parallel => {}
        }
    }

    if crossings % 2 == 1 {
        RayCastResult::Clear(PointClassification::Inside)
    } else {
        RayCastResult::Clear(PointClassification::Outside)
    }
}
