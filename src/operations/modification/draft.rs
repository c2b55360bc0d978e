use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::intersect_3d::{plane_plane_intersect, planes_common_point, PlanePairRelation};
use crate::math::transform::rotate_vector;
use crate::math::ToleranceConfig;
use crate::operations::query::IsValid;
use crate::operations::{AuxItem, Construction};
use crate::topology::{Shell, VertexId};

/// Tilts faces about the line where they cross a neutral plane.
///
/// Each drafted face turns by `angle` about its hinge line, its normal
/// leaning towards the neutral plane's normal, so a positive angle narrows
/// the body in that direction. Vertices of the drafted faces are moved to
/// the new meeting points of their faces; the topology is unchanged.
pub struct Draft {
    neutral: Plane,
    angle: f64,
    faces: Vec<usize>,
}

impl Draft {
    /// Creates a new `Draft` operation.
    #[must_use]
    pub fn new(neutral: Plane, angle: f64, faces: Vec<usize>) -> Self {
        Self {
            neutral,
            angle,
            faces,
        }
    }

    /// Executes the draft on a copy of `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for an angle outside
    /// (-90°, 90°) or an empty or repeated face selection, a topology error
    /// for an unknown face index, and [`OperationError::Infeasible`] when a
    /// face is parallel to the neutral plane, a vertex loses its meeting
    /// point, or a face flips.
    pub fn execute(&self, shell: &Shell, tolerance: &ToleranceConfig) -> Result<Construction> {
        if !self.angle.is_finite() || self.angle.abs() >= FRAC_PI_2 - tolerance.angle {
            return Err(OperationError::InvalidInput(format!(
                "draft angle {} must lie strictly between -90 and 90 degrees",
                self.angle.to_degrees()
            ))
            .into());
        }
        if self.faces.is_empty() {
            return Err(OperationError::InvalidInput("no faces to draft".into()).into());
        }

        let mut result = shell.clone();
        let mut aux = vec![AuxItem::Plane(self.neutral.clone())];
        let lift = self.neutral.plane_normal();
        let mut moved: Vec<VertexId> = Vec::new();

        for (i, &index) in self.faces.iter().enumerate() {
            if self.faces[..i].contains(&index) {
                return Err(OperationError::InvalidInput(format!(
                    "face {index} is selected twice"
                ))
                .into());
            }
            let face = shell.face(index)?;
            let PlanePairRelation::IntersectionLine { origin, direction } = plane_plane_intersect(
                &face.plane,
                &self.neutral,
                tolerance.angle,
                tolerance.metric,
            ) else {
                return Err(OperationError::Infeasible(format!(
                    "face {index} is parallel to the neutral plane"
                ))
                .into());
            };

            let normal = face.normal();
            let pivot = normal.cross(lift).normalize();
            let tilted = rotate_vector(normal, &pivot, self.angle);
            result.face_mut(index)?.plane = Plane::from_normal(origin, tilted)?;
            aux.push(AuxItem::Line(Line::new(origin, direction)?));
            moved.extend(face.loops().flatten().copied());
        }

        moved.sort_unstable();
        moved.dedup();
        let mut targets = Vec::with_capacity(moved.len());
        for vertex in moved {
            let faces = result.vertex_faces(vertex);
            let planes: Vec<&Plane> = faces.iter().map(|&f| &result.faces()[f].plane).collect();
            let point = planes_common_point(&planes, tolerance.metric).map_err(|err| {
                OperationError::Infeasible(format!("drafted faces lose a vertex: {err}"))
            })?;
            targets.push((vertex, point));
        }
        for (vertex, point) in targets {
            *result.vertex_mut(vertex)? = point;
        }
        debug!(faces = self.faces.len(), "draft applied");

        IsValid::new(*tolerance).check(&result).map_err(|err| {
            OperationError::Infeasible(format!("draft flips or collapses a face: {err}"))
        })?;
        Ok(Construction { shell: result, aux })
    }
}
