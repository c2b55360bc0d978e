use std::collections::HashSet;
use std::f64::consts::PI;

use crate::error::{GeometryError, OperationError, Result, TopologyError};
use crate::geometry::curve::{Arc, Line};
use crate::math::{Point3, ToleranceConfig, Vector3, TOLERANCE};
use crate::operations::query::IsValid;
use crate::operations::{AuxItem, Construction};
use crate::topology::{index_name, EdgeData, FaceData, NameMaker, Shell, VertexId};

/// Cross-section laid over a blended edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendProfile {
    /// Circular round of the given radius, faceted into `segments` strips.
    Round { radius: f64, segments: usize },
    /// Flat bevel cutting both faces at `distance` from the edge.
    Bevel { distance: f64 },
}

/// Replaces convex edges of a shell with a strip of planar faces.
///
/// Each edge must join two faces at a convex angle, and each of its end
/// vertices must be shared by exactly three faces. The setback of the blend
/// along the other edges at those vertices may not exceed half their
/// length, and edges blended together may not share a vertex.
///
/// Strip faces are named `[main, i, k]` for the `i`-th edge and `k`-th
/// strip. Faces of the input keep their names.
pub struct Blend {
    edges: Vec<usize>,
    profile: BlendProfile,
}

impl Blend {
    /// Creates a new `Blend` operation over the given edge indices.
    #[must_use]
    pub fn new(edges: Vec<usize>, profile: BlendProfile) -> Self {
        Self { edges, profile }
    }

    /// Executes the blend on a copy of `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for bad parameters or edge
    /// selections, [`TopologyError::IndexOutOfRange`] for an edge index the
    /// shell does not have, and [`OperationError::Infeasible`] when the
    /// blend does not fit the local geometry.
    pub fn execute(
        &self,
        shell: &Shell,
        names: &NameMaker,
        tolerance: &ToleranceConfig,
    ) -> Result<Construction> {
        self.validate(tolerance)?;

        let mut seen = HashSet::new();
        let mut used = HashSet::new();
        let mut plans = Vec::with_capacity(self.edges.len());
        for &index in &self.edges {
            if !seen.insert(index) {
                return Err(OperationError::InvalidInput(format!(
                    "edge {index} is selected twice"
                ))
                .into());
            }
            let edge = shell.edge(index)?;
            if !used.insert(edge.start) || !used.insert(edge.end) {
                return Err(OperationError::InvalidInput(
                    "blended edges must not share a vertex".into(),
                )
                .into());
            }
            plans.push(self.plan(shell, index, &edge, tolerance)?);
        }

        let mut result = shell.clone();
        let mut aux = Vec::with_capacity(plans.len());
        for (i, plan) in plans.into_iter().enumerate() {
            plan.apply(&mut result, names, i)?;
            aux.push(plan.aux);
        }
        result.purge_unused_vertices();

        IsValid::new(*tolerance).check(&result).map_err(|err| {
            OperationError::Infeasible(format!("blend produces an invalid shell: {err}"))
        })?;
        Ok(Construction { shell: result, aux })
    }

    fn validate(&self, tolerance: &ToleranceConfig) -> Result<()> {
        if self.edges.is_empty() {
            return Err(OperationError::InvalidInput("no edges to blend".into()).into());
        }
        match self.profile {
            BlendProfile::Round { radius, segments } => {
                if !radius.is_finite() || radius <= tolerance.metric {
                    return Err(OperationError::InvalidInput(format!(
                        "blend radius {radius} must be positive"
                    ))
                    .into());
                }
                if segments == 0 {
                    return Err(OperationError::InvalidInput(
                        "round blend needs at least one segment".into(),
                    )
                    .into());
                }
            }
            BlendProfile::Bevel { distance } => {
                if !distance.is_finite() || distance <= tolerance.metric {
                    return Err(OperationError::InvalidInput(format!(
                        "bevel distance {distance} must be positive"
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    fn plan(
        &self,
        shell: &Shell,
        index: usize,
        edge: &EdgeData,
        tolerance: &ToleranceConfig,
    ) -> Result<EdgePlan> {
        let (forward_face, Some(backward_face)) = (edge.forward_face, edge.backward_face) else {
            return Err(TopologyError::InvalidTopology(format!(
                "edge {index} bounds a single face"
            ))
            .into());
        };

        let a = shell.point(edge.start)?;
        let b = shell.point(edge.end)?;
        let axis = (b - a)
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        let n1 = *shell.face(forward_face)?.normal();
        let n2 = *shell.face(backward_face)?.normal();

        // In-face directions pointing away from the edge.
        let w1 = n1.cross(&axis);
        let w2 = -n2.cross(&axis);
        if w1.dot(&n2) >= -tolerance.angle {
            return Err(
                OperationError::InvalidInput(format!("edge {index} is not convex")).into(),
            );
        }
        let alpha = w1.angle(&w2);
        if alpha >= PI - tolerance.angle {
            return Err(OperationError::Infeasible(format!(
                "faces at edge {index} are tangent"
            ))
            .into());
        }

        let (section, aux) = match self.profile {
            BlendProfile::Round { radius, segments } => {
                let half = alpha / 2.0;
                let setback = radius / half.tan();
                let t1 = a + w1 * setback;
                let t2 = a + w2 * setback;
                let center = a + (w1 + w2).normalize() * (radius / half.sin());
                let arc = Arc::between(center, &t1, &t2, tolerance)?;
                let mut section = arc.sample(segments);
                section[0] = t1;
                section[segments] = t2;
                (section, AuxItem::Arc(arc))
            }
            BlendProfile::Bevel { distance } => {
                let t1 = a + w1 * distance;
                let t2 = a + w2 * distance;
                (vec![t1, t2], AuxItem::Line(Line::new(t1, t2 - t1)?))
            }
        };

        let start_face = third_face(shell, edge.start, forward_face, backward_face)?;
        let end_face = third_face(shell, edge.end, forward_face, backward_face)?;
        let at_start = project_along(shell, start_face, &section, &axis, tolerance)?;
        let at_end = project_along(shell, end_face, &section, &axis, tolerance)?;

        let last = section.len() - 1;
        let checks = [
            (edge.start, at_start[0], neighbour(shell, forward_face, edge.start, false)?),
            (edge.start, at_start[last], neighbour(shell, backward_face, edge.start, true)?),
            (edge.end, at_end[0], neighbour(shell, forward_face, edge.end, true)?),
            (edge.end, at_end[last], neighbour(shell, backward_face, edge.end, false)?),
        ];
        for (corner, tangent, other) in checks {
            let corner = shell.point(corner)?;
            let along = shell.point(other)? - corner;
            let ratio = (tangent - corner).dot(&along) / along.norm_squared();
            if ratio > 0.5 {
                return Err(OperationError::Infeasible(format!(
                    "blend setback at edge {index} exceeds half of an adjacent edge"
                ))
                .into());
            }
        }

        Ok(EdgePlan {
            start: edge.start,
            end: edge.end,
            forward_face,
            backward_face,
            start_face,
            end_face,
            at_start,
            at_end,
            aux,
        })
    }
}

/// Where the blend of one edge meets the surrounding faces.
struct EdgePlan {
    start: VertexId,
    end: VertexId,
    forward_face: usize,
    backward_face: usize,
    start_face: usize,
    end_face: usize,
    /// Section points on the start face, from the forward face round to the
    /// backward face.
    at_start: Vec<Point3>,
    at_end: Vec<Point3>,
    aux: AuxItem,
}

impl EdgePlan {
    fn apply(&self, shell: &mut Shell, names: &NameMaker, blend_index: usize) -> Result<()> {
        let starts: Vec<VertexId> = self.at_start.iter().map(|p| shell.add_vertex(*p)).collect();
        let ends: Vec<VertexId> = self.at_end.iter().map(|p| shell.add_vertex(*p)).collect();
        let last = starts.len() - 1;

        let forward = shell.face_mut(self.forward_face)?;
        splice_vertex(forward, self.start, &[starts[0]]);
        splice_vertex(forward, self.end, &[ends[0]]);
        let backward = shell.face_mut(self.backward_face)?;
        splice_vertex(backward, self.start, &[starts[last]]);
        splice_vertex(backward, self.end, &[ends[last]]);

        let reversed: Vec<VertexId> = starts.iter().rev().copied().collect();
        splice_vertex(shell.face_mut(self.start_face)?, self.start, &reversed);
        splice_vertex(shell.face_mut(self.end_face)?, self.end, &ends);

        for k in 0..last {
            shell.add_planar_face(
                vec![ends[k], starts[k], starts[k + 1], ends[k + 1]],
                names.face_name(&[index_name(blend_index), index_name(k)]),
            )?;
        }
        Ok(())
    }
}

/// The face at `vertex` other than the two faces of the blended edge.
fn third_face(shell: &Shell, vertex: VertexId, first: usize, second: usize) -> Result<usize> {
    let faces = shell.vertex_faces(vertex);
    if faces.len() != 3 {
        return Err(OperationError::InvalidInput(format!(
            "blend end vertex joins {} faces, expected 3",
            faces.len()
        ))
        .into());
    }
    faces
        .into_iter()
        .find(|&f| f != first && f != second)
        .ok_or_else(|| {
            TopologyError::InvalidTopology("blended edge has no end face".into()).into()
        })
}

/// Vertex before (`after == false`) or after `vertex` in the loop of `face`
/// that contains it.
fn neighbour(shell: &Shell, face: usize, vertex: VertexId, after: bool) -> Result<VertexId> {
    shell
        .face(face)?
        .loops()
        .find_map(|lp| {
            let pos = lp.iter().position(|&v| v == vertex)?;
            let n = lp.len();
            Some(if after { lp[(pos + 1) % n] } else { lp[(pos + n - 1) % n] })
        })
        .ok_or_else(|| {
            TopologyError::EntityNotFound(format!("vertex in loop of face {face}")).into()
        })
}

fn project_along(
    shell: &Shell,
    face: usize,
    points: &[Point3],
    axis: &Vector3,
    tolerance: &ToleranceConfig,
) -> Result<Vec<Point3>> {
    let plane = &shell.face(face)?.plane;
    let along = plane.plane_normal().dot(axis);
    if along.abs() <= tolerance.angle {
        return Err(OperationError::Infeasible(format!(
            "end face {face} runs parallel to the blended edge"
        ))
        .into());
    }
    Ok(points
        .iter()
        .map(|q| q - axis * (plane.signed_distance(q) / along))
        .collect())
}

fn splice_vertex(face: &mut FaceData, vertex: VertexId, with: &[VertexId]) {
    for lp in face.loops_mut() {
        if let Some(pos) = lp.iter().position(|&v| v == vertex) {
            lp.splice(pos..=pos, with.iter().copied());
        }
    }
}
