use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::{OperationError, Result};
use crate::math::polygon_3d::centroid;
use crate::math::{Point3, ToleranceConfig};
use crate::operations::query::BoundingBox;
use crate::topology::{FaceData, Name, Shell, VertexId};

use super::classify::{classify_point, collect_face_regions, PointClassification};
use super::merge::{merge_collinear_edges, merge_coplanar_faces};
use super::{BooleanEngine, MergingFlags};

/// Depth, in metric tolerances, at which face interiors are probed.
const PROBE_DEPTH: f64 = 1e3;

/// A union engine for shells that do not overlap.
///
/// The shells may be disjoint, or touch along faces that coincide exactly
/// (same vertices, opposite orientation); such face pairs are glued away and
/// their vertices fused. Shells whose volumes overlap, or that touch along
/// only part of a face, are rejected as infeasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactUnion;

impl BooleanEngine for ContactUnion {
    #[instrument(
        skip_all,
        fields(first = first.face_count(), second = second.face_count())
    )]
    fn union(
        &self,
        first: &Shell,
        second: &Shell,
        flags: MergingFlags,
        tolerance: &ToleranceConfig,
    ) -> Result<Shell> {
        let mut result = if first.is_empty() {
            second.clone()
        } else if second.is_empty() {
            first.clone()
        } else {
            check_contact(first, second, tolerance)?;
            glue(first, second, tolerance)?
        };

        if flags.merge_faces {
            merge_coplanar_faces(&mut result, tolerance)?;
        }
        if flags.merge_edges {
            merge_collinear_edges(&mut result, tolerance)?;
        }
        debug!(faces = result.face_count(), "union finished");
        Ok(result)
    }
}

/// Copies `second` into `first`, fuses coincident vertices and removes face
/// pairs that cancel.
fn glue(first: &Shell, second: &Shell, tolerance: &ToleranceConfig) -> Result<Shell> {
    let mut result = first.clone();
    let split = result.face_count();
    let copied = result.append(second, Name::clone);

    let mut fused: HashMap<VertexId, VertexId> = HashMap::new();
    for (id, point) in second.vertices() {
        let twin = first
            .vertices()
            .find(|(_, other)| tolerance.same_point(other, point));
        if let (Some((keep, _)), Some(&copy)) = (twin, copied.get(&id)) {
            fused.insert(copy, keep);
        }
    }
    for face in &mut result.faces_mut()[split..] {
        for lp in face.loops_mut() {
            for v in lp.iter_mut() {
                if let Some(&keep) = fused.get(v) {
                    *v = keep;
                }
            }
        }
    }

    let mut doomed: Vec<usize> = Vec::new();
    if !fused.is_empty() {
        let faces = result.faces();
        for j in split..faces.len() {
            let partner = (0..split).find(|&i| {
                !doomed.contains(&i)
                    && faces[i].normal().dot(faces[j].normal()) < 0.0
                    && same_vertex_set(&faces[i], &faces[j])
            });
            if let Some(i) = partner {
                debug!(first = i, second = j - split, "gluing coincident faces");
                doomed.push(i);
                doomed.push(j);
            }
        }
    }
    result.remove_faces(&doomed);
    result.purge_unused_vertices();

    if !result.is_closed() {
        return Err(OperationError::Infeasible(
            "shells touch without sharing whole faces".into(),
        )
        .into());
    }
    Ok(result)
}

fn same_vertex_set(a: &FaceData, b: &FaceData) -> bool {
    let set = |f: &FaceData| -> HashSet<VertexId> {
        f.loops().flat_map(|l| l.iter().copied()).collect()
    };
    let count = |f: &FaceData| f.loops().map(Vec::len).sum::<usize>();
    count(a) == count(b) && set(a) == set(b)
}

/// Rejects shells whose interiors overlap or that touch along part of a
/// face only.
fn check_contact(first: &Shell, second: &Shell, tolerance: &ToleranceConfig) -> Result<()> {
    let bb_first = BoundingBox::new().execute(first)?;
    let bb_second = BoundingBox::new().execute(second)?;
    if !bb_first.overlaps(&bb_second, tolerance.metric) {
        return Ok(());
    }

    let overlap = || -> crate::error::GeohistError {
        OperationError::Infeasible("shell volumes overlap".into()).into()
    };

    for (probe, target) in [(first, second), (second, first)] {
        let corners: Vec<Point3> = target.vertices().map(|(_, v)| *v).collect();
        for (_, vertex) in probe.vertices() {
            match classify_point(vertex, target, tolerance)? {
                PointClassification::Inside => return Err(overlap()),
                PointClassification::OnBoundary
                    if !corners.iter().any(|c| tolerance.same_point(c, vertex)) =>
                {
                    return Err(OperationError::Infeasible(
                        "shells touch along part of a face".into(),
                    )
                    .into());
                }
                _ => {}
            }
        }

        for edge in probe.edges() {
            let a = probe.point(edge.start)?;
            let b = probe.point(edge.end)?;
            let mid = Point3::from((a.coords + b.coords) * 0.5);
            if classify_point(&mid, target, tolerance)? == PointClassification::Inside {
                return Err(overlap());
            }
        }

        let depth = tolerance.metric * PROBE_DEPTH;
        for region in collect_face_regions(probe)? {
            let center = centroid(&region.outer);
            if region.contains(&center) && region.boundary_distance(&center) > depth {
                let sample = center - region.plane.plane_normal() * depth;
                if classify_point(&sample, target, tolerance)? == PointClassification::Inside {
                    return Err(overlap());
                }
            }
        }

        let regions = collect_face_regions(target)?;
        for edge in probe.edges() {
            let a = probe.point(edge.start)?;
            let b = probe.point(edge.end)?;
            for region in &regions {
                let da = region.plane.signed_distance(&a);
                let db = region.plane.signed_distance(&b);
                let crosses = (da > tolerance.metric && db < -tolerance.metric)
                    || (da < -tolerance.metric && db > tolerance.metric);
                if !crosses {
                    continue;
                }
                let hit = a + (b - a) * (da / (da - db));
                if region.contains(&hit) && region.boundary_distance(&hit) > tolerance.metric {
                    return Err(overlap());
                }
            }
        }
    }
    Ok(())
}
