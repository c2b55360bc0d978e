use std::collections::HashMap;

use super::face::{loop_edges, FaceData};
use super::VertexId;

/// A derived edge of a shell.
///
/// Edges are not stored; they are enumerated from the face loops in face
/// order, each unordered vertex pair receiving the next index the first time
/// it is met. The enumeration is deterministic for a given shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
    /// Start vertex as traversed by `forward_face`.
    pub start: VertexId,
    /// End vertex as traversed by `forward_face`.
    pub end: VertexId,
    /// Index of the face whose loop runs `start -> end`.
    pub forward_face: usize,
    /// Index of the face whose loop runs `end -> start`, if any.
    pub backward_face: Option<usize>,
}

impl EdgeData {
    /// Returns `true` if the edge joins the two vertices (either direction).
    #[must_use]
    pub fn joins(&self, a: VertexId, b: VertexId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}

pub(crate) fn collect_edges(faces: &[FaceData]) -> Vec<EdgeData> {
    let mut index: HashMap<(VertexId, VertexId), usize> = HashMap::new();
    let mut edges: Vec<EdgeData> = Vec::new();

    for (face_index, face) in faces.iter().enumerate() {
        for lp in face.loops() {
            for (a, b) in loop_edges(lp) {
                let key = if a < b { (a, b) } else { (b, a) };
                if let Some(&edge_index) = index.get(&key) {
                    let edge = &mut edges[edge_index];
                    if edge.backward_face.is_none() && edge.start == b {
                        edge.backward_face = Some(face_index);
                    }
                } else {
                    index.insert(key, edges.len());
                    edges.push(EdgeData {
                        start: a,
                        end: b,
                        forward_face: face_index,
                        backward_face: None,
                    });
                }
            }
        }
    }
    edges
}
