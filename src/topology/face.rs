use crate::geometry::surface::Plane;
use crate::math::Vector3;

use super::name::Name;
use super::VertexId;

/// Data associated with a topological face.
///
/// A face is a planar region bounded by an outer loop and optionally inner
/// loops (holes). The outer loop winds counter-clockwise about the outward
/// normal, inner loops clockwise.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The plane carrying the face, oriented along the outward normal.
    pub plane: Plane,
    /// The outer boundary loop.
    pub outer_loop: Vec<VertexId>,
    /// Inner boundary loops (holes).
    pub inner_loops: Vec<Vec<VertexId>>,
    /// Persistent name of the face.
    pub name: Name,
}

impl FaceData {
    /// Creates a face without holes.
    #[must_use]
    pub fn new(plane: Plane, outer_loop: Vec<VertexId>, name: Name) -> Self {
        Self {
            plane,
            outer_loop,
            inner_loops: Vec::new(),
            name,
        }
    }

    /// Iterates over the outer loop followed by the inner loops.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<VertexId>> {
        std::iter::once(&self.outer_loop).chain(self.inner_loops.iter())
    }

    /// Mutable counterpart of [`loops`](Self::loops).
    pub fn loops_mut(&mut self) -> impl Iterator<Item = &mut Vec<VertexId>> {
        std::iter::once(&mut self.outer_loop).chain(self.inner_loops.iter_mut())
    }

    /// Returns `true` if any loop of the face passes through `vertex`.
    #[must_use]
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.loops().any(|l| l.contains(&vertex))
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.plane.plane_normal()
    }

    /// Reverses the orientation of the face.
    pub fn reverse(&mut self) {
        self.plane = self.plane.reversed();
        for l in self.loops_mut() {
            l.reverse();
        }
    }
}

/// Iterates over the directed edges `(v[i], v[i + 1])` of a closed loop.
pub fn loop_edges(vertices: &[VertexId]) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}
