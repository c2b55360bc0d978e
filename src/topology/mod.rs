pub mod edge;
pub mod face;
pub mod name;
pub mod reference;

pub use edge::EdgeData;
pub use face::{loop_edges, FaceData};
pub use name::{index_name, Name, NameMaker, SimpleName};
pub use reference::{
    capture_edges, capture_faces, resolve_edges, resolve_faces, EdgeRef, FaceRef,
};

use std::collections::{HashMap, HashSet};

use crate::error::TopologyError;
use crate::geometry::surface::Plane;
use crate::math::{Point3, ToleranceConfig};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle of a vertex inside one [`Shell`].
    ///
    /// Handles are generational: a handle to a purged vertex never aliases
    /// a vertex inserted later.
    pub struct VertexId;
}

/// A closed polyhedral boundary representation.
///
/// Vertices live in a generational arena and faces reference them by ID.
/// Faces are kept in an ordered list; a face index is its position in that
/// list and stays valid until faces are removed. Edges are derived from the
/// face loops on demand (see [`EdgeData`]).
///
/// A shell is a plain value: cloning it deep-copies the whole body.
#[derive(Debug, Clone, Default)]
pub struct Shell {
    vertices: SlotMap<VertexId, Point3>,
    faces: Vec<FaceData>,
}

impl Shell {
    /// Creates a new, empty shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the shell has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(point)
    }

    /// Borrowed position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this shell.
    pub fn vertex(&self, id: VertexId) -> Result<&Point3, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Mutable position of a vertex, for in-place moves.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this shell.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Point3, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this shell.
    pub fn point(&self, id: VertexId) -> Result<Point3, TopologyError> {
        self.vertex(id).copied()
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Point3)> {
        self.vertices.iter()
    }

    /// Mutable iteration over all vertices.
    pub fn vertices_mut(&mut self) -> impl Iterator<Item = (VertexId, &mut Point3)> {
        self.vertices.iter_mut()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Indices of the faces whose loops pass through `vertex`.
    #[must_use]
    pub fn vertex_faces(&self, vertex: VertexId) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains_vertex(vertex))
            .map(|(i, _)| i)
            .collect()
    }

    /// Removes vertices no face refers to.
    pub fn purge_unused_vertices(&mut self) {
        let used: HashSet<VertexId> = self
            .faces
            .iter()
            .flat_map(|f| f.loops().flat_map(|l| l.iter().copied()))
            .collect();
        self.vertices.retain(|id, _| used.contains(&id));
    }

    // --- Face operations ---

    /// Appends a face and returns its index.
    pub fn add_face(&mut self, data: FaceData) -> usize {
        self.faces.push(data);
        self.faces.len() - 1
    }

    /// Appends a face bounded by `outer_loop`, fitting its plane to the
    /// loop's vertices. Returns the new face index.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is unknown or the loop has no area.
    pub fn add_planar_face(
        &mut self,
        outer_loop: Vec<VertexId>,
        name: Name,
    ) -> crate::error::Result<usize> {
        let points = self.loop_points(&outer_loop)?;
        let plane = Plane::from_polygon(&points)?;
        Ok(self.add_face(FaceData::new(plane, outer_loop, name)))
    }

    /// Returns a reference to the face at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if there is no such face.
    pub fn face(&self, index: usize) -> Result<&FaceData, TopologyError> {
        let count = self.faces.len();
        self.faces.get(index).ok_or(TopologyError::IndexOutOfRange {
            kind: "face",
            index,
            count,
        })
    }

    /// Returns a mutable reference to the face at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if there is no such face.
    pub fn face_mut(&mut self, index: usize) -> Result<&mut FaceData, TopologyError> {
        let count = self.faces.len();
        self.faces.get_mut(index).ok_or(TopologyError::IndexOutOfRange {
            kind: "face",
            index,
            count,
        })
    }

    /// All faces in index order.
    #[must_use]
    pub fn faces(&self) -> &[FaceData] {
        &self.faces
    }

    /// Mutable access to all faces.
    pub fn faces_mut(&mut self) -> &mut [FaceData] {
        &mut self.faces
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Removes the faces with the given indices, keeping the order of the
    /// remaining ones.
    pub fn remove_faces(&mut self, indices: &[usize]) {
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let mut index = 0;
        self.faces.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
    }

    /// Index of the face carrying `name`.
    #[must_use]
    pub fn find_face(&self, name: &Name) -> Option<usize> {
        self.faces.iter().position(|f| &f.name == name)
    }

    /// Resolves a loop of vertex IDs to positions.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is not part of this shell.
    pub fn loop_points(&self, vertices: &[VertexId]) -> Result<Vec<Point3>, TopologyError> {
        vertices.iter().map(|&v| self.point(v)).collect()
    }

    // --- Edges ---

    /// Enumerates the edges of the shell in deterministic order.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeData> {
        edge::collect_edges(&self.faces)
    }

    /// Returns the edge at `index` of [`edges`](Self::edges).
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if there is no such edge.
    pub fn edge(&self, index: usize) -> Result<EdgeData, TopologyError> {
        let edges = self.edges();
        let count = edges.len();
        edges.get(index).copied().ok_or(TopologyError::IndexOutOfRange {
            kind: "edge",
            index,
            count,
        })
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Returns `true` if every directed loop edge is matched by exactly one
    /// opposite edge of another loop.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let mut directed: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for face in &self.faces {
            for lp in face.loops() {
                for key in loop_edges(lp) {
                    *directed.entry(key).or_insert(0) += 1;
                }
            }
        }
        directed
            .iter()
            .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1))
    }

    // --- Whole-shell edits ---

    /// Copies every vertex and face of `other` into this shell, renaming the
    /// faces with `rename`. Returns the vertex correspondence.
    pub fn append(
        &mut self,
        other: &Shell,
        mut rename: impl FnMut(&Name) -> Name,
    ) -> HashMap<VertexId, VertexId> {
        let mut map = HashMap::with_capacity(other.vertices.len());
        for (id, point) in &other.vertices {
            map.insert(id, self.vertices.insert(*point));
        }
        for face in &other.faces {
            let remap = |l: &Vec<VertexId>| -> Vec<VertexId> {
                l.iter().filter_map(|v| map.get(v).copied()).collect()
            };
            self.faces.push(FaceData {
                plane: face.plane.clone(),
                outer_loop: remap(&face.outer_loop),
                inner_loops: face.inner_loops.iter().map(remap).collect(),
                name: rename(&face.name),
            });
        }
        map
    }

    /// Reverses the orientation of every face.
    pub fn reverse(&mut self) {
        for face in &mut self.faces {
            face.reverse();
        }
    }

    /// Compares two shells face by face: same names, same planes and loops
    /// through the same positions within `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Shell, tolerance: &ToleranceConfig) -> bool {
        if self.faces.len() != other.faces.len() || self.vertices.len() != other.vertices.len()
        {
            return false;
        }
        self.faces.iter().zip(&other.faces).all(|(a, b)| {
            a.name == b.name
                && a.plane
                    .is_same(&b.plane, tolerance.metric, tolerance.angle)
                && a.inner_loops.len() == b.inner_loops.len()
                && a.loops().zip(b.loops()).all(|(la, lb)| {
                    la.len() == lb.len()
                        && la.iter().zip(lb).all(|(&va, &vb)| {
                            match (self.point(va), other.point(vb)) {
                                (Ok(pa), Ok(pb)) => tolerance.same_point(&pa, &pb),
                                _ => false,
                            }
                        })
                })
        })
    }
}
