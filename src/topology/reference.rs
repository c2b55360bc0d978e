use super::{Name, Shell};
use crate::error::TopologyError;

/// A face index together with the name the face carried when it was
/// picked.
///
/// Resolving the reference against a rebuilt shell fails unless the face
/// at that index still carries the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceRef {
    pub index: usize,
    pub name: Name,
}

impl FaceRef {
    #[must_use]
    pub fn new(index: usize, name: Name) -> Self {
        Self { index, name }
    }

    /// Records face `index` of `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if there is no such face.
    pub fn capture(shell: &Shell, index: usize) -> Result<Self, TopologyError> {
        Ok(Self::new(index, shell.face(index)?.name.clone()))
    }

    /// The index of the referenced face in `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if the index is gone and
    /// [`TopologyError::StaleReference`] if it now names another face.
    pub fn resolve(&self, shell: &Shell) -> Result<usize, TopologyError> {
        let found = &shell.face(self.index)?.name;
        if *found != self.name {
            return Err(TopologyError::StaleReference {
                kind: "face",
                index: self.index,
                recorded: self.name.to_string(),
                found: found.to_string(),
            });
        }
        Ok(self.index)
    }
}

/// An edge index together with the names of the two faces meeting there.
///
/// The names are kept in sorted order, so the witness does not depend on
/// which face runs the edge forward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub index: usize,
    faces: [Name; 2],
}

impl EdgeRef {
    #[must_use]
    pub fn new(index: usize, first: Name, second: Name) -> Self {
        let faces = if first <= second {
            [first, second]
        } else {
            [second, first]
        };
        Self { index, faces }
    }

    /// Records edge `index` of `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if there is no such edge
    /// and [`TopologyError::InvalidTopology`] for an edge bounding a single
    /// face.
    pub fn capture(shell: &Shell, index: usize) -> Result<Self, TopologyError> {
        let [first, second] = edge_faces(shell, index)?;
        Ok(Self::new(index, first, second))
    }

    /// Names of the two faces, in sorted order.
    #[must_use]
    pub fn faces(&self) -> &[Name; 2] {
        &self.faces
    }

    /// The index of the referenced edge in `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if the index is gone and
    /// [`TopologyError::StaleReference`] if the edge there now joins other
    /// faces.
    pub fn resolve(&self, shell: &Shell) -> Result<usize, TopologyError> {
        let [first, second] = edge_faces(shell, self.index)?;
        let found = Self::new(self.index, first, second);
        if found.faces != self.faces {
            return Err(TopologyError::StaleReference {
                kind: "edge",
                index: self.index,
                recorded: pair(&self.faces),
                found: pair(&found.faces),
            });
        }
        Ok(self.index)
    }
}

/// Records each of `indices` as an edge of `shell`.
///
/// # Errors
///
/// See [`EdgeRef::capture`].
pub fn capture_edges(shell: &Shell, indices: &[usize]) -> Result<Vec<EdgeRef>, TopologyError> {
    indices.iter().map(|&index| EdgeRef::capture(shell, index)).collect()
}

/// Records each of `indices` as a face of `shell`.
///
/// # Errors
///
/// See [`FaceRef::capture`].
pub fn capture_faces(shell: &Shell, indices: &[usize]) -> Result<Vec<FaceRef>, TopologyError> {
    indices.iter().map(|&index| FaceRef::capture(shell, index)).collect()
}

/// Resolves every reference, stopping at the first stale one.
///
/// # Errors
///
/// See [`EdgeRef::resolve`].
pub fn resolve_edges(edges: &[EdgeRef], shell: &Shell) -> Result<Vec<usize>, TopologyError> {
    edges.iter().map(|edge| edge.resolve(shell)).collect()
}

/// Resolves every reference, stopping at the first stale one.
///
/// # Errors
///
/// See [`FaceRef::resolve`].
pub fn resolve_faces(faces: &[FaceRef], shell: &Shell) -> Result<Vec<usize>, TopologyError> {
    faces.iter().map(|face| face.resolve(shell)).collect()
}

fn edge_faces(shell: &Shell, index: usize) -> Result<[Name; 2], TopologyError> {
    let edge = shell.edge(index)?;
    let backward = edge.backward_face.ok_or_else(|| {
        TopologyError::InvalidTopology(format!("edge {index} bounds a single face"))
    })?;
    Ok([
        shell.face(edge.forward_face)?.name.clone(),
        shell.face(backward)?.name.clone(),
    ])
}

fn pair(faces: &[Name; 2]) -> String {
    format!("{}/{}", faces[0], faces[1])
}
