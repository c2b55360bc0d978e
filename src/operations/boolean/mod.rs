mod classify;
mod contact;
mod merge;

use std::fmt;

pub use classify::{classify_point, PointClassification};
pub(crate) use classify::{collect_face_regions, FaceRegion};
pub use contact::ContactUnion;
pub use merge::{merge_collinear_edges, merge_coplanar_faces};

use crate::error::Result;
use crate::math::ToleranceConfig;
use crate::topology::Shell;

/// Post-processing requested from a boolean operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MergingFlags {
    /// Fuse adjacent coplanar faces into one.
    pub merge_faces: bool,
    /// Join collinear edges by dropping the vertex between them.
    pub merge_edges: bool,
}

impl MergingFlags {
    /// Creates merging flags.
    #[must_use]
    pub fn new(merge_faces: bool, merge_edges: bool) -> Self {
        Self {
            merge_faces,
            merge_edges,
        }
    }
}

/// Boolean operations on closed shells, as consumed by creators.
///
/// Implementations must not modify their inputs and must produce the same
/// result for the same inputs.
pub trait BooleanEngine: fmt::Debug + Send + Sync {
    /// Unites two shells.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot realise the union.
    fn union(
        &self,
        first: &Shell,
        second: &Shell,
        flags: MergingFlags,
        tolerance: &ToleranceConfig,
    ) -> Result<Shell>;
}
