use crate::error::{Result, TopologyError};
use crate::math::Point3;
use crate::topology::Shell;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Returns `true` if the two boxes, each grown by `margin`, overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb, margin: f64) -> bool {
        (0..3).all(|i| {
            self.min[i] <= other.max[i] + margin && other.min[i] <= self.max[i] + margin
        })
    }
}

/// Computes the axis-aligned bounding box of a shell.
#[derive(Debug, Default)]
pub struct BoundingBox;

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] if the shell has no
    /// vertices.
    pub fn execute(&self, shell: &Shell) -> Result<Aabb> {
        let mut points = shell.vertices().map(|(_, v)| *v);
        let first = points
            .next()
            .ok_or_else(|| TopologyError::InvalidTopology("empty shell has no extent".into()))?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Ok(Aabb { min, max })
    }
}
