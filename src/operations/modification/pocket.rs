use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::geometry::curve::Arc;
use crate::math::{Point3, ToleranceConfig};
use crate::operations::boolean::{classify_point, FaceRegion, PointClassification};
use crate::operations::query::IsValid;
use crate::operations::{AuxItem, Construction};
use crate::topology::{index_name, NameMaker, Shell, VertexId};

/// Sinks a blind polygonal hole into a planar face.
///
/// The mouth is a regular polygon inscribed in the circle of `radius` about
/// `center`, which must lie on the face. The walls are named `[main, 0, k]`
/// and the floor `[main, 1]`.
pub struct Pocket {
    face: usize,
    center: Point3,
    radius: f64,
    depth: f64,
    segments: usize,
}

impl Pocket {
    /// Creates a new `Pocket` operation.
    #[must_use]
    pub fn new(face: usize, center: Point3, radius: f64, depth: f64, segments: usize) -> Self {
        Self {
            face,
            center,
            radius,
            depth,
            segments,
        }
    }

    /// Executes the pocket on a copy of `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for non-positive sizes, fewer
    /// than three segments or a center off the face plane, a topology error
    /// for an unknown face index, and [`OperationError::Infeasible`] when
    /// the mouth leaves the face or the pocket breaks out of the body.
    pub fn execute(
        &self,
        shell: &Shell,
        names: &NameMaker,
        tolerance: &ToleranceConfig,
    ) -> Result<Construction> {
        let metric = tolerance.metric;
        for (what, value) in [("radius", self.radius), ("depth", self.depth)] {
            if !value.is_finite() || value <= metric {
                return Err(OperationError::InvalidInput(format!(
                    "hole {what} {value} must be positive"
                ))
                .into());
            }
        }
        if self.segments < 3 {
            return Err(OperationError::InvalidInput(
                "hole needs at least three segments".into(),
            )
            .into());
        }

        let face = shell.face(self.face)?;
        let normal = *face.normal();
        if face.plane.signed_distance(&self.center).abs() > metric {
            return Err(OperationError::InvalidInput(format!(
                "hole center is off face {}",
                self.face
            ))
            .into());
        }

        let circle =
            Arc::new(self.center, self.radius, normal, *face.plane.u_dir(), TAU, tolerance)?;
        let mouth = circle.sample(self.segments);
        let floor: Vec<Point3> = mouth.iter().map(|q| q - normal * self.depth).collect();

        let region = FaceRegion {
            plane: face.plane.clone(),
            outer: shell.loop_points(&face.outer_loop)?,
            holes: face
                .inner_loops
                .iter()
                .map(|l| shell.loop_points(l))
                .collect::<std::result::Result<_, _>>()?,
        };
        let leaves_face = mouth
            .iter()
            .chain(std::iter::once(&self.center))
            .any(|q| !region.contains(q) || region.boundary_distance(q) <= metric)
            || region
                .outer
                .iter()
                .chain(region.holes.iter().flatten())
                .any(|corner| (corner - self.center).norm() <= self.radius + metric);
        if leaves_face {
            return Err(OperationError::Infeasible(format!(
                "hole mouth does not fit inside face {}",
                self.face
            ))
            .into());
        }

        let floor_center = self.center - normal * self.depth;
        let walls = mouth
            .iter()
            .zip(&floor)
            .map(|(q, b)| Point3::from((q.coords + b.coords) * 0.5));
        for probe in floor.iter().copied().chain(std::iter::once(floor_center)).chain(walls) {
            if classify_point(&probe, shell, tolerance)? != PointClassification::Inside {
                return Err(OperationError::Infeasible("hole breaks out of the body".into()).into());
            }
        }
        for (_, vertex) in shell.vertices() {
            let offset = vertex - self.center;
            let below = -offset.dot(&normal);
            let radial = (offset + normal * below).norm();
            if below > metric && below <= self.depth + metric && radial < self.radius + metric {
                return Err(OperationError::Infeasible(
                    "hole cuts through another part of the body".into(),
                )
                .into());
            }
        }

        let mut result = shell.clone();
        let rim: Vec<VertexId> = mouth.iter().map(|q| result.add_vertex(*q)).collect();
        let base: Vec<VertexId> = floor.iter().map(|q| result.add_vertex(*q)).collect();
        result
            .face_mut(self.face)?
            .inner_loops
            .push(rim.iter().rev().copied().collect());

        let n = rim.len();
        for k in 0..n {
            let j = (k + 1) % n;
            result.add_planar_face(
                vec![rim[k], rim[j], base[j], base[k]],
                names.face_name(&[0, index_name(k)]),
            )?;
        }
        result.add_planar_face(base, names.face_name(&[1]))?;

        IsValid::new(*tolerance).check(&result).map_err(|err| {
            OperationError::Infeasible(format!("hole produces an invalid shell: {err}"))
        })?;
        Ok(Construction {
            shell: result,
            aux: vec![AuxItem::Arc(circle), AuxItem::Point(floor_center)],
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::GeohistError;
    use crate::math::Vector3;
    use crate::operations::query::Volume;
    use crate::operations::shaping::Extrude;
    use crate::topology::Name;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// 4 x 4 x 2 slab; face 1 is the top at z = 2.
    fn slab() -> Shell {
        Extrude::new(
            vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(4.0, 4.0, 0.0), p(0.0, 4.0, 0.0)],
            Vector3::new(0.0, 0.0, 2.0),
        )
        .execute(&NameMaker::new(1), &ToleranceConfig::default())
        .unwrap()
    }

    fn pocket(shell: &Shell, center: Point3, radius: f64, depth: f64) -> Result<Construction> {
        Pocket::new(1, center, radius, depth, 8).execute(
            shell,
            &NameMaker::new(5),
            &ToleranceConfig::default(),
        )
    }

    #[test]
    fn pocket_removes_a_prism() {
        let shell = slab();
        let result = pocket(&shell, p(2.0, 2.0, 2.0), 1.0, 1.0).unwrap();

        assert_eq!(result.shell.face_count(), 6 + 8 + 1);
        assert_eq!(result.shell.faces()[1].inner_loops.len(), 1);
        assert!(result.shell.find_face(&Name::new(vec![5, 1])).is_some());
        assert!(result.shell.find_face(&Name::new(vec![5, 0, 7])).is_some());
        let removed = 4.0 * (TAU / 8.0).sin();
        assert_relative_eq!(
            Volume::new().execute(&result.shell).unwrap(),
            32.0 - removed,
            epsilon = 1e-9
        );
    }

    #[test]
    fn pocket_through_the_floor_breaks_out() {
        let err = pocket(&slab(), p(2.0, 2.0, 2.0), 1.0, 3.0).unwrap_err();
        assert!(err.to_string().contains("breaks out"));
    }

    #[test]
    fn mouth_must_fit_the_face() {
        let err = pocket(&slab(), p(0.5, 2.0, 2.0), 1.0, 1.0).unwrap_err();
        assert!(matches!(err, GeohistError::Operation(OperationError::Infeasible(_))));
    }

    #[test]
    fn overlapping_second_pocket_is_rejected() {
        let first = pocket(&slab(), p(2.0, 2.0, 2.0), 1.0, 1.0).unwrap().shell;
        assert!(pocket(&first, p(2.5, 2.0, 2.0), 1.0, 0.5).is_err());
        let second = pocket(&first, p(3.3, 3.3, 2.0), 0.3, 0.5).unwrap().shell;
        assert_eq!(second.faces()[1].inner_loops.len(), 2);
    }

    #[test]
    fn center_off_the_face_is_rejected() {
        let err = pocket(&slab(), p(2.0, 2.0, 1.5), 1.0, 1.0).unwrap_err();
        assert!(matches!(err, GeohistError::Operation(OperationError::InvalidInput(_))));
    }
}
