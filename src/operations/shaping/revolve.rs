use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::polygon_3d::{newell_normal, planarity_deviation};
use crate::math::transform::{rotation_about_axis, transform_point};
use crate::math::{Point3, ToleranceConfig, TOLERANCE};
use crate::operations::query::Volume;
use crate::topology::{index_name, NameMaker, Shell, VertexId};

/// Revolves a planar polygon profile around an axis into a faceted body.
///
/// The sweep is split into `segments` equal steps; every profile edge and
/// step produce one planar side face named `[main, 0, edge, step]`. Profile
/// points on the axis collapse to a single vertex, turning the adjacent
/// quads into triangles, and profile edges lying on the axis produce no
/// face. A partial sweep is closed by the start cap `[main, 1, 0]` and the
/// end cap `[main, 1, 1]`.
pub struct Revolve {
    profile: Vec<Point3>,
    axis: Line,
    angle: f64,
    segments: usize,
}

struct ProfilePoint {
    point: Point3,
    on_axis: bool,
}

impl Revolve {
    /// Creates a new `Revolve` operation.
    #[must_use]
    pub fn new(profile: Vec<Point3>, axis: Line, angle: f64, segments: usize) -> Self {
        Self {
            profile,
            axis,
            angle,
            segments,
        }
    }

    /// Executes the revolution, returning a new closed shell.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the profile is not a
    /// planar polygon containing the axis, crosses the axis, or if the angle
    /// or segment count is out of range.
    pub fn execute(&self, names: &NameMaker, tolerance: &ToleranceConfig) -> Result<Shell> {
        let full = self.validate(tolerance)?;
        let profile = self.classify_profile(tolerance)?;
        let n = profile.len();

        // Vertex grid: one column per sweep step, axis points shared.
        let columns = if full { self.segments } else { self.segments + 1 };
        let mut shell = Shell::new();
        let axis_vertices: Vec<Option<VertexId>> = profile
            .iter()
            .map(|pp| pp.on_axis.then(|| shell.add_vertex(pp.point)))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let step = self.angle / self.segments as f64;
        let mut grid: Vec<Vec<VertexId>> = Vec::with_capacity(columns);
        for k in 0..columns {
            #[allow(clippy::cast_precision_loss)]
            let rotation =
                rotation_about_axis(self.axis.origin(), self.axis.direction(), step * k as f64)?;
            let column = profile
                .iter()
                .zip(&axis_vertices)
                .map(|(pp, shared)| {
                    shared.unwrap_or_else(|| shell.add_vertex(transform_point(&rotation, &pp.point)))
                })
                .collect();
            grid.push(column);
        }

        let column = |k: usize| &grid[k % columns];
        for i in 0..n {
            let j = (i + 1) % n;
            if profile[i].on_axis && profile[j].on_axis {
                continue;
            }
            for k in 0..self.segments {
                let quad = collapse_repeats(vec![
                    column(k)[i],
                    column(k)[j],
                    column(k + 1)[j],
                    column(k + 1)[i],
                ]);
                shell.add_planar_face(quad, names.face_name(&[0, index_name(i), index_name(k)]))?;
            }
        }

        if !full {
            let start: Vec<VertexId> = grid[0].iter().rev().copied().collect();
            shell.add_planar_face(start, names.face_name(&[1, 0]))?;
            shell.add_planar_face(grid[columns - 1].clone(), names.face_name(&[1, 1]))?;
        }

        let volume = Volume::new().execute(&shell)?;
        if volume.abs() <= tolerance.metric.powi(3) {
            return Err(OperationError::Infeasible("revolution encloses no volume".into()).into());
        }
        if volume < 0.0 {
            shell.reverse();
        }
        Ok(shell)
    }

    /// Checks the parameters; returns whether the sweep is a full turn.
    fn validate(&self, tolerance: &ToleranceConfig) -> Result<bool> {
        if self.profile.len() < 3 {
            return Err(OperationError::InvalidInput(
                "revolve profile needs at least three points".into(),
            )
            .into());
        }
        if !(self.angle > TOLERANCE && self.angle <= TAU + tolerance.angle) {
            return Err(OperationError::InvalidInput(format!(
                "revolve angle {} is outside (0, 2pi]",
                self.angle
            ))
            .into());
        }
        let full = (self.angle - TAU).abs() <= tolerance.angle;
        let min_segments = if full { 3 } else { 1 };
        if self.segments < min_segments {
            return Err(OperationError::InvalidInput(format!(
                "revolve needs at least {min_segments} segments"
            ))
            .into());
        }

        let normal = newell_normal(&self.profile)
            .map_err(|_| OperationError::InvalidInput("revolve profile has no area".into()))?;
        let plane = Plane::from_polygon(&self.profile)?;
        if planarity_deviation(&self.profile, &plane) > tolerance.metric {
            return Err(OperationError::InvalidInput("revolve profile is not planar".into()).into());
        }
        if plane.signed_distance(self.axis.origin()).abs() > tolerance.metric
            || normal.dot(self.axis.direction()).abs() > tolerance.angle
        {
            return Err(OperationError::InvalidInput(
                "revolve axis must lie in the profile plane".into(),
            )
            .into());
        }
        Ok(full)
    }

    /// Marks the profile points on the axis and checks that the profile stays
    /// on one side of it.
    fn classify_profile(&self, tolerance: &ToleranceConfig) -> Result<Vec<ProfilePoint>> {
        let normal = newell_normal(&self.profile)?;
        let side_dir = normal.cross(self.axis.direction());

        let mut side = 0.0_f64;
        let mut profile = Vec::with_capacity(self.profile.len());
        for point in &self.profile {
            let on_axis = self.axis.distance_to(point) <= tolerance.metric;
            if !on_axis {
                let s = (point - self.axis.origin()).dot(&side_dir).signum();
                if side != 0.0 && s != side {
                    return Err(OperationError::InvalidInput(
                        "revolve profile crosses the axis".into(),
                    )
                    .into());
                }
                side = s;
            }
            profile.push(ProfilePoint {
                point: *point,
                on_axis,
            });
        }
        Ok(profile)
    }
}

/// Drops consecutive repeats (including the wrap-around) from a loop.
fn collapse_repeats(mut vertices: Vec<VertexId>) -> Vec<VertexId> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Vector3;
    use crate::operations::query::IsValid;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn z_axis() -> Line {
        Line::new(p(0.0, 0.0, 0.0), Vector3::z()).unwrap()
    }

    /// Faceted cylinder volume: n triangles of the inscribed polygon times h.
    fn prism_volume(radius: f64, height: f64, segments: usize) -> f64 {
        let n = segments as f64;
        0.5 * n * radius * radius * (TAU / n).sin() * height
    }

    #[test]
    fn rectangle_on_axis_gives_faceted_cylinder() {
        let profile = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 2.0), p(0.0, 0.0, 2.0)];
        let shell = Revolve::new(profile, z_axis(), TAU, 8)
            .execute(&NameMaker::new(1), &ToleranceConfig::default())
            .unwrap();

        // 8 bottom triangles + 8 sides + 8 top triangles
        assert_eq!(shell.face_count(), 24);
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
        assert_relative_eq!(
            Volume::new().execute(&shell).unwrap(),
            prism_volume(1.0, 2.0, 8),
            epsilon = 1e-9
        );
    }

    #[test]
    fn off_axis_profile_gives_faceted_ring() {
        let profile = vec![p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(3.0, 0.0, 1.0), p(2.0, 0.0, 1.0)];
        let shell = Revolve::new(profile, z_axis(), TAU, 6)
            .execute(&NameMaker::new(1), &ToleranceConfig::default())
            .unwrap();
        assert_eq!(shell.face_count(), 24);
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
        let expected = prism_volume(3.0, 1.0, 6) - prism_volume(2.0, 1.0, 6);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn partial_sweep_is_capped() {
        let profile = vec![p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 0.0, 1.0), p(1.0, 0.0, 1.0)];
        let shell = Revolve::new(profile, z_axis(), FRAC_PI_2, 3)
            .execute(&NameMaker::new(4), &ToleranceConfig::default())
            .unwrap();
        assert_eq!(shell.face_count(), 4 * 3 + 2);
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
        assert!(shell.find_face(&NameMaker::new(4).face_name(&[1, 1])).is_some());
    }

    #[test]
    fn half_turn_with_profile_on_axis() {
        let profile = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 1.0)];
        let shell = Revolve::new(profile, z_axis(), PI, 4)
            .execute(&NameMaker::new(1), &ToleranceConfig::default())
            .unwrap();
        assert!(IsValid::new(ToleranceConfig::default()).execute(&shell));
    }

    #[test]
    fn profile_crossing_axis_is_rejected() {
        let profile = vec![p(-1.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 1.0), p(-1.0, 0.0, 1.0)];
        let result = Revolve::new(profile, z_axis(), TAU, 8)
            .execute(&NameMaker::new(1), &ToleranceConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn axis_off_profile_plane_is_rejected() {
        let profile = vec![p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 0.0, 1.0)];
        let axis = Line::new(p(0.0, 1.0, 0.0), Vector3::z()).unwrap();
        let result =
            Revolve::new(profile, axis, TAU, 8).execute(&NameMaker::new(1), &ToleranceConfig::default());
        assert!(result.is_err());
    }
}
