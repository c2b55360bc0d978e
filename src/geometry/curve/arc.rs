use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, ToleranceConfig, Vector3, TOLERANCE};

/// A circular arc swept counter-clockwise about `normal`, starting at
/// `center + radius * start_dir`.
///
/// Arcs are only ever faceted: [`sample`](Self::sample) turns them into the
/// polygon vertices of rounds and hole mouths.
#[derive(Debug, Clone)]
pub struct Arc {
    center: Point3,
    radius: f64,
    normal: Vector3,
    start_dir: Vector3,
    sweep: f64,
}

impl Arc {
    /// Creates an arc of `sweep` radians; a sweep of `2pi` is a full circle.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius or sweep, a zero normal or
    /// start direction, or a start direction not perpendicular to the normal
    /// within `tolerance.angle`.
    pub fn new(
        center: Point3,
        radius: f64,
        normal: Vector3,
        start_dir: Vector3,
        sweep: f64,
        tolerance: &ToleranceConfig,
    ) -> Result<Self> {
        if radius < TOLERANCE || sweep < TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "arc of radius {radius} and sweep {sweep}"
            ))
            .into());
        }
        let (Some(normal), Some(start_dir)) =
            (normal.try_normalize(TOLERANCE), start_dir.try_normalize(TOLERANCE))
        else {
            return Err(GeometryError::ZeroVector.into());
        };
        if normal.dot(&start_dir).abs() > tolerance.angle {
            return Err(GeometryError::Degenerate(
                "arc start direction leaves the arc plane".into(),
            )
            .into());
        }
        Ok(Self {
            center,
            radius,
            normal,
            start_dir,
            sweep: sweep.min(TAU),
        })
    }

    /// The shorter arc around `center` from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points lie at distances from the center that
    /// differ by more than `tolerance.metric`, or are collinear with it.
    pub fn between(
        center: Point3,
        start: &Point3,
        end: &Point3,
        tolerance: &ToleranceConfig,
    ) -> Result<Self> {
        let a = start - center;
        let b = end - center;
        let radius = a.norm();
        if (b.norm() - radius).abs() > tolerance.metric {
            return Err(GeometryError::Degenerate("arc end points are at different radii".into())
                .into());
        }
        let normal = a.cross(&b);
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("arc plane is undefined".into()).into());
        }
        Self::new(center, radius, normal, a, a.angle(&b), tolerance)
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Unit axis of the arc plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Swept angle in radians.
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.sweep
    }

    #[must_use]
    pub fn is_full_circle(&self) -> bool {
        (self.sweep - TAU).abs() < TOLERANCE
    }

    /// Point at `angle` radians from the start.
    #[must_use]
    pub fn point_at(&self, angle: f64) -> Point3 {
        let side = self.normal.cross(&self.start_dir);
        self.center + (self.start_dir * angle.cos() + side * angle.sin()) * self.radius
    }

    /// Vertices of the arc divided into `segments` equal steps, both ends
    /// included. A full circle does not repeat its start point.
    #[must_use]
    pub fn sample(&self, segments: usize) -> Vec<Point3> {
        let segments = segments.max(1);
        let count = if self.is_full_circle() {
            segments
        } else {
            segments + 1
        };
        #[allow(clippy::cast_precision_loss)]
        let step = self.sweep / segments as f64;
        (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let angle = step * i as f64;
                self.point_at(angle)
            })
            .collect()
    }
}
