/// Precision settings threaded through every shell construction.
///
/// Passed explicitly so that rebuilds are reproducible regardless of what
/// other documents in the same process are doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceConfig {
    /// Distance below which two points are considered coincident.
    pub metric: f64,
    /// Angle (radians) below which two directions are considered parallel.
    pub angle: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            metric: 1e-6,
            angle: 1e-6,
        }
    }
}

impl ToleranceConfig {
    /// Sets the coincidence distance.
    #[must_use]
    pub fn with_metric(mut self, metric: f64) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the parallelism angle.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Returns `true` if two points coincide within the metric tolerance.
    #[must_use]
    pub fn same_point(&self, a: &super::Point3, b: &super::Point3) -> bool {
        (a - b).norm() <= self.metric
    }

    /// Returns `true` if two unit vectors point the same way within the
    /// angular tolerance.
    #[must_use]
    pub fn same_direction(&self, a: &super::Vector3, b: &super::Vector3) -> bool {
        a.dot(b) > 0.0 && a.cross(b).norm() <= self.angle
    }
}
