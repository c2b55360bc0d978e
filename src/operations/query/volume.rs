#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::math::polygon_3d::vector_area;
use crate::topology::{FaceData, Shell};

/// Computes the signed volume enclosed by a shell.
///
/// Applies the divergence theorem face by face: each planar face adds
/// `(1/3) * p . A` where `p` is any point of the face and `A` its vector
/// area (inner loops wind the other way and subtract). The result is
/// positive for outward-oriented shells.
#[derive(Debug, Default)]
pub struct Volume;

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if a face references an unknown vertex.
    pub fn execute(&self, shell: &Shell) -> Result<f64> {
        let moment = sum_over_faces(shell, |face| {
            let mut sum = 0.0;
            for lp in face.loops() {
                let points = shell.loop_points(lp)?;
                if let Some(first) = points.first() {
                    sum += first.coords.dot(&vector_area(&points));
                }
            }
            Ok(sum)
        })?;
        Ok(moment / 3.0)
    }
}

/// Sums a per-face quantity, in face order.
///
/// With the `parallel` feature the faces are evaluated on the rayon pool;
/// the reduction order stays fixed so results are reproducible.
pub(crate) fn sum_over_faces<F>(shell: &Shell, per_face: F) -> Result<f64>
where
    F: Fn(&FaceData) -> Result<f64> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    let values: Vec<f64> = shell
        .faces()
        .par_iter()
        .map(&per_face)
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = shell
        .faces()
        .iter()
        .map(&per_face)
        .collect::<Result<_>>()?;

    Ok(values.iter().sum())
}
