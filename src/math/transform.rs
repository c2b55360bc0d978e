use crate::error::{GeometryError, Result};

use super::{Matrix4, Point3, Vector3, TOLERANCE};

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    if (v.w - 1.0).abs() > TOLERANCE && v.w.abs() > TOLERANCE {
        Point3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    } else {
        Point3::new(v.x, v.y, v.z)
    }
}

/// Transforms a direction vector by a 4x4 matrix (ignoring translation).
#[must_use]
pub fn transform_direction(matrix: &Matrix4, dir: &Vector3) -> Vector3 {
    let v = matrix * nalgebra::Vector4::new(dir.x, dir.y, dir.z, 0.0);
    Vector3::new(v.x, v.y, v.z)
}

/// Determinant of the linear (upper-left 3x3) part of the matrix.
#[must_use]
pub fn linear_determinant(matrix: &Matrix4) -> f64 {
    matrix.fixed_view::<3, 3>(0, 0).into_owned().determinant()
}

/// Returns `true` if the matrix flips orientation (negative determinant).
#[must_use]
pub fn is_reflection(matrix: &Matrix4) -> bool {
    linear_determinant(matrix) < 0.0
}

/// Uniform scale factor of a similarity: a rigid motion combined with a
/// uniform scale and possibly a reflection.
///
/// Recorded sizes such as radii and depths stay exact only under such a
/// matrix, so it is the only kind a recorded history can be moved by.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the matrix is singular,
/// projective, or scales directions unevenly (shear, non-uniform scale).
pub fn similarity_scale(matrix: &Matrix4) -> Result<f64> {
    if linear_determinant(matrix).abs() < TOLERANCE {
        return Err(GeometryError::Degenerate("transformation matrix is singular".into()).into());
    }
    let bottom = matrix.fixed_view::<1, 4>(3, 0);
    if bottom.iter().zip([0.0, 0.0, 0.0, 1.0]).any(|(a, b)| (a - b).abs() > TOLERANCE) {
        return Err(GeometryError::Degenerate("transformation matrix is projective".into()).into());
    }
    let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let gram = linear.transpose() * linear;
    let squared = gram.trace() / 3.0;
    let deviation = (gram - nalgebra::Matrix3::identity() * squared).amax();
    if deviation > TOLERANCE.sqrt() * squared {
        return Err(GeometryError::Degenerate(
            "transformation matrix is not a similarity".into(),
        )
        .into());
    }
    Ok(squared.sqrt())
}

/// Inverse of an affine matrix.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the matrix is singular.
pub fn inverse(matrix: &Matrix4) -> Result<Matrix4> {
    matrix
        .try_inverse()
        .ok_or_else(|| GeometryError::Degenerate("transformation matrix is singular".into()).into())
}

/// Translation by `offset`.
#[must_use]
pub fn translation(offset: &Vector3) -> Matrix4 {
    Matrix4::new_translation(offset)
}

/// Rotation by `angle` radians about the axis through `origin` along `axis`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] if the axis direction is zero-length.
pub fn rotation_about_axis(origin: &Point3, axis: &Vector3, angle: f64) -> Result<Matrix4> {
    let len = axis.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    let axis = axis / len;
    let t_neg = Matrix4::new_translation(&(-origin.coords));
    let t_pos = Matrix4::new_translation(&origin.coords);
    Ok(t_pos * rodrigues(&axis, angle) * t_neg)
}

/// Builds a 4x4 rotation matrix around a unit axis by an angle (Rodrigues).
#[allow(clippy::many_single_char_names)]
fn rodrigues(axis: &Vector3, angle: f64) -> Matrix4 {
    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    #[allow(clippy::suspicious_operation_groupings)]
    Matrix4::new(
        t * x * x + c,     t * x * y - s * z, t * x * z + s * y, 0.0,
        t * x * y + s * z, t * y * y + c,     t * y * z - s * x, 0.0,
        t * x * z - s * y, t * y * z + s * x, t * z * z + c,     0.0,
        0.0,               0.0,               0.0,               1.0,
    )
}

/// Rotates a vector about a unit axis through the origin.
#[must_use]
pub fn rotate_vector(vector: &Vector3, axis: &Vector3, angle: f64) -> Vector3 {
    transform_direction(&rodrigues(axis, angle), vector)
}

/// Reflection through the plane with the given origin and normal.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] if the normal is zero-length.
pub fn mirror(origin: &Point3, normal: &Vector3) -> Result<Matrix4> {
    let len = normal.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    let n = normal / len;
    let householder = nalgebra::Matrix3::identity() - n * n.transpose() * 2.0;
    let mut linear = Matrix4::identity();
    linear.fixed_view_mut::<3, 3>(0, 0).copy_from(&householder);
    let t_neg = Matrix4::new_translation(&(-origin.coords));
    let t_pos = Matrix4::new_translation(&origin.coords);
    Ok(t_pos * linear * t_neg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn similarity_scale_accepts_rigid_and_uniform_motions() {
        let rotation = rotation_about_axis(&p(1.0, 2.0, 0.0), &Vector3::new(1.0, 1.0, 0.0), 0.7).unwrap();
        assert_relative_eq!(similarity_scale(&rotation).unwrap(), 1.0, epsilon = 1e-12);
        let scaled = mirror(&p(0.0, 0.0, 1.0), &Vector3::y()).unwrap() * Matrix4::new_scaling(2.5);
        assert_relative_eq!(similarity_scale(&scaled).unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn similarity_scale_rejects_distortion() {
        let mut shear = Matrix4::identity();
        shear[(0, 1)] = 1.0;
        assert!(similarity_scale(&shear).is_err());
        let stretch = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 2.0, 1.0));
        assert!(similarity_scale(&stretch).is_err());
        let mut projective = Matrix4::identity();
        projective[(3, 0)] = 0.5;
        assert!(similarity_scale(&projective).is_err());
        assert!(similarity_scale(&Matrix4::zeros()).is_err());
    }

    #[test]
    fn rotate_90_around_offset_z_axis() {
        let m = rotation_about_axis(&p(1.0, 0.0, 0.0), &Vector3::z(), FRAC_PI_2).unwrap();
        let q = transform_point(&m, &p(2.0, 0.0, 5.0));
        assert_relative_eq!(q, p(1.0, 1.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_is_rejected() {
        assert!(rotation_about_axis(&p(0.0, 0.0, 0.0), &Vector3::zeros(), 1.0).is_err());
    }

    #[test]
    fn mirror_flips_across_plane() {
        let m = mirror(&p(0.0, 0.0, 1.0), &Vector3::z()).unwrap();
        let q = transform_point(&m, &p(3.0, 4.0, 3.0));
        assert_relative_eq!(q, p(3.0, 4.0, -1.0), epsilon = 1e-12);
        assert!(is_reflection(&m));
    }

    #[test]
    fn directions_ignore_translation() {
        let m = translation(&Vector3::new(5.0, 5.0, 5.0));
        assert_relative_eq!(transform_direction(&m, &Vector3::x()), Vector3::x());
        assert!(!is_reflection(&m));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert!(inverse(&m).is_err());
    }
}
