use crate::error::Result;
use crate::math::transform::transform_point;
use crate::math::{Matrix4, Point3};
use crate::operations::modification::Pocket;
use crate::operations::Construction;
use crate::topology::{FaceRef, NameMaker, Shell};

use super::properties::{as_count, as_point, as_real, read_only, unknown};
use super::{
    expect_points, length_scale, record, require_body, same_point, same_real, BuildContext,
    Creator, CreatorKind, CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// A blind polygonal hole sunk into one face.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleParams {
    pub face: FaceRef,
    /// Center of the mouth, on the face.
    pub center: Point3,
    pub radius: f64,
    pub depth: f64,
    pub segments: usize,
}

impl HoleParams {
    #[must_use]
    pub fn new(face: FaceRef, center: Point3, radius: f64, depth: f64, segments: usize) -> Self {
        Self {
            face,
            center,
            radius,
            depth,
            segments,
        }
    }
}

impl Parameters for HoleParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_body(input, "hole")?;
        let face = self.face.resolve(input)?;
        Pocket::new(face, self.center, self.radius, self.depth, self.segments)
            .execute(input, names, &context.tolerance)
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        let scale = length_scale(matrix);
        self.center = transform_point(matrix, &self.center);
        self.radius *= scale;
        self.depth *= scale;
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.face == other.face
            && self.segments == other.segments
            && same_point(&self.center, &other.center, accuracy)
            && same_real(self.radius, other.radius, accuracy)
            && same_real(self.depth, other.depth, accuracy)
    }

    fn is_similar(&self, _other: &Self) -> bool {
        true
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("face", PropertyValue::Count(self.face.index))
            .with("center", PropertyValue::Point(self.center))
            .with("radius", PropertyValue::Real(self.radius))
            .with("depth", PropertyValue::Real(self.depth))
            .with("segments", PropertyValue::Count(self.segments))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "face" => return Err(read_only(name)),
            "center" => self.center = as_point(name, value)?,
            "radius" => self.radius = as_real(name, value)?,
            "depth" => self.depth = as_real(name, value)?,
            "segments" => self.segments = as_count(name, value)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }

    fn basis_points(&self) -> Vec<Point3> {
        vec![self.center]
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, 1)?;
        self.center = points[0];
        Ok(())
    }
}

/// Sinks a hole into `face` of `input` and records the step.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`](crate::error::OperationError)
/// for an empty shell, bad sizes or a center off the face, and
/// [`OperationError::Infeasible`](crate::error::OperationError) when the
/// hole leaves the face or breaks out of the body.
pub fn create_hole(
    input: &Shell,
    params: HoleParams,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    record(input, Creator::new(names, CreatorKind::Hole(params)), context)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::creators::create_block;
    use crate::geometry::Placement;
    use crate::math::Vector3;
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn slab(context: &BuildContext) -> Shell {
        create_block(Placement::default(), [4.0, 4.0, 2.0], NameMaker::new(1), context)
            .unwrap()
            .0
    }

    fn top(context: &BuildContext) -> FaceRef {
        FaceRef::capture(&slab(context), 1).unwrap()
    }

    #[test]
    fn hole_removes_a_prism_from_the_top() {
        let context = BuildContext::default();
        let params = HoleParams::new(top(&context), p(2.0, 2.0, 2.0), 1.0, 1.0, 8);
        let (shell, creator) = create_hole(&slab(&context), params, NameMaker::new(2), &context)
            .unwrap();
        let prism = 0.5 * 8.0 * (2.0 * PI / 8.0).sin();
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 32.0 - prism, epsilon = 1e-9);
        assert_eq!(shell.face_count(), 6 + 8 + 1);
        assert_eq!(creator.read().basis_points(), vec![p(2.0, 2.0, 2.0)]);
    }

    #[test]
    fn moved_hole_follows_its_center() {
        let context = BuildContext::default();
        let (_, creator) = create_hole(
            &slab(&context),
            HoleParams::new(top(&context), p(1.0, 1.0, 2.0), 0.5, 1.0, 6),
            NameMaker::new(2),
            &context,
        )
        .unwrap();
        creator.move_by(&Vector3::new(2.0, 2.0, 0.0), None).unwrap();
        let bag = creator.read().properties();
        assert_eq!(bag.get("center"), Some(&PropertyValue::Point(p(3.0, 3.0, 2.0))));
        assert!(creator.create_shell(&slab(&context), &context, None).is_ok());
    }

    #[test]
    fn hole_through_the_floor_is_infeasible() {
        let context = BuildContext::default();
        let params = HoleParams::new(top(&context), p(2.0, 2.0, 2.0), 1.0, 3.0, 8);
        let err = create_hole(&slab(&context), params, NameMaker::new(2), &context).unwrap_err();
        assert!(err.to_string().contains("infeasible"));
    }

    #[test]
    fn hole_on_a_renamed_face_is_refused() {
        let context = BuildContext::default();
        let other = create_block(Placement::default(), [4.0, 4.0, 2.0], NameMaker::new(5), &context)
            .unwrap()
            .0;
        let params = HoleParams::new(top(&context), p(2.0, 2.0, 2.0), 1.0, 1.0, 8);
        let err = create_hole(&other, params, NameMaker::new(2), &context).unwrap_err();
        assert!(matches!(
            err,
            crate::error::GeohistError::Topology(crate::error::TopologyError::StaleReference {
                kind: "face",
                index: 1,
                ..
            })
        ));
    }
}
