use crate::error::Result;
use crate::geometry::curve::Line;
use crate::math::transform::{is_reflection, transform_point};
use crate::math::{Matrix4, Point3};
use crate::operations::shaping::Revolve;
use crate::operations::{AuxItem, Construction};
use crate::topology::{NameMaker, Shell};

use super::properties::{as_count, as_point, as_real, as_vector, unknown};
use super::{
    expect_points, record, require_empty, same_line, same_points, same_real, BuildContext,
    Creator, CreatorKind, CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// A planar profile turned about an axis in its plane.
#[derive(Debug, Clone, PartialEq)]
pub struct RevolutionParams {
    pub profile: Vec<Point3>,
    pub axis: Line,
    pub angle: f64,
    pub segments: usize,
}

impl RevolutionParams {
    #[must_use]
    pub fn new(profile: Vec<Point3>, axis: Line, angle: f64, segments: usize) -> Self {
        Self {
            profile,
            axis,
            angle,
            segments,
        }
    }
}

impl Parameters for RevolutionParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_empty(input, "revolution")?;
        let shell = Revolve::new(self.profile.clone(), self.axis.clone(), self.angle, self.segments)
            .execute(names, &context.tolerance)?;
        Ok(Construction {
            shell,
            aux: self.basis_items(),
        })
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        let axis = self.axis.transformed(matrix)?;
        // A reflection reverses the sense of rotation.
        self.axis = if is_reflection(matrix) {
            Line::new(*axis.origin(), -axis.direction())?
        } else {
            axis
        };
        for point in &mut self.profile {
            *point = transform_point(matrix, point);
        }
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        same_points(&self.profile, &other.profile, accuracy)
            && same_line(&self.axis, &other.axis, accuracy)
            && same_real(self.angle, other.angle, accuracy)
            && self.segments == other.segments
    }

    fn is_similar(&self, other: &Self) -> bool {
        self.profile.len() == other.profile.len()
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("angle", PropertyValue::Real(self.angle))
            .with("segments", PropertyValue::Count(self.segments))
            .with("axis_origin", PropertyValue::Point(*self.axis.origin()))
            .with("axis_direction", PropertyValue::Vector(*self.axis.direction()))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "angle" => self.angle = as_real(name, value)?,
            "segments" => self.segments = as_count(name, value)?,
            "axis_origin" => self.axis = Line::new(as_point(name, value)?, *self.axis.direction())?,
            "axis_direction" => self.axis = Line::new(*self.axis.origin(), as_vector(name, value)?)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }

    fn basis_items(&self) -> Vec<AuxItem> {
        vec![AuxItem::Line(self.axis.clone())]
    }

    fn basis_points(&self) -> Vec<Point3> {
        self.profile.clone()
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, self.profile.len())?;
        self.profile = points.to_vec();
        Ok(())
    }
}

/// Revolves a profile into a faceted body on an empty shell and records it.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`](crate::error::OperationError)
/// for a profile that is not planar, does not contain the axis or crosses
/// it, and for an angle outside (0, 2pi].
pub fn create_revolution(
    profile: Vec<Point3>,
    axis: Line,
    angle: f64,
    segments: usize,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(
        names,
        CreatorKind::Revolution(RevolutionParams::new(profile, axis, angle, segments)),
    );
    record(&Shell::new(), creator, context)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, TAU};

    use approx::assert_relative_eq;

    use super::*;
    use crate::math::transform::mirror;
    use crate::math::Vector3;
    use crate::operations::query::{BoundingBox, IsValid, Volume};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn square_profile() -> Vec<Point3> {
        vec![p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 0.0, 1.0), p(1.0, 0.0, 1.0)]
    }

    fn z_axis() -> Line {
        Line::new(Point3::origin(), Vector3::z()).unwrap()
    }

    #[test]
    fn full_turn_builds_a_ring() {
        let context = BuildContext::default();
        let (shell, creator) =
            create_revolution(square_profile(), z_axis(), TAU, 6, NameMaker::new(3), &context)
                .unwrap();
        assert_eq!(shell.face_count(), 24);
        assert!(IsValid::new(context.tolerance).execute(&shell));
        assert_eq!(creator.is_a(), crate::creators::CreatorType::Revolution);
    }

    #[test]
    fn mirrored_quarter_turn_sweeps_the_mirror_image() {
        let context = BuildContext::default();
        let (original, creator) = create_revolution(
            square_profile(),
            z_axis(),
            FRAC_PI_2,
            3,
            NameMaker::new(3),
            &context,
        )
        .unwrap();
        let before = BoundingBox::new().execute(&original).unwrap();
        assert!(before.min.y > -1e-9);

        let m = mirror(&Point3::origin(), &Vector3::y()).unwrap();
        creator.transform(&m, None).unwrap();
        let shell = creator.create_shell(&Shell::new(), &context, None).unwrap();
        let after = BoundingBox::new().execute(&shell).unwrap();
        assert_relative_eq!(after.max.y, -before.min.y, epsilon = 1e-9);
        assert_relative_eq!(after.min.y, -before.max.y, epsilon = 1e-9);
        assert_relative_eq!(
            Volume::new().execute(&shell).unwrap(),
            Volume::new().execute(&original).unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn properties_round_trip_the_axis() {
        let mut params = RevolutionParams::new(square_profile(), z_axis(), TAU, 6);
        let bag = params.properties();
        params
            .set_property("axis_direction", &PropertyValue::Vector(Vector3::new(0.0, 0.0, 2.0)))
            .unwrap();
        assert!(params.is_same(
            &RevolutionParams::new(square_profile(), z_axis(), TAU, 6),
            1e-12
        ));
        assert_eq!(bag.get("segments"), Some(&PropertyValue::Count(6)));
        let zero = PropertyValue::Vector(Vector3::zeros());
        assert!(params.set_property("axis_direction", &zero).is_err());
    }
}
