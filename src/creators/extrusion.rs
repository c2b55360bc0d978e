use crate::error::Result;
use crate::geometry::curve::Line;
use crate::math::transform::{transform_direction, transform_point};
use crate::math::{Matrix4, Point3, Vector3};
use crate::operations::shaping::Extrude;
use crate::operations::{AuxItem, Construction};
use crate::topology::{NameMaker, Shell};

use super::properties::{as_vector, read_only, unknown};
use super::{
    expect_points, record, require_empty, same_points, same_vector, BuildContext, Creator,
    CreatorKind, CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// A planar contour swept along a vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionParams {
    pub contour: Vec<Point3>,
    pub direction: Vector3,
}

impl ExtrusionParams {
    #[must_use]
    pub fn new(contour: Vec<Point3>, direction: Vector3) -> Self {
        Self { contour, direction }
    }
}

impl Parameters for ExtrusionParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_empty(input, "extrusion")?;
        let shell = Extrude::new(self.contour.clone(), self.direction)
            .execute(names, &context.tolerance)?;
        Ok(Construction {
            shell,
            aux: self.basis_items(),
        })
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        for point in &mut self.contour {
            *point = transform_point(matrix, point);
        }
        self.direction = transform_direction(matrix, &self.direction);
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        same_points(&self.contour, &other.contour, accuracy)
            && same_vector(&self.direction, &other.direction, accuracy)
    }

    fn is_similar(&self, other: &Self) -> bool {
        self.contour.len() == other.contour.len()
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("direction", PropertyValue::Vector(self.direction))
            .with("points", PropertyValue::Count(self.contour.len()))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "direction" => {
                self.direction = as_vector(name, value)?;
                Ok(())
            }
            "points" => Err(read_only(name)),
            _ => Err(unknown(name)),
        }
    }

    fn basis_items(&self) -> Vec<AuxItem> {
        self.contour
            .first()
            .and_then(|origin| Line::new(*origin, self.direction).ok())
            .map(AuxItem::Line)
            .into_iter()
            .collect()
    }

    fn basis_points(&self) -> Vec<Point3> {
        self.contour.clone()
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, self.contour.len())?;
        self.contour = points.to_vec();
        Ok(())
    }
}

/// Extrudes a contour into a prism on an empty shell and records it.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`](crate::error::OperationError)
/// for a contour that is not a planar polygon or a direction lying in its
/// plane.
pub fn create_extrusion(
    contour: Vec<Point3>,
    direction: Vector3,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(
        names,
        CreatorKind::Extrusion(ExtrusionParams::new(contour, direction)),
    );
    record(&Shell::new(), creator, context)
}
