use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::Placement;
use crate::math::{Matrix4, Point3};
use crate::operations::shaping::Extrude;
use crate::operations::{AuxItem, Construction};
use crate::topology::{NameMaker, Shell};

use super::properties::{as_point, as_real, unknown};
use super::{
    expect_points, record, require_empty, same_point, same_real, same_vector, BuildContext,
    Creator, CreatorKind, CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

const LENGTH_NAMES: [&str; 3] = ["length_x", "length_y", "length_z"];

/// A rectangular box spanning `lengths` along the axes of `placement`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockParams {
    pub placement: Placement,
    pub lengths: [f64; 3],
}

impl BlockParams {
    #[must_use]
    pub fn new(placement: Placement, lengths: [f64; 3]) -> Self {
        Self { placement, lengths }
    }
}

impl Parameters for BlockParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_empty(input, "block")?;
        if let Some(bad) = self
            .lengths
            .iter()
            .find(|l| !l.is_finite() || **l <= context.tolerance.metric)
        {
            return Err(
                OperationError::InvalidInput(format!("block length {bad} must be positive")).into(),
            );
        }

        let [a, b, c] = self.lengths;
        let pl = &self.placement;
        let contour = vec![
            pl.point_at(0.0, 0.0, 0.0),
            pl.point_at(a, 0.0, 0.0),
            pl.point_at(a, b, 0.0),
            pl.point_at(0.0, b, 0.0),
        ];
        let shell = Extrude::new(contour, pl.z_axis() * c).execute(names, &context.tolerance)?;
        Ok(Construction::new(shell))
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        let (placement, scales, mirrored) = self.placement.transformed(matrix)?;
        let lengths = [
            self.lengths[0] * scales[0],
            self.lengths[1] * scales[1],
            self.lengths[2] * scales[2],
        ];
        // A mirrored frame is re-made right-handed with Z flipped, so the box
        // now hangs below the new origin.
        self.placement = if mirrored {
            Placement::new(
                placement.point_at(0.0, 0.0, -lengths[2]),
                *placement.x_axis(),
                *placement.y_axis(),
            )?
        } else {
            placement
        };
        self.lengths = lengths;
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        let (a, b) = (&self.placement, &other.placement);
        same_point(a.origin(), b.origin(), accuracy)
            && same_vector(a.x_axis(), b.x_axis(), accuracy)
            && same_vector(a.y_axis(), b.y_axis(), accuracy)
            && self
                .lengths
                .iter()
                .zip(&other.lengths)
                .all(|(x, y)| same_real(*x, *y, accuracy))
    }

    fn is_similar(&self, _other: &Self) -> bool {
        true
    }

    fn properties(&self) -> PropertyBag {
        let mut bag =
            PropertyBag::new().with("origin", PropertyValue::Point(*self.placement.origin()));
        for (name, length) in LENGTH_NAMES.into_iter().zip(self.lengths) {
            bag.insert(name, PropertyValue::Real(length));
        }
        bag
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        if name == "origin" {
            self.set_basis_points(&[as_point(name, value)?])
        } else if let Some(axis) = LENGTH_NAMES.iter().position(|n| *n == name) {
            self.lengths[axis] = as_real(name, value)?;
            Ok(())
        } else {
            Err(unknown(name))
        }
    }

    fn basis_items(&self) -> Vec<AuxItem> {
        let pl = &self.placement;
        [pl.x_axis(), pl.y_axis(), pl.z_axis()]
            .into_iter()
            .filter_map(|axis| Line::new(*pl.origin(), *axis).ok())
            .map(AuxItem::Line)
            .collect()
    }

    fn basis_points(&self) -> Vec<Point3> {
        vec![*self.placement.origin()]
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, 1)?;
        let pl = &self.placement;
        self.placement = Placement::new(points[0], *pl.x_axis(), *pl.y_axis())?;
        Ok(())
    }
}

/// Builds a block on an empty shell and records it.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for non-positive lengths.
pub fn create_block(
    placement: Placement,
    lengths: [f64; 3],
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(names, CreatorKind::Block(BlockParams::new(placement, lengths)));
    record(&Shell::new(), creator, context)
}
