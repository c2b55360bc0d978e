use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::transform::mirror;
use crate::math::{Matrix4, Point3};
use crate::operations::boolean::MergingFlags;
use crate::operations::transform::GeneralTransform;
use crate::operations::{AuxItem, Construction};
use crate::topology::{NameMaker, Shell};

use super::properties::{as_flag, as_point, as_vector, unknown};
use super::{
    expect_points, record, require_body, same_plane, BuildContext, Creator, CreatorKind,
    CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// Unites a body with its mirror image.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryParams {
    /// Mirror plane; only its position matters, not its orientation.
    pub plane: Plane,
    pub flags: MergingFlags,
}

impl SymmetryParams {
    #[must_use]
    pub fn new(plane: Plane, flags: MergingFlags) -> Self {
        Self { plane, flags }
    }
}

impl Parameters for SymmetryParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_body(input, "symmetry")?;
        let metric = context.tolerance.metric;
        let (mut below, mut above) = (false, false);
        for (_, vertex) in input.vertices() {
            let d = self.plane.signed_distance(vertex);
            below |= d < -metric;
            above |= d > metric;
        }
        if below && above {
            return Err(OperationError::Infeasible(
                "body crosses the mirror plane".into(),
            )
            .into());
        }

        let mut mirrored = input.clone();
        GeneralTransform::new(mirror(self.plane.origin(), self.plane.plane_normal())?)
            .execute(&mut mirrored)?;
        for face in mirrored.faces_mut() {
            face.name = names.copy_name(&face.name);
        }
        let shell = context
            .booleans
            .union(input, &mirrored, self.flags, &context.tolerance)?;
        Ok(Construction {
            shell,
            aux: self.basis_items(),
        })
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        self.plane = self.plane.transformed(matrix)?;
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.flags == other.flags && same_plane(&self.plane, &other.plane, accuracy)
    }

    fn is_similar(&self, _other: &Self) -> bool {
        true
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("plane_origin", PropertyValue::Point(*self.plane.origin()))
            .with("plane_normal", PropertyValue::Vector(*self.plane.plane_normal()))
            .with("merge_faces", PropertyValue::Flag(self.flags.merge_faces))
            .with("merge_edges", PropertyValue::Flag(self.flags.merge_edges))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "plane_origin" => {
                self.plane = Plane::from_normal(as_point(name, value)?, *self.plane.plane_normal())?;
            }
            "plane_normal" => {
                self.plane = Plane::from_normal(*self.plane.origin(), as_vector(name, value)?)?;
            }
            "merge_faces" => self.flags.merge_faces = as_flag(name, value)?,
            "merge_edges" => self.flags.merge_edges = as_flag(name, value)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }

    fn basis_items(&self) -> Vec<AuxItem> {
        vec![AuxItem::Plane(self.plane.clone())]
    }

    fn basis_points(&self) -> Vec<Point3> {
        vec![*self.plane.origin()]
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, 1)?;
        self.plane = Plane::from_normal(points[0], *self.plane.plane_normal())?;
        Ok(())
    }
}

/// Mirrors `input` through `plane`, unites it with the original and
/// records the step.
///
/// # Errors
///
/// Returns [`OperationError::Infeasible`] if the body straddles the plane
/// or the boolean engine rejects the union.
pub fn create_symmetry(
    input: &Shell,
    plane: Plane,
    flags: MergingFlags,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(names, CreatorKind::Symmetry(SymmetryParams::new(plane, flags)));
    record(input, creator, context)
}
