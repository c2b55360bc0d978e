use crate::error::Result;
use crate::geometry::surface::Plane;
use crate::math::transform::is_reflection;
use crate::math::{Matrix4, Point3};
use crate::operations::modification::Draft;
use crate::operations::{AuxItem, Construction};
use crate::topology::{capture_faces, resolve_faces, FaceRef, NameMaker, Shell};

use super::properties::{as_point, as_real, as_vector, read_only, unknown};
use super::{
    expect_points, record, require_body, same_plane, same_real, BuildContext, Creator,
    CreatorKind, CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// Tilts faces about their intersection with a neutral plane.
///
/// A positive angle narrows the body along the neutral plane's normal.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftParams {
    pub neutral: Plane,
    pub angle: f64,
    pub faces: Vec<FaceRef>,
}

impl DraftParams {
    #[must_use]
    pub fn new(neutral: Plane, angle: f64, faces: Vec<FaceRef>) -> Self {
        Self {
            neutral,
            angle,
            faces,
        }
    }
}

impl Parameters for DraftParams {
    fn build(&self, input: &Shell, _names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_body(input, "draft")?;
        let faces = resolve_faces(&self.faces, input)?;
        Draft::new(self.neutral.clone(), self.angle, faces).execute(input, &context.tolerance)
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        let neutral = self.neutral.transformed(matrix)?;
        // Frame-derived normals come out flipped under a reflection; the
        // pull direction must follow the mirrored geometry.
        self.neutral = if is_reflection(matrix) {
            neutral.reversed()
        } else {
            neutral
        };
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.faces == other.faces
            && same_real(self.angle, other.angle, accuracy)
            && same_plane(&self.neutral, &other.neutral, accuracy)
    }

    fn is_similar(&self, other: &Self) -> bool {
        self.faces.len() == other.faces.len()
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("angle", PropertyValue::Real(self.angle))
            .with("faces", PropertyValue::Indices(self.faces.iter().map(|f| f.index).collect()))
            .with("neutral_origin", PropertyValue::Point(*self.neutral.origin()))
            .with("neutral_normal", PropertyValue::Vector(*self.neutral.plane_normal()))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "angle" => self.angle = as_real(name, value)?,
            "faces" => return Err(read_only(name)),
            "neutral_origin" => {
                self.neutral = Plane::from_normal(as_point(name, value)?, *self.neutral.plane_normal())?;
            }
            "neutral_normal" => {
                self.neutral = Plane::from_normal(*self.neutral.origin(), as_vector(name, value)?)?;
            }
            _ => return Err(unknown(name)),
        }
        Ok(())
    }

    fn basis_items(&self) -> Vec<AuxItem> {
        vec![AuxItem::Plane(self.neutral.clone())]
    }

    fn basis_points(&self) -> Vec<Point3> {
        vec![*self.neutral.origin()]
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, 1)?;
        self.neutral = Plane::from_normal(points[0], *self.neutral.plane_normal())?;
        Ok(())
    }
}

/// Drafts `faces` of `input` and records the step.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`](crate::error::OperationError)
/// for an empty shell, a bad angle or face selection, and
/// [`OperationError::Infeasible`](crate::error::OperationError) when a face
/// is parallel to the neutral plane or the draft collapses the body.
pub fn create_draft(
    input: &Shell,
    neutral: Plane,
    angle: f64,
    faces: Vec<usize>,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let faces = capture_faces(input, &faces)?;
    let creator = Creator::new(names, CreatorKind::Draft(DraftParams::new(neutral, angle, faces)));
    record(input, creator, context)
}
