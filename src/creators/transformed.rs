use crate::error::Result;
use crate::math::transform::inverse;
use crate::math::Matrix4;
use crate::operations::transform::GeneralTransform;
use crate::operations::Construction;
use crate::topology::{NameMaker, Shell};

use super::properties::{as_matrix, unknown};
use super::{
    record, require_body, BuildContext, Creator, CreatorKind, CreatorRef, Parameters,
    PropertyBag, PropertyValue, RegTransform,
};

/// Maps the whole shell through an affine matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedParams {
    pub matrix: Matrix4,
}

impl TransformedParams {
    #[must_use]
    pub fn new(matrix: Matrix4) -> Self {
        Self { matrix }
    }
}

impl Parameters for TransformedParams {
    fn build(&self, input: &Shell, _names: &NameMaker, _context: &BuildContext) -> Result<Construction> {
        require_body(input, "transformation")?;
        let mut shell = input.clone();
        GeneralTransform::new(self.matrix).execute(&mut shell)?;
        Ok(Construction::new(shell))
    }

    /// Conjugates the stored matrix, so the step acts on the moved body as
    /// it acted on the original.
    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        self.matrix = matrix * self.matrix * inverse(matrix)?;
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        (self.matrix - other.matrix).amax() <= accuracy
    }

    fn is_similar(&self, _other: &Self) -> bool {
        true
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new().with("matrix", PropertyValue::Matrix(self.matrix))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "matrix" => {
                self.matrix = as_matrix(name, value)?;
                Ok(())
            }
            _ => Err(unknown(name)),
        }
    }
}

/// Transforms `input` by `matrix` and records the step.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`](crate::error::GeometryError) for
/// a singular matrix.
pub fn create_transformed(
    input: &Shell,
    matrix: Matrix4,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(names, CreatorKind::Transformed(TransformedParams::new(matrix)));
    record(input, creator, context)
}
