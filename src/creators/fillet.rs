use crate::error::Result;
use crate::math::Matrix4;
use crate::operations::modification::{Blend, BlendProfile};
use crate::operations::Construction;
use crate::topology::{capture_edges, resolve_edges, EdgeRef, NameMaker, Shell};

use super::properties::{as_count, as_real, read_only, unknown};
use super::{
    length_scale, record, require_body, same_real, BuildContext, Creator, CreatorKind,
    CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// Rounds a set of convex edges with a faceted circular blend.
#[derive(Debug, Clone, PartialEq)]
pub struct FilletParams {
    /// Edges of the input shell, each checked against the faces it joined
    /// when picked.
    pub edges: Vec<EdgeRef>,
    pub radius: f64,
    /// Number of flat strips approximating each round.
    pub segments: usize,
}

impl FilletParams {
    #[must_use]
    pub fn new(edges: Vec<EdgeRef>, radius: f64, segments: usize) -> Self {
        Self {
            edges,
            radius,
            segments,
        }
    }
}

impl Parameters for FilletParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_body(input, "fillet")?;
        let profile = BlendProfile::Round {
            radius: self.radius,
            segments: self.segments,
        };
        let edges = resolve_edges(&self.edges, input)?;
        Blend::new(edges, profile).execute(input, names, &context.tolerance)
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        self.radius *= length_scale(matrix);
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.edges == other.edges
            && same_real(self.radius, other.radius, accuracy)
            && self.segments == other.segments
    }

    fn is_similar(&self, other: &Self) -> bool {
        self.edges.len() == other.edges.len()
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("edges", PropertyValue::Indices(self.edges.iter().map(|e| e.index).collect()))
            .with("radius", PropertyValue::Real(self.radius))
            .with("segments", PropertyValue::Count(self.segments))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "edges" => return Err(read_only(name)),
            "radius" => self.radius = as_real(name, value)?,
            "segments" => self.segments = as_count(name, value)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}

/// Fillets `edges` of `input` and records the step.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`](crate::error::OperationError)
/// for an empty shell or a bad edge selection, and
/// [`OperationError::Infeasible`](crate::error::OperationError) when the
/// radius does not fit the adjacent faces.
pub fn create_fillet(
    input: &Shell,
    edges: Vec<usize>,
    radius: f64,
    segments: usize,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let edges = capture_edges(input, &edges)?;
    let creator = Creator::new(
        names,
        CreatorKind::Fillet(FilletParams::new(edges, radius, segments)),
    );
    record(input, creator, context)
}
