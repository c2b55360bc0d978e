use crate::error::Result;
use crate::math::Matrix4;
use crate::operations::modification::{Blend, BlendProfile};
use crate::operations::Construction;
use crate::topology::{capture_edges, resolve_edges, EdgeRef, NameMaker, Shell};

use super::properties::{as_real, read_only, unknown};
use super::{
    length_scale, record, require_body, same_real, BuildContext, Creator, CreatorKind,
    CreatorRef, Parameters, PropertyBag, PropertyValue, RegTransform,
};

/// Bevels a set of convex edges at an equal distance on both faces.
#[derive(Debug, Clone, PartialEq)]
pub struct ChamferParams {
    pub edges: Vec<EdgeRef>,
    pub distance: f64,
}

impl ChamferParams {
    #[must_use]
    pub fn new(edges: Vec<EdgeRef>, distance: f64) -> Self {
        Self { edges, distance }
    }
}

impl Parameters for ChamferParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        require_body(input, "chamfer")?;
        let profile = BlendProfile::Bevel {
            distance: self.distance,
        };
        let edges = resolve_edges(&self.edges, input)?;
        Blend::new(edges, profile).execute(input, names, &context.tolerance)
    }

    fn transform(&mut self, matrix: &Matrix4, _registrar: &mut RegTransform) -> Result<()> {
        self.distance *= length_scale(matrix);
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.edges == other.edges && same_real(self.distance, other.distance, accuracy)
    }

    fn is_similar(&self, other: &Self) -> bool {
        self.edges.len() == other.edges.len()
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("edges", PropertyValue::Indices(self.edges.iter().map(|e| e.index).collect()))
            .with("distance", PropertyValue::Real(self.distance))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "edges" => return Err(read_only(name)),
            "distance" => self.distance = as_real(name, value)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}

/// Chamfers `edges` of `input` and records the step.
///
/// # Errors
///
/// See [`create_fillet`](super::create_fillet).
pub fn create_chamfer(
    input: &Shell,
    edges: Vec<usize>,
    distance: f64,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let edges = capture_edges(input, &edges)?;
    let creator = Creator::new(names, CreatorKind::Chamfer(ChamferParams::new(edges, distance)));
    record(input, creator, context)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::creators::create_block;
    use crate::geometry::Placement;
    use crate::operations::query::Volume;

    #[test]
    fn chamfer_cuts_a_prism_off_the_edge() {
        let context = BuildContext::default();
        let (cube, _) =
            create_block(Placement::default(), [1.0, 1.0, 1.0], NameMaker::new(1), &context)
                .unwrap();
        let (shell, creator) =
            create_chamfer(&cube, vec![0], 0.2, NameMaker::new(2), &context).unwrap();
        assert_eq!(shell.face_count(), 7);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 0.98, epsilon = 1e-9);
        assert_eq!(
            creator.read().properties().get("distance"),
            Some(&PropertyValue::Real(0.2))
        );
    }

    #[test]
    fn distance_must_be_positive() {
        let context = BuildContext::default();
        let (cube, _) =
            create_block(Placement::default(), [1.0, 1.0, 1.0], NameMaker::new(1), &context)
                .unwrap();
        assert!(create_chamfer(&cube, vec![0], -0.1, NameMaker::new(2), &context).is_err());
    }

    #[test]
    fn missing_edge_is_caught_when_recording() {
        let context = BuildContext::default();
        let (cube, _) =
            create_block(Placement::default(), [1.0, 1.0, 1.0], NameMaker::new(1), &context)
                .unwrap();
        let err = create_chamfer(&cube, vec![12], 0.1, NameMaker::new(2), &context).unwrap_err();
        assert!(matches!(
            err,
            crate::error::GeohistError::Topology(crate::error::TopologyError::IndexOutOfRange {
                kind: "edge",
                index: 12,
                ..
            })
        ));
    }
}
