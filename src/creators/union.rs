use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{HistoryError, OperationError, Result};
use crate::math::Matrix4;
use crate::operations::boolean::MergingFlags;
use crate::operations::Construction;
use crate::topology::{NameMaker, Shell};

use super::properties::{as_flag, read_only, unknown};
use super::{
    record, BuildContext, Creator, CreatorKind, CreatorRef, Parameters, PropertyBag,
    PropertyValue, RegDuplicate, RegTransform,
};

/// Unites the shell with a tool body rebuilt from its own sub-history.
///
/// Tool creators are shared handles: several unions may reuse one tool
/// history, and edits to it reach every one of them.
#[derive(Debug, Clone)]
pub struct UnionParams {
    pub tools: Vec<CreatorRef>,
    pub flags: MergingFlags,
}

impl UnionParams {
    #[must_use]
    pub fn new(tools: Vec<CreatorRef>, flags: MergingFlags) -> Self {
        Self { tools, flags }
    }

    /// Copies the parameters, duplicating the tool history through
    /// `registrar`.
    #[must_use]
    pub fn duplicate(&self, registrar: &mut RegDuplicate) -> Self {
        Self {
            tools: self
                .tools
                .iter()
                .map(|tool| tool.duplicate(Some(&mut *registrar)))
                .collect(),
            flags: self.flags,
        }
    }

    /// Whether some tool history leads back to a creator it came from,
    /// for instance a union listed among its own tools.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        let mut path = Vec::new();
        let mut done = HashSet::new();
        self.tools.iter().any(|tool| reaches_itself(tool, &mut path, &mut done))
    }

    /// Replays the tool history on an empty shell.
    fn build_tool(&self, context: &BuildContext) -> Result<Shell> {
        let mut tool = Shell::new();
        for (index, creator) in self.tools.iter().enumerate() {
            tool = creator
                .create_shell(&tool, context, None)
                .map_err(|source| HistoryError::StepFailed {
                    index,
                    name: creator.property_name(),
                    source: Box::new(source),
                })?;
        }
        Ok(tool)
    }
}

impl Parameters for UnionParams {
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext) -> Result<Construction> {
        if self.tools.is_empty() {
            return Err(OperationError::InvalidInput("union has no tool creators".into()).into());
        }
        if self.is_cyclic() {
            return Err(OperationError::InvalidInput(
                "union tool history contains the union itself".into(),
            )
            .into());
        }
        let mut tool = self.build_tool(context)?;
        for face in tool.faces_mut() {
            face.name = names.copy_name(&face.name);
        }
        let shell = context
            .booleans
            .union(input, &tool, self.flags, &context.tolerance)?;
        Ok(Construction::new(shell))
    }

    // Tools are shared and move in place. The matrix has already been
    // checked, and the registrar keeps a tool reused by several unions from
    // moving twice.
    fn transform(&mut self, matrix: &Matrix4, registrar: &mut RegTransform) -> Result<()> {
        for tool in &self.tools {
            tool.transform(matrix, Some(&mut *registrar))?;
        }
        Ok(())
    }

    fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        !self.is_cyclic()
            && !other.is_cyclic()
            && self.flags == other.flags
            && self.tools.len() == other.tools.len()
            && self
                .tools
                .iter()
                .zip(&other.tools)
                .all(|(a, b)| a.is_same(b, accuracy))
    }

    fn is_similar(&self, other: &Self) -> bool {
        !self.is_cyclic()
            && !other.is_cyclic()
            && self.tools.len() == other.tools.len()
            && self.tools.iter().zip(&other.tools).all(|(a, b)| a.is_similar(b))
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("tools", PropertyValue::Count(self.tools.len()))
            .with("merge_faces", PropertyValue::Flag(self.flags.merge_faces))
            .with("merge_edges", PropertyValue::Flag(self.flags.merge_edges))
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "tools" => return Err(read_only(name)),
            "merge_faces" => self.flags.merge_faces = as_flag(name, value)?,
            "merge_edges" => self.flags.merge_edges = as_flag(name, value)?,
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}

/// Depth-first walk over nested union tools; `path` holds the creators
/// currently being expanded.
fn reaches_itself(
    tool: &CreatorRef,
    path: &mut Vec<*const ()>,
    done: &mut HashSet<*const ()>,
) -> bool {
    let id = Arc::as_ptr(&tool.0).cast::<()>();
    if path.contains(&id) {
        return true;
    }
    if !done.insert(id) {
        return false;
    }
    let nested = match tool.read().kind() {
        CreatorKind::Union(params) => params.tools.clone(),
        _ => Vec::new(),
    };
    path.push(id);
    let found = nested.iter().any(|t| reaches_itself(t, path, done));
    path.pop();
    found
}

/// Builds the tool body from `tools`, unites it with `input` and records
/// the step.
///
/// # Errors
///
/// Returns [`HistoryError::StepFailed`] when a tool step fails, and the
/// boolean engine's error when the bodies cannot be united.
pub fn create_union(
    input: &Shell,
    tools: Vec<CreatorRef>,
    flags: MergingFlags,
    names: NameMaker,
    context: &BuildContext,
) -> Result<(Shell, CreatorRef)> {
    let creator = Creator::new(names, CreatorKind::Union(UnionParams::new(tools, flags)));
    record(input, creator, context)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::creators::{create_block, BlockParams, FilletParams};
    use crate::error::GeohistError;
    use crate::geometry::Placement;
    use crate::math::{Point3, Vector3};
    use crate::topology::capture_edges;
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn block_at(origin: Point3, main: u32) -> CreatorRef {
        CreatorRef::new(Creator::new(
            NameMaker::new(main),
            CreatorKind::Block(BlockParams::new(Placement::at(origin), [1.0, 1.0, 1.0])),
        ))
    }

    fn cube(context: &BuildContext) -> Shell {
        create_block(Placement::default(), [1.0, 1.0, 1.0], NameMaker::new(1), context)
            .unwrap()
            .0
    }

    fn tools_of(creator: &CreatorRef) -> Vec<CreatorRef> {
        match creator.read().kind() {
            CreatorKind::Union(params) => params.tools.clone(),
            _ => panic!("expected a union"),
        }
    }

    #[test]
    fn union_glues_an_adjacent_tool() {
        let context = BuildContext::default();
        let (shell, creator) = create_union(
            &cube(&context),
            vec![block_at(p(1.0, 0.0, 0.0), 5)],
            MergingFlags::new(true, true),
            NameMaker::new(6),
            &context,
        )
        .unwrap();
        assert_eq!(shell.face_count(), 6);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(creator.read().properties().get("tools"), Some(&PropertyValue::Count(1)));
    }

    #[test]
    fn failing_tool_step_is_reported_by_index() {
        let context = BuildContext::default();
        let tool = block_at(p(3.0, 0.0, 0.0), 5);
        let edges = capture_edges(&tool.create_shell(&Shell::new(), &context, None).unwrap(), &[0]);
        let bad_fillet = CreatorRef::new(Creator::new(
            NameMaker::new(7),
            CreatorKind::Fillet(FilletParams::new(edges.unwrap(), 5.0, 2)),
        ));
        let err = create_union(
            &cube(&context),
            vec![tool, bad_fillet],
            MergingFlags::default(),
            NameMaker::new(6),
            &context,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GeohistError::History(HistoryError::StepFailed { index: 1, name: "Fillet", .. })
        ));
    }

    #[test]
    fn empty_tool_list_is_rejected() {
        let context = BuildContext::default();
        let err = create_union(
            &cube(&context),
            Vec::new(),
            MergingFlags::default(),
            NameMaker::new(6),
            &context,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no tool creators"));
    }

    #[test]
    fn shared_tool_is_duplicated_once_per_pass() {
        let tool = block_at(p(3.0, 0.0, 0.0), 5);
        let first = CreatorRef::new(Creator::new(
            NameMaker::new(6),
            CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
        ));
        let second = CreatorRef::new(Creator::new(
            NameMaker::new(7),
            CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
        ));

        let mut registrar = RegDuplicate::new();
        let first_copy = first.duplicate(Some(&mut registrar));
        let second_copy = second.duplicate(Some(&mut registrar));
        let (a, b) = (tools_of(&first_copy), tools_of(&second_copy));
        assert!(a[0].ptr_eq(&b[0]));
        assert!(!a[0].ptr_eq(&tool));

        let (c, d) = (tools_of(&first.duplicate(None)), tools_of(&second.duplicate(None)));
        assert!(!c[0].ptr_eq(&d[0]));
    }

    #[test]
    fn shared_tool_moves_once_per_pass() {
        let tool = block_at(p(3.0, 0.0, 0.0), 5);
        let unions: Vec<CreatorRef> = [6, 7]
            .into_iter()
            .map(|main| {
                CreatorRef::new(Creator::new(
                    NameMaker::new(main),
                    CreatorKind::Union(UnionParams::new(
                        vec![tool.clone()],
                        MergingFlags::default(),
                    )),
                ))
            })
            .collect();

        let mut registrar = RegTransform::new();
        for union in &unions {
            union
                .move_by(&Vector3::new(0.0, 2.0, 0.0), Some(&mut registrar))
                .unwrap();
        }
        assert_relative_eq!(tool.read().basis_points()[0], p(3.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn tool_count_is_read_only() {
        let mut params = UnionParams::new(Vec::new(), MergingFlags::default());
        assert!(params.set_property("tools", &PropertyValue::Count(2)).is_err());
        params
            .set_property("merge_edges", &PropertyValue::Flag(true))
            .unwrap();
        assert!(params.flags.merge_edges);
    }

    #[test]
    fn distorting_matrix_leaves_shared_tools_in_place() {
        let tool = block_at(p(3.0, 0.0, 0.0), 5);
        let union = CreatorRef::new(Creator::new(
            NameMaker::new(6),
            CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
        ));
        let mut shear = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        shear[(0, 1)] = 1.0;
        let err = union.transform(&shear, None).unwrap_err();
        assert!(err.to_string().contains("not a similarity"));
        assert_eq!(tool.read().basis_points()[0], p(3.0, 0.0, 0.0));
    }

    #[test]
    fn union_listed_among_its_own_tools_is_refused() {
        let context = BuildContext::default();
        let tool = block_at(p(3.0, 0.0, 0.0), 5);
        let union = CreatorRef::new(Creator::new(
            NameMaker::new(6),
            CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
        ));
        let looped = UnionParams::new(vec![tool.clone(), union.clone()], MergingFlags::default());
        *union.write() = Creator::new(NameMaker::new(6), CreatorKind::Union(looped));

        let err = union.create_shell(&cube(&context), &context, None).unwrap_err();
        assert!(err.to_string().contains("contains the union itself"));

        let copy = union.duplicate(None);
        assert!(tools_of(&copy)[1].ptr_eq(&copy));
        assert!(!tools_of(&copy)[0].ptr_eq(&tool));
        assert!(!union.is_similar(&copy));

        union.move_by(&Vector3::new(0.0, 0.0, 1.0), None).unwrap();
        assert_eq!(tool.read().basis_points()[0], p(3.0, 0.0, 1.0));

        // Break the loop so both handles can be dropped.
        *union.write() = Creator::new(
            NameMaker::new(6),
            CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
        );
        *copy.write() = Creator::new(
            NameMaker::new(6),
            CreatorKind::Union(UnionParams::new(vec![tool], MergingFlags::default())),
        );
    }
}
