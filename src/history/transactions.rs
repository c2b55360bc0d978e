use tracing::{debug, instrument, warn};

use crate::creators::{
    AutoRegDuplicate, AutoRegTransform, BuildContext, CreatorRef, CreatorType, RegDuplicate,
    RegTransform,
};
use crate::error::{GeohistError, HistoryError, OperationError, Result};
use crate::geometry::curve::Line;
use crate::math::transform::{rotation_about_axis, similarity_scale, translation};
use crate::math::{Matrix4, Vector3};
use crate::operations::AuxItem;
use crate::topology::Shell;

use super::Progress;

/// Whether a step takes part in rebuilds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProcessState {
    #[default]
    Active,
    /// Kept in the list but left out of rebuilds.
    Skip,
}

/// How a creator enters a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddMode {
    /// Store the given handle; the creator stays shared with the caller.
    Share,
    /// Store a fresh copy made without a registrar.
    Copy,
}

#[derive(Debug, Clone)]
struct Slot {
    creator: CreatorRef,
    state: ProcessState,
}

/// An ordered, replayable list of creators with a per-step state.
///
/// Cloning a `Transactions` shares its creators; use
/// [`creators_copy`](Self::creators_copy) for an independent history.
#[derive(Debug, Clone, Default)]
pub struct Transactions {
    slots: Vec<Slot>,
}

impl Transactions {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a creator as an active step and returns its index.
    pub fn add_creator(&mut self, creator: CreatorRef, mode: AddMode) -> usize {
        self.slots.push(Slot {
            creator: Self::admit(creator, mode),
            state: ProcessState::Active,
        });
        self.slots.len() - 1
    }

    /// Inserts a creator as an active step before `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] if `index` is past the end.
    pub fn insert_creator(&mut self, index: usize, creator: CreatorRef, mode: AddMode) -> Result<()> {
        if index > self.slots.len() {
            return Err(self.out_of_range(index));
        }
        self.slots.insert(
            index,
            Slot {
                creator: Self::admit(creator, mode),
                state: ProcessState::Active,
            },
        );
        Ok(())
    }

    /// Removes the step at `index` and releases the history's handle.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] for an unknown index.
    pub fn delete_creator(&mut self, index: usize) -> Result<()> {
        self.detach_creator(index).map(drop)
    }

    /// Removes the step at `index` and hands its creator to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] for an unknown index.
    pub fn detach_creator(&mut self, index: usize) -> Result<CreatorRef> {
        self.slot(index)?;
        Ok(self.slots.remove(index).creator)
    }

    /// The creator at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] for an unknown index.
    pub fn creator(&self, index: usize) -> Result<&CreatorRef> {
        self.slot(index).map(|slot| &slot.creator)
    }

    /// All creators in replay order, skipped ones included.
    pub fn creators(&self) -> impl Iterator<Item = &CreatorRef> {
        self.slots.iter().map(|slot| &slot.creator)
    }

    #[must_use]
    pub fn creators_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of creators of the given kind.
    #[must_use]
    pub fn creators_count_of(&self, kind: CreatorType) -> usize {
        self.creators().filter(|c| c.is_a() == kind).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sets the state of one step.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] for an unknown index.
    pub fn set_creator_status(&mut self, index: usize, state: ProcessState) -> Result<()> {
        self.slot(index)?;
        self.slots[index].state = state;
        Ok(())
    }

    /// The state of one step.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] for an unknown index.
    pub fn creator_status(&self, index: usize) -> Result<ProcessState> {
        self.slot(index).map(|slot| slot.state)
    }

    /// Activates the first `count` steps and skips the rest.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::ActiveCountExceeds`] if `count` is larger
    /// than the history; no state changes then.
    pub fn set_active_creators_count(&mut self, count: usize) -> Result<()> {
        let len = self.slots.len();
        if count > len {
            return Err(HistoryError::ActiveCountExceeds { count, len }.into());
        }
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.state = if i < count {
                ProcessState::Active
            } else {
                ProcessState::Skip
            };
        }
        Ok(())
    }

    /// Number of active steps.
    #[must_use]
    pub fn active_creators_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == ProcessState::Active)
            .count()
    }

    /// Index of the step holding this very creator (identity, not value).
    #[must_use]
    pub fn find_creator(&self, creator: &CreatorRef) -> Option<usize> {
        self.creators().position(|c| c.ptr_eq(creator))
    }

    /// Replaces the content of `destination` with copies of this history.
    ///
    /// All steps are copied through one registrar, so a creator reachable
    /// from several steps is copied once and the copies share it.
    pub fn creators_copy(&self, destination: &mut Transactions, registrar: Option<&mut RegDuplicate>) {
        let mut auto = AutoRegDuplicate::new(registrar);
        let registrar = auto.registrar();
        destination.slots = self
            .slots
            .iter()
            .map(|slot| Slot {
                creator: slot.creator.duplicate(Some(&mut *registrar)),
                state: slot.state,
            })
            .collect();
        debug!(steps = destination.slots.len(), "history copied");
    }

    /// Makes this history hold the same creator handles and states as
    /// `source`, sharing the creators.
    pub fn creators_assign(&mut self, source: &Transactions) {
        self.slots.clone_from(&source.slots);
    }

    /// Copies the parameter values of `other` step by step into this
    /// history, keeping its creators and their names.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::LengthMismatch`] for histories of different
    /// length and [`OperationError::Incompatible`] if any pair of steps is
    /// not similar. Both are checked before anything is written.
    pub fn set_creators_equal(&self, other: &Transactions) -> Result<()> {
        let (left, right) = (self.slots.len(), other.slots.len());
        if left != right {
            return Err(HistoryError::LengthMismatch { left, right }.into());
        }
        if let Some(index) = self
            .creators()
            .zip(other.creators())
            .position(|(a, b)| !a.is_similar(b))
        {
            return Err(OperationError::Incompatible(format!(
                "step {index} is not similar to its counterpart"
            ))
            .into());
        }
        for (target, source) in self.creators().zip(other.creators()) {
            target.set_equal(source)?;
        }
        Ok(())
    }

    /// Whether both histories have equal states and pairwise equal steps.
    #[must_use]
    pub fn is_same(&self, other: &Transactions, accuracy: f64) -> bool {
        self.slots.len() == other.slots.len()
            && self.slots.iter().zip(&other.slots).all(|(a, b)| {
                a.state == b.state && a.creator.is_same(&b.creator, accuracy)
            })
    }

    /// Whether [`set_creators_equal`](Self::set_creators_equal) would
    /// succeed.
    #[must_use]
    pub fn is_similar(&self, other: &Transactions) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .creators()
                .zip(other.creators())
                .all(|(a, b)| a.is_similar(b))
    }

    /// Transforms every step, each shared creator once.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`](crate::error::GeometryError)
    /// before touching any step if the matrix is not a similarity. Otherwise
    /// returns the first step's transformation error; steps before it stay
    /// transformed.
    pub fn transform(&self, matrix: &Matrix4, registrar: Option<&mut RegTransform>) -> Result<()> {
        similarity_scale(matrix)?;
        let mut auto = AutoRegTransform::new(registrar);
        let registrar = auto.registrar();
        for creator in self.creators() {
            creator.transform(matrix, Some(&mut *registrar))?;
        }
        Ok(())
    }

    /// Translates every step.
    ///
    /// # Errors
    ///
    /// See [`transform`](Self::transform).
    pub fn move_by(&self, offset: &Vector3, registrar: Option<&mut RegTransform>) -> Result<()> {
        self.transform(&translation(offset), registrar)
    }

    /// Rotates every step about `axis`.
    ///
    /// # Errors
    ///
    /// See [`transform`](Self::transform).
    pub fn rotate(&self, axis: &Line, angle: f64, registrar: Option<&mut RegTransform>) -> Result<()> {
        let matrix = rotation_about_axis(axis.origin(), axis.direction(), angle)?;
        self.transform(&matrix, registrar)
    }

    /// Rebuilds the body from scratch into `shell`.
    ///
    /// `shell` is reset to empty and every active step is applied in order.
    /// On failure or cancellation it holds the result of the last step that
    /// succeeded.
    ///
    /// # Errors
    ///
    /// See [`replay`](Self::replay).
    pub fn rebuild_item(
        &self,
        shell: &mut Shell,
        context: &BuildContext,
        aux: Option<&mut Vec<AuxItem>>,
        progress: Option<&mut dyn Progress>,
    ) -> Result<()> {
        *shell = Shell::new();
        self.replay(0, shell, context, aux, progress)
    }

    /// Applies the active steps from `from` on to `shell`, which must hold
    /// the body as it was before step `from`.
    ///
    /// `progress` is polled before each active step.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] if `from` is past the end,
    /// [`HistoryError::StepFailed`] naming the first step that failed, and
    /// [`HistoryError::Cancelled`] when `progress` stops the rebuild.
    #[instrument(skip_all, fields(from = from, steps = self.slots.len()))]
    pub fn replay(
        &self,
        from: usize,
        shell: &mut Shell,
        context: &BuildContext,
        mut aux: Option<&mut Vec<AuxItem>>,
        mut progress: Option<&mut dyn Progress>,
    ) -> Result<()> {
        if from > self.slots.len() {
            return Err(self.out_of_range(from));
        }
        let active: Vec<(usize, &CreatorRef)> = self
            .slots
            .iter()
            .enumerate()
            .skip(from)
            .filter(|(_, slot)| slot.state == ProcessState::Active)
            .map(|(index, slot)| (index, &slot.creator))
            .collect();
        let total = active.len();

        for (done, (index, creator)) in active.into_iter().enumerate() {
            if let Some(progress) = progress.as_deref_mut() {
                if !progress.proceed(done, total) {
                    warn!(completed = done, "rebuild cancelled");
                    return Err(HistoryError::Cancelled { completed: done }.into());
                }
            }
            let name = creator.property_name();
            if let Err(source) = creator.read().apply(shell, context, aux.as_deref_mut()) {
                warn!(index, name, error = %source, "rebuild step failed");
                return Err(step_failed(index, name, source));
            }
            debug!(index, name, faces = shell.face_count(), "rebuild step done");
        }
        if let Some(progress) = progress {
            progress.proceed(total, total);
        }
        Ok(())
    }

    fn admit(creator: CreatorRef, mode: AddMode) -> CreatorRef {
        match mode {
            AddMode::Share => creator,
            AddMode::Copy => creator.duplicate(None),
        }
    }

    fn slot(&self, index: usize) -> Result<&Slot> {
        self.slots.get(index).ok_or_else(|| self.out_of_range(index))
    }

    fn out_of_range(&self, index: usize) -> GeohistError {
        HistoryError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        }
        .into()
    }
}

fn step_failed(index: usize, name: &'static str, source: GeohistError) -> GeohistError {
    HistoryError::StepFailed {
        index,
        name,
        source: Box::new(source),
    }
    .into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::creators::{
        BlockParams, ChamferParams, Creator, CreatorKind, DraftParams, FilletParams, HoleParams,
        SymmetryParams, UnionParams,
    };
    use crate::error::TopologyError;
    use crate::geometry::surface::Plane;
    use crate::geometry::Placement;
    use crate::math::Point3;
    use crate::operations::boolean::MergingFlags;
    use crate::operations::query::{BoundingBox, IsValid, Volume};
    use crate::operations::transform::GeneralTransform;
    use crate::topology::{capture_edges, capture_faces, EdgeRef, FaceRef, NameMaker};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn step(main: u32, kind: CreatorKind) -> CreatorRef {
        CreatorRef::new(Creator::new(NameMaker::new(main), kind))
    }

    fn block_at(main: u32, origin: Point3, lengths: [f64; 3]) -> CreatorRef {
        step(main, CreatorKind::Block(BlockParams::new(Placement::at(origin), lengths)))
    }

    /// Edges of the block `block_at(1, origin, lengths)` builds.
    fn block_edges(lengths: [f64; 3], indices: &[usize]) -> Vec<EdgeRef> {
        let block = block_at(1, Point3::origin(), lengths);
        let shell = block.create_shell(&Shell::new(), &BuildContext::default(), None).unwrap();
        capture_edges(&shell, indices).unwrap()
    }

    fn slab_top() -> FaceRef {
        let block = block_at(1, Point3::origin(), [4.0, 4.0, 2.0]);
        let shell = block.create_shell(&Shell::new(), &BuildContext::default(), None).unwrap();
        FaceRef::capture(&shell, 1).unwrap()
    }

    /// A 4x4x2 slab with a rounded bottom edge and a hole in the top.
    fn machined_slab() -> Transactions {
        let mut history = Transactions::new();
        history.add_creator(block_at(1, Point3::origin(), [4.0, 4.0, 2.0]), AddMode::Share);
        history.add_creator(
            step(2, CreatorKind::Fillet(FilletParams::new(block_edges([4.0, 4.0, 2.0], &[0]), 0.2, 3))),
            AddMode::Share,
        );
        history.add_creator(
            step(3, CreatorKind::Hole(HoleParams::new(slab_top(), p(2.0, 2.0, 2.0), 1.0, 1.0, 8))),
            AddMode::Share,
        );
        history
    }

    fn rebuild(history: &Transactions) -> Result<Shell> {
        let mut shell = Shell::new();
        history.rebuild_item(&mut shell, &BuildContext::default(), None, None)?;
        Ok(shell)
    }

    fn first_tool(creator: &CreatorRef) -> CreatorRef {
        match creator.read().kind() {
            CreatorKind::Union(params) => params.tools[0].clone(),
            _ => panic!("expected a union"),
        }
    }

    #[test]
    fn rebuild_is_deterministic() {
        init_tracing();
        let history = machined_slab();
        let first = rebuild(&history).unwrap();
        let second = rebuild(&history).unwrap();
        let tolerance = BuildContext::default().tolerance;
        assert!(first.approx_eq(&second, &tolerance));
        assert!(IsValid::new(tolerance).execute(&first));
        assert_eq!(history.creators_count_of(CreatorType::Fillet), 1);
    }

    #[test]
    fn hole_volume_survives_the_rebuild() {
        let shell = rebuild(&machined_slab()).unwrap();
        let round = 0.04 - 3.0 / 2.0 * 0.04 * (PI / 2.0 / 3.0).sin();
        let prism = 4.0 * (PI / 4.0).sin();
        assert_relative_eq!(
            Volume::new().execute(&shell).unwrap(),
            32.0 - 4.0 * round - prism,
            epsilon = 1e-9
        );
    }

    #[test]
    fn copy_shares_a_sub_creator_reached_twice() {
        let tool = block_at(5, p(3.0, 0.0, 0.0), [1.0, 1.0, 1.0]);
        let mut history = Transactions::new();
        for main in [6, 7] {
            history.add_creator(
                step(
                    main,
                    CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
                ),
                AddMode::Share,
            );
        }
        let tool_owners = tool.strong_count();

        let mut copy = Transactions::new();
        history.creators_copy(&mut copy, None);
        let a = first_tool(copy.creator(0).unwrap());
        let b = first_tool(copy.creator(1).unwrap());
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&tool));
        drop(b);
        // The two copied unions plus `a`.
        assert_eq!(a.strong_count(), 3);
        assert_eq!(tool.strong_count(), tool_owners);
        assert!(copy.is_same(&history, 0.0));

        let mut separate = Transactions::new();
        separate.add_creator(history.creator(0).unwrap().clone(), AddMode::Copy);
        separate.add_creator(history.creator(1).unwrap().clone(), AddMode::Copy);
        let c = first_tool(separate.creator(0).unwrap());
        assert!(!c.ptr_eq(&first_tool(separate.creator(1).unwrap())));
    }

    #[test]
    fn active_count_matches_a_truncated_history() {
        let mut history = machined_slab();
        history.set_active_creators_count(2).unwrap();
        assert_eq!(history.active_creators_count(), 2);
        assert_eq!(history.creator_status(2).unwrap(), ProcessState::Skip);

        let mut truncated = Transactions::new();
        for creator in history.creators().take(2) {
            truncated.add_creator(creator.clone(), AddMode::Share);
        }
        let tolerance = BuildContext::default().tolerance;
        assert!(rebuild(&history).unwrap().approx_eq(&rebuild(&truncated).unwrap(), &tolerance));

        let err = history.set_active_creators_count(4).unwrap_err();
        assert!(matches!(
            err,
            GeohistError::History(HistoryError::ActiveCountExceeds { count: 4, len: 3 })
        ));
        assert_eq!(history.active_creators_count(), 2);
    }

    #[test]
    fn skipped_middle_step_is_left_out() {
        let mut history = machined_slab();
        history.set_creator_status(1, ProcessState::Skip).unwrap();
        let shell = rebuild(&history).unwrap();
        let prism = 4.0 * (PI / 4.0).sin();
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 32.0 - prism, epsilon = 1e-9);
        assert!(history.set_creator_status(3, ProcessState::Active).is_err());
    }

    #[test]
    fn skipping_the_step_under_a_picked_edge_fails_the_rebuild() {
        init_tracing();
        let context = BuildContext::default();
        let slab = block_at(1, Point3::origin(), [4.0, 4.0, 2.0]);
        let hole = HoleParams::new(slab_top(), p(2.0, 2.0, 2.0), 1.0, 1.0, 8);
        let hole = step(2, CreatorKind::Hole(hole));
        let drilled = hole
            .create_shell(&slab.create_shell(&Shell::new(), &context, None).unwrap(), &context, None)
            .unwrap();
        let rim = drilled
            .edges()
            .iter()
            .position(|e| {
                let forward = &drilled.faces()[e.forward_face].name;
                let backward = &drilled.faces()[e.backward_face.unwrap()].name;
                [forward.main(), backward.main()].contains(&Some(2))
                    && [forward.main(), backward.main()].contains(&Some(1))
            })
            .unwrap();
        assert!(rim >= 8);
        let chamfer = ChamferParams::new(capture_edges(&drilled, &[rim]).unwrap(), 0.05);

        let mut history = Transactions::new();
        history.add_creator(slab, AddMode::Share);
        history.add_creator(hole, AddMode::Share);
        history.add_creator(step(3, CreatorKind::Chamfer(chamfer)), AddMode::Share);
        history.set_creator_status(1, ProcessState::Skip).unwrap();

        let mut shell = Shell::new();
        let err = history.rebuild_item(&mut shell, &context, None, None).unwrap_err();
        let GeohistError::History(HistoryError::StepFailed { index: 2, name: "Chamfer", source }) =
            &err
        else {
            panic!("expected the chamfer step to fail, got {err:?}");
        };
        assert!(matches!(
            **source,
            GeohistError::Topology(TopologyError::StaleReference { kind: "edge", .. })
        ));
        assert_eq!(shell.face_count(), 6);
    }

    #[test]
    fn detach_and_reinsert_round_trips() {
        let mut history = machined_slab();
        let before = rebuild(&history).unwrap();
        let detached = history.detach_creator(1).unwrap();
        assert_eq!(history.creators_count(), 2);
        assert_eq!(history.find_creator(&detached), None);

        history.insert_creator(1, detached.clone(), AddMode::Share).unwrap();
        assert_eq!(history.find_creator(&detached), Some(1));
        let tolerance = BuildContext::default().tolerance;
        assert!(rebuild(&history).unwrap().approx_eq(&before, &tolerance));
        assert!(history.insert_creator(9, detached, AddMode::Share).is_err());
        history.delete_creator(2).unwrap();
        assert_eq!(history.creators_count(), 2);
    }

    #[test]
    fn infeasible_fillet_leaves_the_last_good_shell() {
        let mut history = Transactions::new();
        history.add_creator(block_at(1, Point3::origin(), [1.0, 1.0, 1.0]), AddMode::Share);
        history.add_creator(
            step(2, CreatorKind::Fillet(FilletParams::new(block_edges([1.0; 3], &[0]), 0.8, 3))),
            AddMode::Share,
        );
        let context = BuildContext::default();
        let mut shell = Shell::new();
        let err = history.rebuild_item(&mut shell, &context, None, None).unwrap_err();
        assert!(matches!(
            err,
            GeohistError::History(HistoryError::StepFailed { index: 1, name: "Fillet", .. })
        ));
        assert!(IsValid::new(context.tolerance).execute(&shell));
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(shell.face_count(), 6);
    }

    #[test]
    fn draft_tilts_one_face_by_five_degrees() {
        let context = BuildContext::default();
        let cube = block_at(1, Point3::origin(), [1.0, 1.0, 1.0]);
        let base = cube.create_shell(&Shell::new(), &context, None).unwrap();
        let neutral = base.faces()[0].plane.clone();
        let angle = 5f64.to_radians();

        let mut history = Transactions::new();
        history.add_creator(cube, AddMode::Share);
        history.add_creator(
            step(2, CreatorKind::Draft(DraftParams::new(neutral, angle, capture_faces(&base, &[2]).unwrap()))),
            AddMode::Share,
        );
        let shell = rebuild(&history).unwrap();
        assert_eq!(shell.face_count(), 6);
        let tilt = base.faces()[2].normal().angle(shell.faces()[2].normal());
        assert!((tilt - angle).abs() <= context.tolerance.angle);
    }

    #[test]
    fn symmetry_doubles_the_body() {
        let mut history = Transactions::new();
        history.add_creator(block_at(1, Point3::origin(), [1.0, 1.0, 1.0]), AddMode::Share);
        history.add_creator(
            step(
                2,
                CreatorKind::Symmetry(SymmetryParams::new(
                    Plane::from_normal(Point3::origin(), Vector3::x()).unwrap(),
                    MergingFlags::new(true, true),
                )),
            ),
            AddMode::Share,
        );
        let shell = rebuild(&history).unwrap();
        assert_eq!(shell.face_count(), 6);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn moving_the_history_moves_every_step_once() {
        let tool = block_at(5, p(1.0, 0.0, 0.0), [1.0, 1.0, 1.0]);
        let mut history = Transactions::new();
        history.add_creator(block_at(1, Point3::origin(), [1.0, 1.0, 1.0]), AddMode::Share);
        history.add_creator(
            step(
                6,
                CreatorKind::Union(UnionParams::new(vec![tool.clone()], MergingFlags::default())),
            ),
            AddMode::Share,
        );
        history.add_creator(history.creator(1).unwrap().clone(), AddMode::Share);
        history.set_creator_status(2, ProcessState::Skip).unwrap();

        history.move_by(&Vector3::new(0.0, 0.0, 3.0), None).unwrap();
        assert_relative_eq!(tool.read().basis_points()[0], p(1.0, 0.0, 3.0), epsilon = 1e-12);

        let shell = rebuild(&history).unwrap();
        let bb = BoundingBox::new().execute(&shell).unwrap();
        assert_relative_eq!(bb.min, p(0.0, 0.0, 3.0), epsilon = 1e-9);
        assert_relative_eq!(bb.max, p(2.0, 1.0, 4.0), epsilon = 1e-9);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn transforming_the_history_matches_transforming_its_result() {
        let history = machined_slab();
        let mut expected = rebuild(&history).unwrap();
        let matrix = Matrix4::new_translation(&Vector3::new(1.0, -2.0, 0.5))
            * Matrix4::new_scaling(2.0);
        GeneralTransform::new(matrix).execute(&mut expected).unwrap();

        history.transform(&matrix, None).unwrap();
        let moved = rebuild(&history).unwrap();
        assert!(moved.approx_eq(&expected, &BuildContext::default().tolerance));
        assert_relative_eq!(
            Volume::new().execute(&moved).unwrap(),
            8.0 * Volume::new().execute(&rebuild(&machined_slab()).unwrap()).unwrap(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn shear_is_refused_before_any_step_moves() {
        let history = machined_slab();
        let mut snapshot = Transactions::new();
        history.creators_copy(&mut snapshot, None);

        // x += y
        let mut shear = Matrix4::identity();
        shear[(0, 1)] = 1.0;
        let err = history.transform(&shear, None).unwrap_err();
        assert!(matches!(err, GeohistError::Geometry(_)));
        assert!(history.is_same(&snapshot, 0.0));
    }

    #[test]
    fn cancelled_rebuild_stops_between_steps() {
        let history = machined_slab();
        let context = BuildContext::default();
        let mut polls = Vec::new();
        let mut stop_after_first = |done: usize, total: usize| {
            polls.push((done, total));
            done < 1
        };
        let mut shell = Shell::new();
        let err = history
            .rebuild_item(&mut shell, &context, None, Some(&mut stop_after_first))
            .unwrap_err();
        assert!(matches!(
            err,
            GeohistError::History(HistoryError::Cancelled { completed: 1 })
        ));
        assert_eq!(polls, [(0, 3), (1, 3)]);
        assert_relative_eq!(Volume::new().execute(&shell).unwrap(), 32.0, epsilon = 1e-12);
    }

    #[test]
    fn replay_continues_from_a_step() {
        let history = machined_slab();
        let context = BuildContext::default();
        let mut shell = history
            .creator(0)
            .unwrap()
            .create_shell(&Shell::new(), &context, None)
            .unwrap();
        let mut aux = Vec::new();
        history.replay(1, &mut shell, &context, Some(&mut aux), None).unwrap();
        assert!(shell.approx_eq(&rebuild(&history).unwrap(), &context.tolerance));
        assert!(aux.iter().any(|item| matches!(item, AuxItem::Arc(_))));
        assert!(history.replay(4, &mut shell, &context, None, None).is_err());
    }

    #[test]
    fn set_creators_equal_checks_every_pair_first() {
        let history = machined_slab();
        let mut other = Transactions::new();
        history.creators_copy(&mut other, None);
        other
            .creator(1)
            .unwrap()
            .write()
            .set_properties(
                &crate::creators::PropertyBag::new()
                    .with("radius", crate::creators::PropertyValue::Real(0.3)),
            )
            .unwrap();
        assert!(!history.is_same(&other, 1e-9));
        assert!(history.is_similar(&other));
        history.set_creators_equal(&other).unwrap();
        assert!(history.is_same(&other, 1e-9));
        assert_eq!(history.creator(1).unwrap().read().names().main_name(), 2);

        let mut mismatched = Transactions::new();
        mismatched.add_creator(block_at(1, Point3::origin(), [1.0, 1.0, 1.0]), AddMode::Copy);
        mismatched.add_creator(
            step(9, CreatorKind::Chamfer(ChamferParams::new(block_edges([1.0; 3], &[0]), 0.1))),
            AddMode::Copy,
        );
        mismatched.add_creator(history.creator(2).unwrap().clone(), AddMode::Copy);
        let mut snapshot = Transactions::new();
        history.creators_copy(&mut snapshot, None);
        assert!(history.set_creators_equal(&mismatched).is_err());
        assert!(history.is_same(&snapshot, 0.0));

        let err = history.set_creators_equal(&Transactions::new()).unwrap_err();
        assert!(matches!(
            err,
            GeohistError::History(HistoryError::LengthMismatch { left: 3, right: 0 })
        ));
    }

    #[test]
    fn assign_shares_the_creators() {
        let history = machined_slab();
        let mut alias = Transactions::new();
        alias.creators_assign(&history);
        assert_eq!(alias.find_creator(history.creator(2).unwrap()), Some(2));
    }

    proptest! {
        #[test]
        fn any_active_prefix_rebuilds_like_its_truncation(count in 0..=3usize) {
            let mut history = machined_slab();
            history.set_active_creators_count(count).unwrap();
            let mut truncated = Transactions::new();
            for creator in history.creators().take(count) {
                truncated.add_creator(creator.clone(), AddMode::Share);
            }
            let tolerance = BuildContext::default().tolerance;
            prop_assert!(rebuild(&history).unwrap().approx_eq(&rebuild(&truncated).unwrap(), &tolerance));
        }
    }
}
