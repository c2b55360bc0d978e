//! Recorded, replayable modeling steps.
//!
//! A [`Creator`] stores the parameters of one modeling operation and can
//! rebuild its contribution to a shell from them at any time. Creators are
//! shared through [`CreatorRef`] handles; duplication and transformation
//! passes over graphs of shared creators go through the registrars so that
//! every creator is copied or moved exactly once.

mod block;
mod chamfer;
mod draft;
mod extrusion;
mod fillet;
mod hole;
mod properties;
mod registrar;
mod revolution;
mod symmetry;
mod transformed;
mod union;

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub use block::{create_block, BlockParams};
pub use chamfer::{create_chamfer, ChamferParams};
pub use draft::{create_draft, DraftParams};
pub use extrusion::{create_extrusion, ExtrusionParams};
pub use fillet::{create_fillet, FilletParams};
pub use hole::{create_hole, HoleParams};
pub use properties::{PropertyBag, PropertyValue};
pub use registrar::{AutoRegDuplicate, AutoRegTransform, RegDuplicate, RegTransform};
pub use revolution::{create_revolution, RevolutionParams};
pub use symmetry::{create_symmetry, SymmetryParams};
pub use transformed::{create_transformed, TransformedParams};
pub use union::{create_union, UnionParams};

use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::transform::{
    linear_determinant, rotation_about_axis, similarity_scale, translation,
};
use crate::math::{Matrix4, Point3, ToleranceConfig, Vector3};
use crate::operations::boolean::{BooleanEngine, ContactUnion};
use crate::operations::{AuxItem, Construction};
use crate::topology::{NameMaker, Shell};

/// Stable tag of a creator's operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatorType {
    Block,
    Extrusion,
    Revolution,
    Fillet,
    Chamfer,
    Draft,
    Hole,
    Symmetry,
    Union,
    Transformed,
}

impl CreatorType {
    /// Human-readable operation label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::Extrusion => "Extrusion",
            Self::Revolution => "Revolution",
            Self::Fillet => "Fillet",
            Self::Chamfer => "Chamfer",
            Self::Draft => "Draft",
            Self::Hole => "Hole",
            Self::Symmetry => "Symmetry",
            Self::Union => "Union",
            Self::Transformed => "Transformed",
        }
    }
}

impl fmt::Display for CreatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters of a creator, one variant per operation kind.
#[derive(Debug, Clone)]
pub enum CreatorKind {
    Block(BlockParams),
    Extrusion(ExtrusionParams),
    Revolution(RevolutionParams),
    Fillet(FilletParams),
    Chamfer(ChamferParams),
    Draft(DraftParams),
    Hole(HoleParams),
    Symmetry(SymmetryParams),
    Union(UnionParams),
    Transformed(TransformedParams),
}

impl CreatorKind {
    /// The tag of this variant.
    #[must_use]
    pub fn creator_type(&self) -> CreatorType {
        match self {
            Self::Block(_) => CreatorType::Block,
            Self::Extrusion(_) => CreatorType::Extrusion,
            Self::Revolution(_) => CreatorType::Revolution,
            Self::Fillet(_) => CreatorType::Fillet,
            Self::Chamfer(_) => CreatorType::Chamfer,
            Self::Draft(_) => CreatorType::Draft,
            Self::Hole(_) => CreatorType::Hole,
            Self::Symmetry(_) => CreatorType::Symmetry,
            Self::Union(_) => CreatorType::Union,
            Self::Transformed(_) => CreatorType::Transformed,
        }
    }

    fn params(&self) -> &dyn Parameters {
        match self {
            Self::Block(p) => p,
            Self::Extrusion(p) => p,
            Self::Revolution(p) => p,
            Self::Fillet(p) => p,
            Self::Chamfer(p) => p,
            Self::Draft(p) => p,
            Self::Hole(p) => p,
            Self::Symmetry(p) => p,
            Self::Union(p) => p,
            Self::Transformed(p) => p,
        }
    }

    fn params_mut(&mut self) -> &mut dyn Parameters {
        match self {
            Self::Block(p) => p,
            Self::Extrusion(p) => p,
            Self::Revolution(p) => p,
            Self::Fillet(p) => p,
            Self::Chamfer(p) => p,
            Self::Draft(p) => p,
            Self::Hole(p) => p,
            Self::Symmetry(p) => p,
            Self::Union(p) => p,
            Self::Transformed(p) => p,
        }
    }
}

/// Behaviour every parameter set provides to [`Creator`].
pub(crate) trait Parameters {
    /// Builds the creator's result from `input`, which is left untouched.
    fn build(&self, input: &Shell, names: &NameMaker, context: &BuildContext)
        -> Result<Construction>;

    /// Applies `matrix` to every spatial parameter.
    fn transform(&mut self, matrix: &Matrix4, registrar: &mut RegTransform) -> Result<()>;

    fn is_same(&self, other: &Self, accuracy: f64) -> bool
    where
        Self: Sized;

    /// Whether `other` has the same parameter shape, so its values could be
    /// copied over.
    fn is_similar(&self, other: &Self) -> bool
    where
        Self: Sized;

    fn properties(&self) -> PropertyBag;

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()>;

    fn basis_items(&self) -> Vec<AuxItem> {
        Vec::new()
    }

    fn basis_points(&self) -> Vec<Point3> {
        Vec::new()
    }

    fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        expect_points(points, 0)
    }
}

/// Everything a creator needs besides its own parameters to build a shell.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Precision used by every geometric check.
    pub tolerance: ToleranceConfig,
    /// Boolean service used by creators that unite bodies.
    pub booleans: Arc<dyn BooleanEngine>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(ToleranceConfig::default())
    }
}

impl BuildContext {
    /// A context with the given tolerance and the built-in boolean engine.
    #[must_use]
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self {
            tolerance,
            booleans: Arc::new(ContactUnion),
        }
    }

    /// Replaces the boolean service.
    #[must_use]
    pub fn with_booleans(mut self, booleans: Arc<dyn BooleanEngine>) -> Self {
        self.booleans = booleans;
        self
    }
}

/// One recorded modeling step: a naming object plus the parameters of the
/// operation.
///
/// Holds no geometry of its own; [`create_shell`](Self::create_shell)
/// regenerates its contribution from the parameters every time.
#[derive(Debug, Clone)]
pub struct Creator {
    names: NameMaker,
    kind: CreatorKind,
}

impl Creator {
    /// Creates a new creator.
    #[must_use]
    pub fn new(names: NameMaker, kind: CreatorKind) -> Self {
        Self { names, kind }
    }

    /// The operation kind.
    #[must_use]
    pub fn is_a(&self) -> CreatorType {
        self.kind.creator_type()
    }

    /// Human-readable operation label.
    #[must_use]
    pub fn property_name(&self) -> &'static str {
        self.is_a().label()
    }

    #[must_use]
    pub fn names(&self) -> &NameMaker {
        &self.names
    }

    #[must_use]
    pub fn kind(&self) -> &CreatorKind {
        &self.kind
    }

    /// Builds the shell this step produces from `input`.
    ///
    /// `input` is never modified; on failure the caller still holds it
    /// unchanged. Helper geometry is appended to `aux` when given.
    ///
    /// # Errors
    ///
    /// Returns the parameter, topology or feasibility error that stopped
    /// the operation.
    pub fn create_shell(
        &self,
        input: &Shell,
        context: &BuildContext,
        aux: Option<&mut Vec<AuxItem>>,
    ) -> Result<Shell> {
        let construction = self.kind.params().build(input, &self.names, context)?;
        debug!(
            kind = self.property_name(),
            faces = construction.shell.face_count(),
            "creator built shell"
        );
        Ok(construction.into_shell(aux))
    }

    /// Replaces `shell` with the result of this step, or leaves it as it was
    /// on failure.
    ///
    /// # Errors
    ///
    /// See [`create_shell`](Self::create_shell).
    pub fn apply(
        &self,
        shell: &mut Shell,
        context: &BuildContext,
        aux: Option<&mut Vec<AuxItem>>,
    ) -> Result<()> {
        *shell = self.create_shell(shell, context, aux)?;
        Ok(())
    }

    /// A copy with identical parameters.
    ///
    /// Shared sub-creators are copied through `registrar`, so a sub-creator
    /// met twice in one pass yields a single shared copy.
    #[must_use]
    pub fn duplicate(&self, registrar: Option<&mut RegDuplicate>) -> Self {
        let mut auto = AutoRegDuplicate::new(registrar);
        let kind = match &self.kind {
            CreatorKind::Union(params) => CreatorKind::Union(params.duplicate(auto.registrar())),
            other => other.clone(),
        };
        Self {
            names: self.names.clone(),
            kind,
        }
    }

    /// Applies `matrix` to every spatial parameter.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`](crate::error::GeometryError)
    /// unless the matrix is a similarity (see [`similarity_scale`]). The
    /// check runs before anything moves, so the creator and any tool
    /// creators it shares are then unchanged.
    pub fn transform(
        &mut self,
        matrix: &Matrix4,
        registrar: Option<&mut RegTransform>,
    ) -> Result<()> {
        similarity_scale(matrix)?;
        let mut auto = AutoRegTransform::new(registrar);
        let mut next = self.kind.clone();
        next.params_mut().transform(matrix, auto.registrar())?;
        self.kind = next;
        Ok(())
    }

    /// Translates every spatial parameter by `offset`.
    ///
    /// # Errors
    ///
    /// See [`transform`](Self::transform).
    pub fn move_by(&mut self, offset: &Vector3, registrar: Option<&mut RegTransform>) -> Result<()> {
        self.transform(&translation(offset), registrar)
    }

    /// Rotates every spatial parameter by `angle` about `axis`.
    ///
    /// # Errors
    ///
    /// See [`transform`](Self::transform).
    pub fn rotate(
        &mut self,
        axis: &Line,
        angle: f64,
        registrar: Option<&mut RegTransform>,
    ) -> Result<()> {
        let matrix = rotation_about_axis(axis.origin(), axis.direction(), angle)?;
        self.transform(&matrix, registrar)
    }

    /// Whether both creators have the same kind and parameter values within
    /// `accuracy`. The naming objects are not compared.
    #[must_use]
    pub fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        use CreatorKind as K;
        match (&self.kind, &other.kind) {
            (K::Block(a), K::Block(b)) => a.is_same(b, accuracy),
            (K::Extrusion(a), K::Extrusion(b)) => a.is_same(b, accuracy),
            (K::Revolution(a), K::Revolution(b)) => a.is_same(b, accuracy),
            (K::Fillet(a), K::Fillet(b)) => a.is_same(b, accuracy),
            (K::Chamfer(a), K::Chamfer(b)) => a.is_same(b, accuracy),
            (K::Draft(a), K::Draft(b)) => a.is_same(b, accuracy),
            (K::Hole(a), K::Hole(b)) => a.is_same(b, accuracy),
            (K::Symmetry(a), K::Symmetry(b)) => a.is_same(b, accuracy),
            (K::Union(a), K::Union(b)) => a.is_same(b, accuracy),
            (K::Transformed(a), K::Transformed(b)) => a.is_same(b, accuracy),
            _ => false,
        }
    }

    /// Whether `other` has the same kind and parameter shape, so that
    /// [`set_equal`](Self::set_equal) would succeed.
    #[must_use]
    pub fn is_similar(&self, other: &Self) -> bool {
        use CreatorKind as K;
        match (&self.kind, &other.kind) {
            (K::Block(a), K::Block(b)) => a.is_similar(b),
            (K::Extrusion(a), K::Extrusion(b)) => a.is_similar(b),
            (K::Revolution(a), K::Revolution(b)) => a.is_similar(b),
            (K::Fillet(a), K::Fillet(b)) => a.is_similar(b),
            (K::Chamfer(a), K::Chamfer(b)) => a.is_similar(b),
            (K::Draft(a), K::Draft(b)) => a.is_similar(b),
            (K::Hole(a), K::Hole(b)) => a.is_similar(b),
            (K::Symmetry(a), K::Symmetry(b)) => a.is_similar(b),
            (K::Union(a), K::Union(b)) => a.is_similar(b),
            (K::Transformed(a), K::Transformed(b)) => a.is_similar(b),
            _ => false,
        }
    }

    /// Copies the parameter values of `other` into this creator, keeping
    /// its naming object.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Incompatible`] if the creators are not
    /// similar; this creator is then unchanged.
    pub fn set_equal(&mut self, other: &Self) -> Result<()> {
        if !self.is_similar(other) {
            return Err(OperationError::Incompatible(format!(
                "cannot copy {} parameters into {}",
                other.property_name(),
                self.property_name()
            ))
            .into());
        }
        self.kind = other.kind.clone();
        Ok(())
    }

    /// Reflects the parameters into a property bag.
    #[must_use]
    pub fn properties(&self) -> PropertyBag {
        self.kind.params().properties()
    }

    /// Writes every entry of `bag` into the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for an unknown or read-only
    /// name or a value of the wrong type. Nothing is written in that case.
    pub fn set_properties(&mut self, bag: &PropertyBag) -> Result<()> {
        let mut next = self.kind.clone();
        for (name, value) in bag.iter() {
            next.params_mut().set_property(name, value)?;
        }
        self.kind = next;
        Ok(())
    }

    /// Defining geometry, for display while editing.
    #[must_use]
    pub fn basis_items(&self) -> Vec<AuxItem> {
        self.kind.params().basis_items()
    }

    /// Control points that can be dragged to edit the step.
    #[must_use]
    pub fn basis_points(&self) -> Vec<Point3> {
        self.kind.params().basis_points()
    }

    /// Moves the control points returned by
    /// [`basis_points`](Self::basis_points).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the number of points
    /// differs.
    pub fn set_basis_points(&mut self, points: &[Point3]) -> Result<()> {
        self.kind.params_mut().set_basis_points(points)
    }
}

/// Shared handle to a [`Creator`].
///
/// Clones share the creator; [`ptr_eq`](Self::ptr_eq) compares identity.
#[derive(Debug, Clone)]
pub struct CreatorRef(Arc<RwLock<Creator>>);

impl From<Creator> for CreatorRef {
    fn from(creator: Creator) -> Self {
        Self::new(creator)
    }
}

impl CreatorRef {
    #[must_use]
    pub fn new(creator: Creator) -> Self {
        Self(Arc::new(RwLock::new(creator)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Creator> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Creator> {
        self.0.write()
    }

    /// Whether both handles point to the same creator.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles sharing this creator.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    #[must_use]
    pub fn is_a(&self) -> CreatorType {
        self.read().is_a()
    }

    #[must_use]
    pub fn property_name(&self) -> &'static str {
        self.read().property_name()
    }

    /// See [`Creator::create_shell`].
    ///
    /// # Errors
    ///
    /// See [`Creator::create_shell`].
    pub fn create_shell(
        &self,
        input: &Shell,
        context: &BuildContext,
        aux: Option<&mut Vec<AuxItem>>,
    ) -> Result<Shell> {
        self.read().create_shell(input, context, aux)
    }

    /// A handle to a copy of the creator.
    ///
    /// Within one registrar pass the same creator is copied only once and
    /// later calls return the handle of that copy.
    #[must_use]
    pub fn duplicate(&self, registrar: Option<&mut RegDuplicate>) -> Self {
        let mut auto = AutoRegDuplicate::new(registrar);
        let registrar = auto.registrar();
        if let Some(copy) = registrar.is_reg(&self.0) {
            debug!(kind = self.property_name(), "reusing registered copy");
            return Self(copy);
        }
        // Registered before the tools are copied, so a tool history that
        // leads back here reuses this copy instead of recursing.
        let source = self.read().clone();
        let copy = Self::new(source.clone());
        registrar.set_reg(&self.0, &copy.0);
        *copy.write() = source.duplicate(Some(&mut *registrar));
        copy
    }

    /// Transforms the creator unless this registrar pass already did.
    ///
    /// # Errors
    ///
    /// See [`Creator::transform`].
    pub fn transform(&self, matrix: &Matrix4, registrar: Option<&mut RegTransform>) -> Result<()> {
        let mut auto = AutoRegTransform::new(registrar);
        let registrar = auto.registrar();
        if registrar.is_set_reg(&self.0) {
            debug!(kind = self.property_name(), "creator already transformed");
            return Ok(());
        }
        let mut next = self.read().clone();
        next.transform(matrix, Some(registrar))?;
        *self.write() = next;
        Ok(())
    }

    /// See [`Creator::move_by`].
    ///
    /// # Errors
    ///
    /// See [`Creator::transform`].
    pub fn move_by(&self, offset: &Vector3, registrar: Option<&mut RegTransform>) -> Result<()> {
        self.transform(&translation(offset), registrar)
    }

    /// See [`Creator::rotate`].
    ///
    /// # Errors
    ///
    /// See [`Creator::transform`].
    pub fn rotate(&self, axis: &Line, angle: f64, registrar: Option<&mut RegTransform>) -> Result<()> {
        let matrix = rotation_about_axis(axis.origin(), axis.direction(), angle)?;
        self.transform(&matrix, registrar)
    }

    #[must_use]
    pub fn is_same(&self, other: &Self, accuracy: f64) -> bool {
        self.ptr_eq(other) || self.read().is_same(&other.read(), accuracy)
    }

    #[must_use]
    pub fn is_similar(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.read().is_similar(&other.read())
    }

    /// See [`Creator::set_equal`]; a no-op when both handles share the
    /// creator.
    ///
    /// # Errors
    ///
    /// See [`Creator::set_equal`].
    pub fn set_equal(&self, other: &Self) -> Result<()> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        let source = other.read().clone();
        self.write().set_equal(&source)
    }
}

/// Builds a creator's shell and returns it together with the shared
/// creator.
fn record(input: &Shell, creator: Creator, context: &BuildContext) -> Result<(Shell, CreatorRef)> {
    let shell = creator.create_shell(input, context, None)?;
    Ok((shell, CreatorRef::new(creator)))
}

fn require_empty(input: &Shell, what: &str) -> Result<()> {
    if input.is_empty() {
        Ok(())
    } else {
        Err(OperationError::InvalidInput(format!("{what} must start from an empty shell")).into())
    }
}

fn require_body(input: &Shell, what: &str) -> Result<()> {
    if input.is_empty() {
        Err(OperationError::InvalidInput(format!("{what} needs a body to work on")).into())
    } else {
        Ok(())
    }
}

fn expect_points(points: &[Point3], count: usize) -> Result<()> {
    if points.len() == count {
        Ok(())
    } else {
        Err(OperationError::InvalidInput(format!(
            "expected {count} basis points, got {}",
            points.len()
        ))
        .into())
    }
}

/// Uniform scale picked up by lengths under `matrix`.
fn length_scale(matrix: &Matrix4) -> f64 {
    linear_determinant(matrix).abs().cbrt()
}

fn same_real(a: f64, b: f64, accuracy: f64) -> bool {
    (a - b).abs() <= accuracy
}

fn same_point(a: &Point3, b: &Point3, accuracy: f64) -> bool {
    (a - b).norm() <= accuracy
}

fn same_vector(a: &Vector3, b: &Vector3, accuracy: f64) -> bool {
    (a - b).norm() <= accuracy
}

fn same_points(a: &[Point3], b: &[Point3], accuracy: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| same_point(p, q, accuracy))
}

fn same_line(a: &Line, b: &Line, accuracy: f64) -> bool {
    same_point(a.origin(), b.origin(), accuracy)
        && same_vector(a.direction(), b.direction(), accuracy)
}

fn same_plane(a: &Plane, b: &Plane, accuracy: f64) -> bool {
    same_point(a.origin(), b.origin(), accuracy)
        && same_vector(a.plane_normal(), b.plane_normal(), accuracy)
}
