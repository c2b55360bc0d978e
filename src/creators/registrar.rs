use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

type Shared = Arc<dyn Any + Send + Sync>;

/// Identity of a shared object: the address of its allocation.
fn identity<T: ?Sized>(object: &Arc<T>) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}

/// Memo of the copies made during one duplication pass.
///
/// Keyed by the address of the original allocation. The originals are kept
/// alive until [`free`](Self::free) so that no address is reused while the
/// pass runs.
#[derive(Default)]
pub struct RegDuplicate {
    copies: HashMap<usize, (Shared, Shared)>,
}

impl RegDuplicate {
    /// Creates an empty registrar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The copy already made of `original` in this pass, if any.
    #[must_use]
    pub fn is_reg<T: Any + Send + Sync>(&self, original: &Arc<T>) -> Option<Arc<T>> {
        let (_, copy) = self.copies.get(&identity(original))?;
        Arc::clone(copy).downcast::<T>().ok()
    }

    /// Records `copy` as the copy of `original`.
    pub fn set_reg<T: Any + Send + Sync>(&mut self, original: &Arc<T>, copy: &Arc<T>) {
        let original: Shared = Arc::clone(original) as Shared;
        let copy: Shared = Arc::clone(copy) as Shared;
        self.copies.insert(identity(&original), (original, copy));
    }

    /// Number of originals registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.copies.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Drops every registration, releasing the references it held.
    pub fn free(&mut self) {
        if !self.copies.is_empty() {
            debug!(entries = self.copies.len(), "freeing duplicate registrar");
        }
        self.copies.clear();
    }
}

impl std::fmt::Debug for RegDuplicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegDuplicate")
            .field("entries", &self.copies.len())
            .finish()
    }
}

/// Set of the objects already transformed during one transformation pass.
#[derive(Default)]
pub struct RegTransform {
    visited: HashMap<usize, Shared>,
}

impl RegTransform {
    /// Creates an empty registrar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `object` was already registered, registering it
    /// otherwise.
    pub fn is_set_reg<T: Any + Send + Sync>(&mut self, object: &Arc<T>) -> bool {
        let object: Shared = Arc::clone(object) as Shared;
        let key = identity(&object);
        if self.visited.contains_key(&key) {
            return true;
        }
        self.visited.insert(key, object);
        false
    }

    /// Number of objects registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Drops every registration.
    pub fn free(&mut self) {
        if !self.visited.is_empty() {
            debug!(entries = self.visited.len(), "freeing transform registrar");
        }
        self.visited.clear();
    }
}

impl std::fmt::Debug for RegTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegTransform")
            .field("entries", &self.visited.len())
            .finish()
    }
}

/// Scope guard handing out a duplication registrar.
///
/// Borrows the caller's registrar when one is given, so an enclosing pass
/// keeps its memo. Otherwise it owns a fresh one and frees it on drop.
pub struct AutoRegDuplicate<'a> {
    borrowed: Option<&'a mut RegDuplicate>,
    owned: RegDuplicate,
}

impl<'a> AutoRegDuplicate<'a> {
    #[must_use]
    pub fn new(registrar: Option<&'a mut RegDuplicate>) -> Self {
        Self {
            borrowed: registrar,
            owned: RegDuplicate::new(),
        }
    }

    /// The registrar in effect for this scope.
    pub fn registrar(&mut self) -> &mut RegDuplicate {
        match self.borrowed.as_deref_mut() {
            Some(registrar) => registrar,
            None => &mut self.owned,
        }
    }
}

impl Drop for AutoRegDuplicate<'_> {
    fn drop(&mut self) {
        self.owned.free();
    }
}

/// Scope guard handing out a transformation registrar; see
/// [`AutoRegDuplicate`].
pub struct AutoRegTransform<'a> {
    borrowed: Option<&'a mut RegTransform>,
    owned: RegTransform,
}

impl<'a> AutoRegTransform<'a> {
    #[must_use]
    pub fn new(registrar: Option<&'a mut RegTransform>) -> Self {
        Self {
            borrowed: registrar,
            owned: RegTransform::new(),
        }
    }

    /// The registrar in effect for this scope.
    pub fn registrar(&mut self) -> &mut RegTransform {
        match self.borrowed.as_deref_mut() {
            Some(registrar) => registrar,
            None => &mut self.owned,
        }
    }
}

impl Drop for AutoRegTransform<'_> {
    fn drop(&mut self) {
        self.owned.free();
    }
}
