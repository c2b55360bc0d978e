use std::fmt;

/// One component of a topological name.
pub type SimpleName = u32;

/// Converts a creator-local index into a name component, saturating at
/// the largest representable value.
#[must_use]
pub fn index_name(index: usize) -> SimpleName {
    SimpleName::try_from(index).unwrap_or(SimpleName::MAX)
}

/// A persistent, hierarchical name attached to a face.
///
/// The first component is the main name of the creator that generated the
/// face; the rest are creator-local indices. Faces copied by a later step
/// get that step's main name appended, so names stay unique and stable
/// across rebuilds as long as the history is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Vec<SimpleName>);

impl Name {
    /// Creates a name from its components.
    #[must_use]
    pub fn new(path: Vec<SimpleName>) -> Self {
        Self(path)
    }

    /// Returns the name components.
    #[must_use]
    pub fn path(&self) -> &[SimpleName] {
        &self.0
    }

    /// Main name of the creator that first generated the face.
    #[must_use]
    pub fn main(&self) -> Option<SimpleName> {
        self.0.first().copied()
    }

    /// This name with `main` appended (used for copied topology).
    #[must_use]
    pub fn derived(&self, main: SimpleName) -> Self {
        let mut path = self.0.clone();
        path.push(main);
        Self(path)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Produces names for the topology generated by one creator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NameMaker {
    main_name: SimpleName,
}

impl NameMaker {
    /// Creates a name maker for a creator with the given main name.
    #[must_use]
    pub fn new(main_name: SimpleName) -> Self {
        Self { main_name }
    }

    /// Returns the main name.
    #[must_use]
    pub fn main_name(&self) -> SimpleName {
        self.main_name
    }

    /// Name of a face generated by this creator.
    #[must_use]
    pub fn face_name(&self, local: &[SimpleName]) -> Name {
        let mut path = Vec::with_capacity(local.len() + 1);
        path.push(self.main_name);
        path.extend_from_slice(local);
        Name(path)
    }

    /// Name of a face copied from `original` by this creator.
    #[must_use]
    pub fn copy_name(&self, original: &Name) -> Name {
        original.derived(self.main_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_and_copied_names() {
        let maker = NameMaker::new(7);
        let face = maker.face_name(&[2, 0]);
        assert_eq!(face.path(), &[7, 2, 0]);
        assert_eq!(face.main(), Some(7));

        let copy = NameMaker::new(9).copy_name(&face);
        assert_eq!(copy.to_string(), "7.2.0.9");
        assert_ne!(copy, face);
    }
}
