use crate::geometry::curve::{Arc, Line};
use crate::geometry::surface::Plane;
use crate::math::Point3;
use crate::topology::Shell;

/// Helper geometry emitted next to a constructed shell, for display or
/// diagnostics. It never takes part in later construction steps.
#[derive(Debug, Clone)]
pub enum AuxItem {
    Point(Point3),
    Line(Line),
    Arc(Arc),
    Plane(Plane),
}

/// The result of an operation that emits helper geometry.
#[derive(Debug, Clone)]
pub struct Construction {
    /// The constructed shell.
    pub shell: Shell,
    /// Helper geometry describing how it was constructed.
    pub aux: Vec<AuxItem>,
}

impl Construction {
    /// Wraps a shell with no helper geometry.
    #[must_use]
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            aux: Vec::new(),
        }
    }

    /// Moves the helper geometry into `sink`, if one is given, and returns
    /// the shell.
    pub fn into_shell(self, sink: Option<&mut Vec<AuxItem>>) -> Shell {
        if let Some(sink) = sink {
            sink.extend(self.aux);
        }
        self.shell
    }
}
