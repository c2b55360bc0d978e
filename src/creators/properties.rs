use std::fmt;

use crate::error::{OperationError, Result};
use crate::math::{Matrix4, Point3, Vector3};

/// A single reflected parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Real(f64),
    Count(usize),
    Flag(bool),
    Point(Point3),
    Vector(Vector3),
    Indices(Vec<usize>),
    Matrix(Matrix4),
}

impl PropertyValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Real(_) => "real",
            Self::Count(_) => "count",
            Self::Flag(_) => "flag",
            Self::Point(_) => "point",
            Self::Vector(_) => "vector",
            Self::Indices(_) => "indices",
            Self::Matrix(_) => "matrix",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(v) => write!(f, "{v}"),
            Self::Count(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Point(p) => write!(f, "({}, {}, {})", p.x, p.y, p.z),
            Self::Vector(v) => write!(f, "<{}, {}, {}>", v.x, v.y, v.z),
            Self::Indices(v) => write!(f, "{v:?}"),
            Self::Matrix(_) => write!(f, "matrix"),
        }
    }
}

/// Ordered name/value list reflecting a creator's parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: Vec<(&'static str, PropertyValue)>,
}

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing an existing entry of that name.
    pub fn insert(&mut self, name: &'static str, value: PropertyValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn mismatch(name: &str, expected: &str, value: &PropertyValue) -> crate::error::GeohistError {
    OperationError::InvalidInput(format!(
        "property {name} expects a {expected}, got a {}",
        value.kind()
    ))
    .into()
}

/// Error for a property name a creator does not have.
pub(crate) fn unknown(name: &str) -> crate::error::GeohistError {
    OperationError::InvalidInput(format!("unknown property {name}")).into()
}

/// Error for a property that can be read but not written.
pub(crate) fn read_only(name: &str) -> crate::error::GeohistError {
    OperationError::InvalidInput(format!("property {name} is read-only")).into()
}

pub(crate) fn as_real(name: &str, value: &PropertyValue) -> Result<f64> {
    match value {
        PropertyValue::Real(v) => Ok(*v),
        other => Err(mismatch(name, "real", other)),
    }
}

pub(crate) fn as_count(name: &str, value: &PropertyValue) -> Result<usize> {
    match value {
        PropertyValue::Count(v) => Ok(*v),
        other => Err(mismatch(name, "count", other)),
    }
}

pub(crate) fn as_flag(name: &str, value: &PropertyValue) -> Result<bool> {
    match value {
        PropertyValue::Flag(v) => Ok(*v),
        other => Err(mismatch(name, "flag", other)),
    }
}

pub(crate) fn as_point(name: &str, value: &PropertyValue) -> Result<Point3> {
    match value {
        PropertyValue::Point(v) => Ok(*v),
        other => Err(mismatch(name, "point", other)),
    }
}

pub(crate) fn as_vector(name: &str, value: &PropertyValue) -> Result<Vector3> {
    match value {
        PropertyValue::Vector(v) => Ok(*v),
        other => Err(mismatch(name, "vector", other)),
    }
}

pub(crate) fn as_matrix(name: &str, value: &PropertyValue) -> Result<Matrix4> {
    match value {
        PropertyValue::Matrix(v) => Ok(*v),
        other => Err(mismatch(name, "matrix", other)),
    }
}
