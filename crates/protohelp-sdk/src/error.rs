//! Errors collected during a generation run.

use std::fmt;

use thiserror::Error;

use crate::annotation::PrimitiveType;

/// Where in the schema a problem was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub entity: String,
    pub field: Option<String>,
}

impl Location {
    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            field: None,
        }
    }

    pub fn field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.entity, field),
            None => write!(f, "{}", self.entity),
        }
    }
}

/// A malformed annotation payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed `{annotation}` annotation: {reason}")]
pub struct AnnotationReadError {
    pub annotation: String,
    pub reason: String,
}

/// One problem found while aggregating or planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{location}: malformed `{annotation}` annotation: {reason}")]
    AnnotationRead {
        location: Location,
        annotation: String,
        reason: String,
    },

    #[error("{location}: unsupported field type `{proto_type}`")]
    UnknownPrimitiveType {
        location: Location,
        proto_type: String,
    },

    #[error("`{incoming}` and `{existing}` both resolve to plan key `{key}`")]
    NameCollision {
        key: String,
        existing: String,
        incoming: String,
    },

    #[error("{entity}: `pick` requested without a `pick_with` source entity")]
    MissingPickTarget { entity: String },

    #[error("{entity}.{field}: path parameters bind only to numeric fields, not `{primitive}`")]
    UnsupportedPathBinding {
        entity: String,
        field: String,
        primitive: PrimitiveType,
    },
}

impl GenerationError {
    pub(crate) fn annotation_read(location: Location, err: AnnotationReadError) -> Self {
        Self::AnnotationRead {
            location,
            annotation: err.annotation,
            reason: err.reason,
        }
    }

    /// Name collisions mean the disambiguation rule itself failed.
    pub fn is_internal(&self) -> bool {
        matches!(self, GenerationError::NameCollision { .. })
    }
}

/// Every error collected over one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub errors: Vec<GenerationError>,
}

impl GenerationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: GenerationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = GenerationError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} generation error(s)", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationReport {}
