use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::stage::layout::validate_segment;

/// One submission: what to package, from where, to where.
///
/// Fields are fixed at construction; the identifier names the package
/// directory, so it must be a single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    id: String,
    entity_type: String,
    code: String,
    source: PathBuf,
    target: PathBuf,
}

impl SubmissionRequest {
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        code: impl Into<String>,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Result<Self> {
        let id = id.into();
        validate_segment(&id, "submission identifier").context("invalid submission identifier")?;
        Ok(Self {
            id,
            entity_type: entity_type.into(),
            code: code.into(),
            source: source.into(),
            target: target.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Representation entity type; may be empty.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Representation code; may be empty.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}
