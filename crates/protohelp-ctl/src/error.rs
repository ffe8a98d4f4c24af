//! Error type for `protohelp` commands.

use std::path::PathBuf;

use protohelp_sdk::{CodegenError, DescriptorError};
use thiserror::Error;

pub(crate) type CtlResult<T> = Result<T, CtlError>;

#[derive(Debug, Error)]
pub(crate) enum CtlError {
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("failed to serialize plan: {0}")]
    Serialize(String),
}

impl CtlError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
