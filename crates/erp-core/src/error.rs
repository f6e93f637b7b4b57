use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::region::RegionError;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("structure error: {reason}")]
    Structure { reason: String },

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("decode error at offset {offset:#x}: {reason}")]
    Decode { offset: usize, reason: String },

    #[error("invalid preset slot: {slot} (must be 1-15)")]
    InvalidSlot { slot: i64 },

    #[error("preset slot {slot} is empty")]
    EmptySlot { slot: u8 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("import error: {reason}")]
    Import { reason: String },

    #[error("no save directory given and APPDATA is not set")]
    NoSaveRoot,
}

/// Coarse classification used by front-ends to pick exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    Structure,
    SizeMismatch,
    Decode,
    InvalidSlot,
    EmptySlot,
    Document,
}

impl PresetError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PresetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn structure(reason: impl Into<String>) -> Self {
        PresetError::Structure {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PresetError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            PresetError::Io { .. } => ErrorKind::Io,
            PresetError::NoSaveRoot => ErrorKind::FileNotFound,
            PresetError::Structure { .. } | PresetError::Region(_) => ErrorKind::Structure,
            PresetError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            PresetError::Decode { .. } => ErrorKind::Decode,
            PresetError::InvalidSlot { .. } => ErrorKind::InvalidSlot,
            PresetError::EmptySlot { .. } => ErrorKind::EmptySlot,
            PresetError::Json(_) | PresetError::Import { .. } => ErrorKind::Document,
        }
    }
}

pub type Result<T, E = PresetError> = std::result::Result<T, E>;
