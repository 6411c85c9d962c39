//! MVNX document processing
//!
//! The pipeline runs strictly forward on one thread per document:
//! markup events ([`event`]) are folded into an attributed tree ([`tree`]),
//! the tree's root `version` attribute selects a field-name mapping
//! ([`schema`]), the mapped tree is walked into typed frame records
//! ([`frames`]) and metadata collections ([`metadata`]), and those feed the
//! tabular and round-trip writers ([`output`]). [`reader`] wires the whole
//! chain behind one type.

pub mod event;
pub mod frames;
pub mod metadata;
pub mod output;
pub mod reader;
pub mod schema;
pub mod tree;

use std::fmt;

use self::frames::ExtractError;
use self::schema::VersionError;
use self::tree::StructuralError;

/// Any error the document pipeline can stop on.
#[derive(Debug)]
pub enum MvnxError {
    /// The event stream violated a document-level invariant.
    Structural(StructuralError),
    /// The document revision could not be determined.
    Version(VersionError),
    /// Frame extraction failed.
    Extraction(ExtractError),
    /// The underlying markup could not be tokenized.
    Xml(String),
    Io(std::io::Error),
}

impl fmt::Display for MvnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MvnxError::Structural(e) => write!(f, "structural violation: {e}"),
            MvnxError::Version(e) => write!(f, "version resolution failed: {e}"),
            MvnxError::Extraction(e) => write!(f, "frame extraction failed: {e}"),
            MvnxError::Xml(msg) => write!(f, "markup error: {msg}"),
            MvnxError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for MvnxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MvnxError::Structural(e) => Some(e),
            MvnxError::Version(e) => Some(e),
            MvnxError::Extraction(e) => Some(e),
            MvnxError::Xml(_) => None,
            MvnxError::Io(e) => Some(e),
        }
    }
}

impl From<StructuralError> for MvnxError {
    fn from(err: StructuralError) -> Self {
        MvnxError::Structural(err)
    }
}

impl From<VersionError> for MvnxError {
    fn from(err: VersionError) -> Self {
        MvnxError::Version(err)
    }
}

impl From<ExtractError> for MvnxError {
    fn from(err: ExtractError) -> Self {
        MvnxError::Extraction(err)
    }
}

impl From<std::io::Error> for MvnxError {
    fn from(err: std::io::Error) -> Self {
        MvnxError::Io(err)
    }
}
