//! Error surface for the adaptive pipeline (§7).
//!
//! Every kind the table in §7 lists collapses, once the pipeline is running,
//! into "abort flag set" (§9: "preserve that literal semantics; do not
//! translate to exceptions across stage boundaries"). [`PipelineError`] is
//! what the supervisor ultimately reports to its caller once a stage has
//! exited after observing the abort flag.

use std::fmt;
use std::io;

use crate::frame::types::Lz4FError;

/// The reason the pipeline aborted, or the fact that a stage exited cleanly
/// after the abort flag was set by some other stage.
#[derive(Debug)]
pub enum PipelineError {
    /// The Reader failed to read from its input source.
    Read(io::Error),
    /// The Writer failed to write to its output sink (includes short writes).
    Write(io::Error),
    /// The Compressor's codec reported an error beginning or continuing a
    /// frame.
    Codec(Lz4FError),
    /// A stage exited because another stage had already set the abort flag;
    /// the originating error was reported separately by that stage.
    Aborted,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Read(e) => write!(f, "pipeline read error: {}", e),
            PipelineError::Write(e) => write!(f, "pipeline write error: {}", e),
            PipelineError::Codec(e) => write!(f, "pipeline codec error: {}", e),
            PipelineError::Aborted => write!(f, "pipeline aborted"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<Lz4FError> for PipelineError {
    fn from(e: Lz4FError) -> Self {
        PipelineError::Codec(e)
    }
}

impl From<PipelineError> for io::Error {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Read(e) | PipelineError::Write(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
