// Integration tests for src/pipeline/error.rs — the pipeline's error surface
// (§7).
//
// Verifies the error kinds collapse to readable Display strings and convert
// cleanly into std::io::Error, matching this crate's Display-by-hand
// convention elsewhere (see DESIGN.md's `pipeline::error` entry).
//
// All tests operate on the public API only.

use lz4::pipeline::PipelineError;
use std::io;

#[test]
fn aborted_has_a_stable_message() {
    assert_eq!(PipelineError::Aborted.to_string(), "pipeline aborted");
}

#[test]
fn read_error_includes_the_inner_io_error() {
    let err = PipelineError::Read(io::Error::new(io::ErrorKind::NotFound, "missing"));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn write_error_includes_the_inner_io_error() {
    let err = PipelineError::Write(io::Error::new(io::ErrorKind::Other, "disk full"));
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn aborted_converts_into_a_generic_io_error() {
    let io_err: io::Error = PipelineError::Aborted.into();
    assert_eq!(io_err.kind(), io::ErrorKind::Other);
}

#[test]
fn read_error_converts_back_into_the_same_io_error_kind() {
    let io_err: io::Error = PipelineError::Read(io::Error::new(io::ErrorKind::NotFound, "x")).into();
    assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
}
