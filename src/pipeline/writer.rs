//! Writer stage (C5).
//!
//! Ported from the adaptive compressor's output-draining loop (the
//! `FIO_compressFilename_dstWrite`-style tail of a streaming job, adapted to
//! this crate's `io::file_io` sink conventions). Runs on its own thread.

use std::io::Write;

use super::error::PipelineError;
use super::ring::Ring;

/// Runs the Writer stage (C5) for one pipeline invocation.
pub struct Writer;

impl Writer {
    pub fn new() -> Self {
        Writer
    }

    /// Run one job's worth of the Writer protocol (§4.4 steps 1-5). Returns
    /// `Ok(true)` if this was the last job (the caller should stop driving
    /// the Writer after this call).
    pub fn run_job<W: Write>(
        &mut self,
        ring: &Ring,
        sink: &mut W,
        job_id: u64,
    ) -> Result<bool, PipelineError> {
        // Step 1.
        ring.progress.set_writer_progress(0.0);

        // Step 2: blocks until the Compressor has published this job; while
        // blocking, the Ring snapshots compressor idleness for us.
        ring.claim_for_write(job_id)
            .map_err(|_| PipelineError::Aborted)?;

        // Step 3: handoff accepted.
        ring.progress.set_compressor_progress(0.0);

        let mut slot = ring.slot(job_id).lock().unwrap();
        let compressed_size = slot.compressed_size;
        let last_job = slot.last_job;

        // Step 4: write in slices of `compressed_size >> 7` bytes (~128
        // slices per job) so the controller gets fine-grained
        // `writerProgress` samples even against a fast sink.
        if compressed_size > 0 {
            let slice_len = (compressed_size >> 7).max(1);
            let mut written = 0usize;
            while written < compressed_size {
                let take = slice_len.min(compressed_size - written);
                sink.write_all(&slot.dst[written..written + take])
                    .map_err(PipelineError::Write)?;
                written += take;
                ring.progress
                    .set_writer_progress(written as f64 / compressed_size as f64);
            }
        } else {
            ring.progress.set_writer_progress(1.0);
        }

        drop(slot);

        // Step 5.
        ring.publish_written();

        Ok(last_job)
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
