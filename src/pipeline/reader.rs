//! Reader stage (C3).
//!
//! Ported from `createCompressionJob` in the reference adaptive compressor.
//! Runs on the caller's thread (§4.6: "Reader runs on the caller's thread").

use std::io::Read;
use std::mem;
use std::sync::atomic::Ordering;

use super::error::PipelineError;
use super::ring::Ring;

/// Owns the ring's input staging buffer (§5: "owned by the Reader") and the
/// carried-over dictionary size between jobs. Created once per pipeline run.
pub struct Reader<R: Read> {
    src: R,
    staging: Vec<u8>,
    next_dict_size: usize,
    chunk: usize,
}

impl<R: Read> Reader<R> {
    pub fn new(src: R, chunk: usize) -> Self {
        Reader {
            src,
            staging: vec![0u8; 2 * chunk],
            next_dict_size: 0,
            chunk,
        }
    }

    /// Run one job's worth of the Reader protocol (§4.2 steps 1-7). Returns
    /// `Ok(true)` if this was the last job.
    pub fn run_job(&mut self, ring: &Ring, job_id: u64) -> Result<bool, PipelineError> {
        ring.claim_for_read(job_id).map_err(|_| PipelineError::Aborted)?;

        ring.progress.set_reader_progress(0.0);

        let mut slot = ring.slot(job_id).lock().unwrap();

        // Step 3: zero-copy swap — the staging buffer already carries the
        // dictionary prefix (written back at the end of the previous job);
        // the slot's old `src` buffer becomes the new staging scratch space.
        mem::swap(&mut self.staging, &mut slot.src);
        let dict_size = self.next_dict_size;

        // Ensure the slot buffer has room for dict_size + a full chunk.
        let needed = dict_size + self.chunk;
        if slot.src.len() < needed {
            slot.src.resize(needed, 0);
        }

        // Step 4: read up to `chunk` bytes into src[dict_size..].
        let mut read_total = 0usize;
        loop {
            if read_total >= self.chunk {
                break;
            }
            let n = self
                .src
                .read(&mut slot.src[dict_size + read_total..dict_size + self.chunk])
                .map_err(PipelineError::Read)?;
            if n == 0 {
                break; // EOF
            }
            read_total += n;
            ring.progress
                .set_reader_progress(read_total as f64 / self.chunk as f64);
        }

        // Step 5.
        slot.size = read_total;
        slot.dict_size = dict_size;
        slot.level = ring.shared_level.load(Ordering::SeqCst);
        let last_job = read_total < self.chunk;
        slot.last_job = last_job;
        slot.job_id = job_id;

        // Step 6: carry the fresh input tail forward as the next dictionary.
        if !last_job {
            if self.staging.len() < read_total {
                self.staging.resize(read_total, 0);
            }
            self.staging[..read_total]
                .copy_from_slice(&slot.src[dict_size..dict_size + read_total]);
            self.next_dict_size = read_total;
        }

        drop(slot);

        // Step 7.
        ring.publish_ready();

        Ok(last_job)
    }
}
