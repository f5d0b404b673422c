//! Compressor stage (C4).
//!
//! Ported from the adaptive compressor's per-job compression loop (the
//! `compress` path inside `compressionJob_t` / the zstd `compressionJob`
//! body). Runs on its own thread (§5: "Reader ... Compressor ... Writer").
//! Hosts the adaptive controller (§4.5): it runs once per job, at the top of
//! this stage's protocol, on this stage's thread.

use std::sync::atomic::Ordering;

use super::codec::AdaptiveCodec;
use super::controller::{adapt_level, useable_dict_size};
use super::error::PipelineError;
use super::ring::Ring;

/// Runs the Compressor stage (C4) for one pipeline invocation. Owns the
/// codec context exclusively (§5: "the codec context is owned exclusively by
/// the Compressor") and the fixed per-block size used while draining a job's
/// input (canonical: 128 KiB).
pub struct Compressor<C: AdaptiveCodec> {
    codec: C,
    compress_block: usize,
    max_level: i32,
    force_level: bool,
}

impl<C: AdaptiveCodec> Compressor<C> {
    pub fn new(codec: C, compress_block: usize, force_level: bool) -> Self {
        let max_level = codec.max_level();
        Compressor {
            codec,
            compress_block,
            max_level,
            force_level,
        }
    }

    /// Run one job's worth of the Compressor protocol (§4.3 steps 1-7).
    /// Returns `Ok(true)` if this was the last job.
    pub fn run_job(&mut self, ring: &Ring, job_id: u64) -> Result<bool, PipelineError> {
        // Step 1.
        ring.progress.set_compressor_progress(0.0);

        // Step 2: blocks until the Reader has published this job; while
        // blocking, the Ring snapshots reader/writer idleness for us.
        ring.claim_for_compress(job_id)
            .map_err(|_| PipelineError::Aborted)?;

        // Step 3: handoff accepted.
        ring.progress.set_reader_progress(0.0);

        let mut slot = ring.slot(job_id).lock().unwrap();

        // Step 4: the adaptive controller. With force-level set, the
        // controller is bypassed entirely and the level never moves
        // (§4.5: "A configuration flag ... disables the controller").
        let level = if self.force_level {
            slot.level
        } else {
            let (reader_idle, compressor_idle, writer_idle) = ring.progress.take_idle_and_reset();
            adapt_level(
                slot.level,
                self.max_level,
                reader_idle,
                compressor_idle,
                writer_idle,
            )
        };
        slot.level = level;
        ring.shared_level.store(level, Ordering::SeqCst);

        debug_assert!(slot.size > 0 || slot.last_job, "a zero-size job must be the last job");

        // Step 5: begin a codec frame using the usable dictionary window.
        let window = self.codec.window_size_for_level(level);
        let use_dict = useable_dict_size(slot.dict_size, window);
        let dict_start = slot.dict_size - use_dict;
        let dict = {
            // Borrow checker: slice the slot fields before mutably borrowing
            // `slot.dst` below by copying the small dictionary window out.
            // The dictionary is at most `window` bytes (<= 64 KiB canonically),
            // so this copy is cheap relative to the chunk it seeds.
            slot.src[dict_start..slot.dict_size].to_vec()
        };

        let mut dst_pos = self.codec.begin_frame(&mut slot.dst, &dict, level)?;

        if job_id > 0 {
            // Decouple this frame's entropy state from the previous job's
            // frame (§4.3 step 6: "invalidate the codec's repeated-offset
            // state").
            self.codec.invalidate_repeat_offsets();
        }

        // Step 6: drain the fresh input in fixed-size blocks.
        let size = slot.size;
        let last_job = slot.last_job;
        if size == 0 {
            // Edge case: a zero-size job is only valid as the last job, and
            // emits an empty terminal frame.
            let written = self.codec.end_frame(&mut slot.dst[dst_pos..], &[])?;
            dst_pos += written;
            ring.progress.set_compressor_progress(1.0);
        } else {
            let dict_size = slot.dict_size;
            let mut consumed = 0usize;
            while consumed < size {
                let block_len = self.compress_block.min(size - consumed);
                let is_last_block = last_job && consumed + block_len == size;
                let written = {
                    let src_block = &slot.src[dict_size + consumed..dict_size + consumed + block_len];
                    if is_last_block {
                        self.codec.end_frame(&mut slot.dst[dst_pos..], src_block)?
                    } else {
                        self.codec.continue_frame(&mut slot.dst[dst_pos..], src_block)?
                    }
                };
                dst_pos += written;
                consumed += block_len;
                ring.progress
                    .set_compressor_progress(consumed as f64 / size as f64);
            }
        }

        slot.compressed_size = dst_pos;

        drop(slot);

        // Step 7.
        ring.publish_compressed();

        Ok(last_job)
    }
}
