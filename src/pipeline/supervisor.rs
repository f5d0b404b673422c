//! Supervisor / lifecycle (C7).
//!
//! Ported from the adaptive compressor's top-level `compressFilename_extAdapt`
//! entry point: allocates the ring and buffers, spawns the Writer and
//! Compressor threads, drives the Reader loop on the caller's thread until
//! EOF or abort, waits for the Writer to drain the last job, and tears down
//! in a fixed order (§4.6).

use std::io::{Read, Write};
use std::sync::atomic::Ordering;
use std::thread;

use super::codec::AdaptiveCodec;
use super::compressor::Compressor;
use super::error::PipelineError;
use super::reader::Reader;
use super::ring::Ring;
use super::writer::Writer;

/// The pipeline configuration options enumerated in §6, minus the ones this
/// crate's I/O layer already owns (input/output path resolution, progress
/// display, and verbosity are handled the way the rest of `io::` handles
/// them — see `DESIGN.md`).
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Fixed input chunk size (canonical: 4 MiB).
    pub chunk: usize,
    /// Ring size N (canonical: 2).
    pub ring_size: usize,
    /// Fixed per-block size the Compressor feeds the codec (canonical: 128 KiB).
    pub compress_block: usize,
    /// Initial compression level (§6 default: 6).
    pub initial_level: i32,
    /// Disables the adaptive controller, pinning `initial_level` for the
    /// whole run (§6's "Force level").
    pub force_level: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            chunk: 4 * 1024 * 1024,
            ring_size: 2,
            compress_block: 128 * 1024,
            initial_level: 6,
            force_level: false,
        }
    }
}

/// Byte/job counters the supervisor accumulates while draining a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub jobs: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Run the three-stage adaptive pipeline to completion: read `src` in fixed
/// chunks, compress each with `codec`, and write frames to `sink` in order.
///
/// Reader runs on the calling thread; Compressor and Writer run on two
/// threads spawned for the duration of this call (§5: "Three cooperating
/// OS-level threads in parallel"). Any stage's error sets the shared abort
/// flag, which wakes every blocked stage so the scoped threads always join
/// (§4.6, §7); the first error observed, in reader/compressor/writer order,
/// is what this function returns.
pub fn run<R, W, C>(
    cfg: &PipelineConfig,
    codec: C,
    mut src: R,
    mut sink: W,
) -> Result<PipelineStats, PipelineError>
where
    R: Read,
    W: Write + Send,
    C: AdaptiveCodec + Send,
{
    let dst_capacity = codec.compress_bound(cfg.chunk);
    let ring = Ring::new(cfg.ring_size, cfg.chunk, dst_capacity);
    ring.shared_level.store(cfg.initial_level, Ordering::SeqCst);

    let mut reader = Reader::new(&mut src, cfg.chunk);
    let mut compressor = Compressor::new(codec, cfg.compress_block, cfg.force_level);
    let mut writer = Writer::new();

    let (reader_result, compressor_result, writer_result) = thread::scope(|scope| {
        let ring_ref = &ring;

        let compressor_handle = scope.spawn(move || drive_compressor(ring_ref, &mut compressor));
        let writer_handle = scope.spawn(move || drive_writer(ring_ref, &mut writer, &mut sink));

        let reader_result = drive_reader(ring_ref, &mut reader);

        let compressor_result = compressor_handle
            .join()
            .unwrap_or(Err(PipelineError::Aborted));
        let writer_result = writer_handle.join().unwrap_or(Err(PipelineError::Aborted));

        (reader_result, compressor_result, writer_result)
    });

    let jobs = ring.written.get();
    // Byte totals are tallied by each drive loop as it processes a job, not
    // read back from the ring afterwards: a slot is reused every `ring_size`
    // jobs, so by the time the pipeline finishes only the last occupant of
    // each physical slot survives there.
    match (reader_result, compressor_result, writer_result) {
        (Err(e), _, _) if !matches!(e, PipelineError::Aborted) => Err(e),
        (_, Err(e), _) if !matches!(e, PipelineError::Aborted) => Err(e),
        (_, _, Err(e)) if !matches!(e, PipelineError::Aborted) => Err(e),
        (Err(_), Err(_), Err(_)) => Err(PipelineError::Aborted),
        (Ok(bytes_in), Ok(bytes_out), Ok(())) => Ok(PipelineStats {
            jobs,
            bytes_in,
            bytes_out,
        }),
        _ => Err(PipelineError::Aborted),
    }
}

fn drive_reader<R: Read>(ring: &Ring, reader: &mut Reader<R>) -> Result<u64, PipelineError> {
    let mut job_id = 0u64;
    let mut bytes_in = 0u64;
    loop {
        match reader.run_job(ring, job_id) {
            Ok(last) => {
                bytes_in += ring.slot(job_id).lock().unwrap().size as u64;
                if last {
                    return Ok(bytes_in);
                }
                job_id += 1;
            }
            Err(e) => {
                ring.abort();
                return Err(e);
            }
        }
    }
}

fn drive_compressor<C: AdaptiveCodec>(
    ring: &Ring,
    compressor: &mut Compressor<C>,
) -> Result<u64, PipelineError> {
    let mut job_id = 0u64;
    let mut bytes_out = 0u64;
    loop {
        match compressor.run_job(ring, job_id) {
            Ok(last) => {
                bytes_out += ring.slot(job_id).lock().unwrap().compressed_size as u64;
                if last {
                    return Ok(bytes_out);
                }
                job_id += 1;
            }
            Err(e) => {
                ring.abort();
                return Err(e);
            }
        }
    }
}

fn drive_writer<W: Write>(
    ring: &Ring,
    writer: &mut Writer,
    sink: &mut W,
) -> Result<(), PipelineError> {
    let mut job_id = 0u64;
    loop {
        match writer.run_job(ring, sink, job_id) {
            Ok(true) => return Ok(()),
            Ok(false) => job_id += 1,
            Err(e) => {
                ring.abort();
                return Err(e);
            }
        }
    }
}
