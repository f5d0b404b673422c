//! Bounded job ring and the counter/condvar pairs that drive it.
//!
//! Mirrors the `adaptCCtx` ring bookkeeping in the reference adaptive
//! compressor (`jobReadyID` / `jobCompressedID` / `jobWriteID`, each guarded
//! by its own `mutex_t` + `cond_t`), reusing this crate's existing
//! `Mutex`+`Condvar` idiom from [`crate::threadpool`] rather than introducing
//! a new synchronization primitive.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Condvar, Mutex};

/// A single reusable record in the job ring.
///
/// Equivalent to `jobDescription` in the reference source. `src` and `dst`
/// are allocated once at pipeline creation and reused for every job whose
/// `jobID mod N` maps to this slot.
pub struct JobSlot {
    /// Source buffer: dictionary prefix (`0..dict_size`) followed by fresh
    /// input (`dict_size..dict_size+size`). Capacity is `2 * CHUNK`.
    pub src: Vec<u8>,
    /// Destination buffer: the compressed frame for this job.
    pub dst: Vec<u8>,
    /// Monotonic job identifier.
    pub job_id: u64,
    /// Set by the Reader when this is the final job of the run.
    pub last_job: bool,
    /// Bytes of dictionary prefix located at the front of `src`.
    pub dict_size: usize,
    /// Bytes of fresh input following the dictionary prefix in `src`.
    pub size: usize,
    /// Bytes written into `dst` by the Compressor.
    pub compressed_size: usize,
    /// Compression level chosen for this job.
    pub level: i32,
}

impl JobSlot {
    fn new(src_capacity: usize, dst_capacity: usize) -> Self {
        JobSlot {
            src: vec![0u8; src_capacity],
            dst: vec![0u8; dst_capacity],
            job_id: 0,
            last_job: false,
            dict_size: 0,
            size: 0,
            compressed_size: 0,
            level: 0,
        }
    }
}

/// Signalled when any stage detects an unrecoverable error. Once set, every
/// blocked `Counter::wait_while` call returns `Err(Aborted)` at its next
/// wakeup. Writes are idempotent (set-only).
#[derive(Default)]
pub struct AbortFlag(AtomicBool);

impl AbortFlag {
    pub fn new() -> Self {
        AbortFlag(AtomicBool::new(false))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Marker error returned by a blocking ring operation once the abort flag
/// has been observed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// A monotonic counter with its own mutex + condvar, matching §4.1's
/// "three small records `{counter, mutex, condvar}`" design note. Advances
/// are single-writer; any number of stages may block waiting on one.
pub struct Counter {
    value: Mutex<u64>,
    cond: Condvar,
}

impl Counter {
    fn new() -> Self {
        Counter {
            value: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// Current counter value.
    pub fn get(&self) -> u64 {
        *self.value.lock().unwrap()
    }

    /// Advance the counter by exactly one and wake every waiter.
    pub fn publish(&self) {
        let mut guard = self.value.lock().unwrap();
        *guard += 1;
        drop(guard);
        self.cond.notify_all();
    }

    /// Wake every waiter without advancing the counter. Used once by the
    /// supervisor when the abort flag is set, so blocked stages re-check it.
    pub fn notify_all(&self) {
        self.cond.notify_all();
    }

    /// Block while `pred(current_value)` holds, calling `on_block` exactly
    /// once — right before the first wait — if blocking is actually
    /// required. This matches "while blocking, snapshot ..." in §4.3/§4.4:
    /// the snapshot is taken once, at the moment the stage discovers it must
    /// wait, not continuously refreshed.
    pub fn wait_while<F, S>(&self, abort: &AbortFlag, pred: F, mut on_block: S) -> Result<(), Aborted>
    where
        F: Fn(u64) -> bool,
        S: FnMut(),
    {
        let mut guard = self.value.lock().unwrap();
        if pred(*guard) {
            on_block();
        }
        while pred(*guard) {
            if abort.is_set() {
                return Err(Aborted);
            }
            guard = self.cond.wait(guard).unwrap();
        }
        if abort.is_set() {
            return Err(Aborted);
        }
        Ok(())
    }
}

/// The six progress/idle fields behind a single mutex (§5: "a single mutex
/// protects the six `double` fields").
#[derive(Clone, Copy)]
struct ProgressState {
    reader_progress: f64,
    compressor_progress: f64,
    writer_progress: f64,
    reader_idle: f64,
    compressor_idle: f64,
    writer_idle: f64,
}

impl Default for ProgressState {
    fn default() -> Self {
        // Idle fields start at 1.0 ("no observed blocking").
        ProgressState {
            reader_progress: 0.0,
            compressor_progress: 0.0,
            writer_progress: 0.0,
            reader_idle: 1.0,
            compressor_idle: 1.0,
            writer_idle: 1.0,
        }
    }
}

/// Shared progress/idle tracking consumed by the adaptive controller (§4.5).
pub struct Progress(Mutex<ProgressState>);

impl Progress {
    fn new() -> Self {
        Progress(Mutex::new(ProgressState::default()))
    }

    pub fn set_reader_progress(&self, v: f64) {
        self.0.lock().unwrap().reader_progress = v;
    }

    pub fn set_compressor_progress(&self, v: f64) {
        self.0.lock().unwrap().compressor_progress = v;
    }

    pub fn set_writer_progress(&self, v: f64) {
        self.0.lock().unwrap().writer_progress = v;
    }

    /// Snapshot taken by the Compressor the moment it must block on
    /// claim-for-compress (§4.3 step 2).
    pub fn snapshot_for_compressor(&self) {
        let mut g = self.0.lock().unwrap();
        g.reader_idle = g.reader_progress;
        g.writer_idle = g.writer_progress;
    }

    /// Snapshot taken by the Writer the moment it must block on
    /// claim-for-write (§4.4 step 2).
    pub fn snapshot_for_writer(&self) {
        let mut g = self.0.lock().unwrap();
        g.compressor_idle = g.compressor_progress;
    }

    /// Read the three idle observations and reset them to 1.0 in one
    /// critical section, as the controller requires (§4.5: "read under the
    /// controller lock, then reset to 1.0").
    pub fn take_idle_and_reset(&self) -> (f64, f64, f64) {
        let mut g = self.0.lock().unwrap();
        let triple = (g.reader_idle, g.compressor_idle, g.writer_idle);
        g.reader_idle = 1.0;
        g.compressor_idle = 1.0;
        g.writer_idle = 1.0;
        triple
    }
}

/// The bounded job ring (C1): N reusable slots plus the three counters that
/// govern handoff between Reader, Compressor and Writer.
pub struct Ring {
    pub slots: Vec<Mutex<JobSlot>>,
    pub ready: Counter,
    pub compressed: Counter,
    pub written: Counter,
    pub progress: Progress,
    pub abort: AbortFlag,
    /// Ring size N (canonical value: 2).
    pub n: usize,
    /// The level the Reader stamps into each new job (§4.2 step 5:
    /// `level := currentLevel`), updated by the Compressor after the
    /// adaptive controller runs for a job (§4.5). Plain atomic rather than a
    /// mutex: it is read/written at well-defined single-writer-at-a-time
    /// points (Reader writes the job's `level` field from it; Compressor is
    /// the only writer of the atomic itself), so no richer synchronization
    /// is needed.
    pub shared_level: AtomicI32,
}

impl Ring {
    /// Allocate a ring of `n` slots, each with `src` capacity `2 * chunk`
    /// (room for a full dictionary prefix plus a full fresh chunk) and `dst`
    /// capacity `dst_capacity` (the codec's worst-case output bound).
    pub fn new(n: usize, chunk: usize, dst_capacity: usize) -> Self {
        let slots = (0..n)
            .map(|_| Mutex::new(JobSlot::new(2 * chunk, dst_capacity)))
            .collect();
        Ring {
            slots,
            ready: Counter::new(),
            compressed: Counter::new(),
            written: Counter::new(),
            progress: Progress::new(),
            abort: AbortFlag::new(),
            n,
            shared_level: AtomicI32::new(0),
        }
    }

    fn slot_index(&self, job_id: u64) -> usize {
        (job_id as usize) % self.n
    }

    /// Blocks until slot `job_id mod N` is free for the Reader to refill
    /// (§4.1: "blocks until `k − writtenID < N`").
    pub fn claim_for_read(&self, job_id: u64) -> Result<(), Aborted> {
        let n = self.n as u64;
        self.written
            .wait_while(&self.abort, |w| job_id >= w + n, || {})
    }

    /// Blocks until job `job_id` has been published by the Reader (§4.1).
    /// Snapshots reader/writer idleness once, if blocking is required.
    pub fn claim_for_compress(&self, job_id: u64) -> Result<(), Aborted> {
        self.ready.wait_while(
            &self.abort,
            |r| job_id >= r,
            || self.progress.snapshot_for_compressor(),
        )
    }

    /// Blocks until job `job_id` has been published by the Compressor
    /// (§4.1). Snapshots compressor idleness once, if blocking is required.
    pub fn claim_for_write(&self, job_id: u64) -> Result<(), Aborted> {
        self.compressed.wait_while(
            &self.abort,
            |c| job_id >= c,
            || self.progress.snapshot_for_writer(),
        )
    }

    pub fn publish_ready(&self) {
        self.ready.publish();
    }

    pub fn publish_compressed(&self) {
        self.compressed.publish();
    }

    pub fn publish_written(&self) {
        self.written.publish();
    }

    /// Access slot `job_id mod N`.
    pub fn slot(&self, job_id: u64) -> &Mutex<JobSlot> {
        &self.slots[self.slot_index(job_id)]
    }

    /// Set the abort flag and wake every waiter on every counter so each
    /// blocked stage observes it at its next wakeup (§4.6, §7).
    pub fn abort(&self) {
        self.abort.set();
        self.ready.notify_all();
        self.compressed.notify_all();
        self.written.notify_all();
    }
}
