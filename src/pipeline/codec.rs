//! The narrow codec interface the pipeline requires of its entropy coder
//! (§6), and an LZ4 Frame (LZ4F) implementation of it.
//!
//! The reference pipeline is written against `ZSTD_CCtx`; this port expresses
//! the same capability set as a trait so the Compressor stage (§4.3) stays
//! codec-agnostic, and backs it with the streaming primitives already in
//! [`crate::frame::compress`] — the same ones [`crate::io::compress_frame`]
//! uses for single-shot file compression.

use crate::frame::compress::{
    lz4f_compress_begin_using_dict, lz4f_compress_end, lz4f_compress_update,
    lz4f_create_compression_context,
};
use crate::frame::types::{
    BlockMode, BlockSizeId, ContentChecksum, FrameInfo, FrameType, Lz4FError, Preferences,
    BH_SIZE, MAX_FH_SIZE,
};
use crate::frame::Lz4FCCtx;
use crate::hc::types::{LZ4HC_CLEVEL_MAX, LZ4HC_CLEVEL_MIN};

/// Fixed LZ4 dictionary window (`LZ4_MAX_DICT_SIZE`). Unlike zstd, LZ4's
/// sliding window does not grow with compression level — see the
/// `windowSizeForLevel` note in `DESIGN.md`.
pub const LZ4_WINDOW_LOG: u32 = 16; // 64 KiB

/// The capability set the pipeline needs of its entropy coder (§6).
///
/// `begin_frame` always treats `dict` as raw reference bytes (LZ4F's
/// `compressBegin_usingDict` never pre-digests a per-call dictionary, so
/// there is no separate `forceRawDict` parameter to set — see `DESIGN.md`).
pub trait AdaptiveCodec {
    /// Worst-case compressed output size for an input of `max_input` bytes.
    fn compress_bound(&self, max_input: usize) -> usize;

    /// Begin a new frame at `level`, using `dict` as the raw dictionary
    /// prefix. Returns bytes written to `dst` (the frame header).
    fn begin_frame(&mut self, dst: &mut [u8], dict: &[u8], level: i32) -> Result<usize, Lz4FError>;

    /// Compress `src` into `dst`, continuing the current frame. Returns
    /// bytes written. With `auto_flush` always enabled, a full call always
    /// emits its input as one complete block (see `DESIGN.md`).
    fn continue_frame(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, Lz4FError>;

    /// Compress the final `src` block, close the frame, and return bytes
    /// written (including the end-mark and optional checksum).
    fn end_frame(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, Lz4FError>;

    /// Decouple the new frame's entropy state from the previous frame's.
    /// No-op for LZ4F: each `begin_frame` call already resets the hash
    /// tables and window; there is no repeated-offset cache to invalidate
    /// (that concept is specific to zstd's sequence format). Kept as an
    /// explicit call so the call shape matches §4.3 step 6 literally.
    fn invalidate_repeat_offsets(&mut self);

    /// Bytes of dictionary window usable at `level`.
    fn window_size_for_level(&self, level: i32) -> usize;

    /// Highest level this codec accepts.
    fn max_level(&self) -> i32;

    /// Whether `status` (as returned by a fallible call above) is an error.
    /// Present for interface parity with codecs that report errors as
    /// sentinel integers rather than `Result`; always `false` here because
    /// this codec already surfaces errors through `Result`.
    fn is_error(&self, _status: usize) -> bool {
        false
    }
}

/// LZ4F-backed implementation of [`AdaptiveCodec`]. Owns a single streaming
/// compression context reused across every job in the run, exactly as the
/// reference pipeline reuses one `ZSTD_CCtx` for the whole file via repeated
/// `ZSTD_compressBegin_usingDict` calls (each `lz4f_compress_end` resets
/// `c_stage` to 0, making the context immediately reusable).
pub struct Lz4fAdaptiveCodec {
    ctx: Box<Lz4FCCtx>,
    prefs: Preferences,
    /// The fixed per-block size the Compressor stage pushes per
    /// `continue_frame`/`end_frame` call (§4.3 step 6). Kept so
    /// `compress_bound` can count blocks at the granularity actually
    /// emitted, rather than at the frame header's (coarser) `block_size_id`
    /// ceiling — see the doc comment on `compress_bound` below.
    compress_block: usize,
}

impl Lz4fAdaptiveCodec {
    /// `compress_block`: the fixed per-block size the Compressor stage will
    /// push per `continue_frame`/`end_frame` call (canonical: 128 KiB). Used
    /// to pick a block-size-id ceiling comfortably above it (the frame
    /// header only needs to advertise an upper bound a decoder must buffer
    /// for; actual flush boundaries are governed by `auto_flush`, not
    /// `block_size_id`) and, separately, to size `dst` correctly in
    /// `compress_bound`.
    pub fn new(compress_block: usize) -> Result<Self, Lz4FError> {
        let ctx = lz4f_create_compression_context(crate::frame::compress::LZ4F_VERSION)?;
        let block_size_id = if compress_block <= 64 * 1024 {
            BlockSizeId::Max64Kb
        } else if compress_block <= 256 * 1024 {
            BlockSizeId::Max256Kb
        } else if compress_block <= 1024 * 1024 {
            BlockSizeId::Max1Mb
        } else {
            BlockSizeId::Max4Mb
        };
        let prefs = Preferences {
            frame_info: FrameInfo {
                block_size_id,
                block_mode: BlockMode::Linked,
                content_checksum_flag: ContentChecksum::Disabled,
                frame_type: FrameType::Frame,
                content_size: 0,
                dict_id: 0,
                block_checksum_flag: Default::default(),
            },
            compression_level: LZ4HC_CLEVEL_MIN,
            auto_flush: true,
            favor_dec_speed: false,
        };
        Ok(Lz4fAdaptiveCodec {
            ctx,
            prefs,
            compress_block: compress_block.max(1),
        })
    }
}

impl AdaptiveCodec for Lz4fAdaptiveCodec {
    /// Worst-case compressed output size for a job whose fresh input is
    /// `max_input` bytes.
    ///
    /// `lz4f_compress_frame_bound` counts blocks at the frame header's
    /// `block_size_id` granularity (e.g. 256 KiB), but the Compressor stage
    /// (§4.3 step 6) actually emits one LZ4 block per `compress_block`-byte
    /// `continue_frame`/`end_frame` call (canonical: 128 KiB) because
    /// `auto_flush` is enabled — a finer granularity than `block_size_id`
    /// whenever `compress_block < block_size` for the chosen id. Each block
    /// carries its own `BH_SIZE`-byte header regardless of size, so bounding
    /// by the coarser granularity undercounts the number of block headers
    /// actually written. Count blocks at the granularity this codec's own
    /// Compressor loop uses instead: each block, even if stored raw when
    /// compression doesn't shrink it, is at most its own uncompressed size
    /// (LZ4F's raw-block fallback never expands a block past its input).
    fn compress_bound(&self, max_input: usize) -> usize {
        let block = self.compress_block;
        let nb_full_blocks = max_input / block;
        let last_block = max_input % block;
        let nb_blocks = nb_full_blocks + usize::from(last_block > 0);
        let blocks_bound = nb_blocks * BH_SIZE + max_input;
        let frame_end = BH_SIZE; // end mark; content checksum is disabled above
        MAX_FH_SIZE + blocks_bound + frame_end
    }

    fn begin_frame(&mut self, dst: &mut [u8], dict: &[u8], level: i32) -> Result<usize, Lz4FError> {
        self.prefs.compression_level = level;
        lz4f_compress_begin_using_dict(&mut self.ctx, dst, dict, Some(&self.prefs))
    }

    fn continue_frame(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, Lz4FError> {
        lz4f_compress_update(&mut self.ctx, dst, src, None)
    }

    fn end_frame(&mut self, dst: &mut [u8], src: &[u8]) -> Result<usize, Lz4FError> {
        let written = lz4f_compress_update(&mut self.ctx, dst, src, None)?;
        let tail = lz4f_compress_end(&mut self.ctx, &mut dst[written..], None)?;
        Ok(written + tail)
    }

    fn invalidate_repeat_offsets(&mut self) {
        // No-op — see trait doc.
    }

    fn window_size_for_level(&self, level: i32) -> usize {
        // Canonical rule from §6: overlapLog := level < maxLevel ? 3 : 0;
        // useDict := 1 << (windowLog(level) - overlapLog). LZ4's window does
        // not vary with level, so windowLog is the fixed LZ4_WINDOW_LOG; only
        // overlapLog varies, giving a window that's smaller below max level
        // (spend less dictionary context at lower effort) and the full 64 KiB
        // at max level.
        let overlap_log = if level < self.max_level() { 3 } else { 0 };
        1usize << (LZ4_WINDOW_LOG - overlap_log)
    }

    fn max_level(&self) -> i32 {
        LZ4HC_CLEVEL_MAX
    }
}
