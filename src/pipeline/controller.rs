//! Adaptive compression-level controller (C6).
//!
//! Ported from `adaptCompressionLevel` in the reference adaptive compressor.
//! Runs once per job, on the Compressor thread, reading the idleness
//! snapshots any stage recorded while blocked on its peer (see
//! [`crate::pipeline::ring::Progress`]) and deciding the compression level
//! for the job about to start.

/// Cap on how much the level may move in a single job boundary.
/// Equivalent to `MAX_COMPRESSION_LEVEL_CHANGE` (canonical value: 4).
pub const MAX_COMPRESSION_LEVEL_CHANGE: f64 = 4.0;

/// Compute the next compression level from the three idleness observations.
///
/// `reader_idle`, `compressor_idle`, `writer_idle` are each in `[0, 1]`,
/// where 1.0 means "no observed blocking on this peer since the last
/// decision". `level` is the current level; `max_level` bounds it above.
///
/// A low idleness value for peer P means the observer was waiting on P
/// often, i.e. P is slow:
///
/// - Fast-path raise: if Reader and Writer are both comfortably ahead of the
///   Compressor, raise the level (spend the slack on better compression).
/// - Slow-path lower: otherwise, if the Compressor itself was the one being
///   waited on, lower the level to relieve the bottleneck.
///
/// Always returns a level in `[1, max_level]`.
pub fn adapt_level(
    level: i32,
    max_level: i32,
    reader_idle: f64,
    compressor_idle: f64,
    writer_idle: f64,
) -> i32 {
    let k = MAX_COMPRESSION_LEVEL_CHANGE;
    let reader_delta = k - reader_idle * k;
    let writer_delta = k - writer_idle * k;
    let compressor_delta = k - compressor_idle * k;

    let fast_raise = reader_delta.min(writer_delta).min((max_level - level) as f64);
    if fast_raise > 0.0 {
        return (level + fast_raise.floor() as i32).clamp(1, max_level);
    }

    let slow_lower = compressor_delta.min((level - 1) as f64);
    if slow_lower > 0.0 {
        return (level - slow_lower.floor() as i32).clamp(1, max_level);
    }

    level
}

/// The amount of dictionary prefix actually handed to the codec for a job at
/// `level`, given the codec's own window function (§6's `windowSizeForLevel`
/// and the canonical `useDict` rule). Always satisfies `useDict <= dict_size`.
pub fn useable_dict_size(dict_size: usize, codec_window: usize) -> usize {
    dict_size.min(codec_window)
}
