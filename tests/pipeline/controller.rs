// Integration tests for src/pipeline/controller.rs — the adaptive
// compression-level controller (C6).
//
// Verifies behavioural parity with `adaptCompressionLevel()` /
// `getUseableDictSize()` in contrib/adaptive-compression/adapt.c
// (see SPEC_FULL.md §4.5):
//   - fast-path raise when Reader/Writer idleness is low (they were the
//     observed bottleneck, so the Compressor has slack to spend)
//   - slow-path lower when Compressor idleness is low (it is the bottleneck)
//   - the level never leaves [1, max_level]
//   - useable_dict_size never exceeds the carried dictionary size
//
// All tests operate on the public API only.

use lz4::pipeline::controller::{adapt_level, useable_dict_size};

#[test]
fn unchanged_when_no_stage_was_observed_blocking() {
    assert_eq!(adapt_level(6, 12, 1.0, 1.0, 1.0), 6);
}

#[test]
fn raises_toward_max_when_reader_and_writer_are_the_bottleneck() {
    let next = adapt_level(6, 12, 0.0, 1.0, 0.0);
    assert_eq!(next, 10);
}

#[test]
fn raise_clamps_at_max_level() {
    let next = adapt_level(10, 12, 0.0, 1.0, 0.0);
    assert_eq!(next, 12);
}

#[test]
fn lowers_when_compressor_itself_is_the_bottleneck() {
    let next = adapt_level(6, 12, 1.0, 0.0, 1.0);
    assert_eq!(next, 2);
}

#[test]
fn lower_clamps_at_one() {
    let next = adapt_level(2, 12, 1.0, 0.0, 1.0);
    assert_eq!(next, 1);
}

#[test]
fn force_level_semantics_are_a_caller_concern() {
    // The controller itself has no force-level flag (§4.5: "A configuration
    // flag ... disables the controller" — bypassing it entirely is the
    // Compressor stage's job, exercised in
    // pipeline::compressor::tests::force_level_keeps_level_pinned_across_jobs).
    // Here we only confirm the pure function keeps moving the level when
    // called directly, so callers know they must gate it themselves.
    assert_ne!(adapt_level(6, 12, 0.0, 1.0, 0.0), 6);
}

#[test]
fn level_stays_within_bounds_across_the_full_idleness_grid() {
    for level in 1..=12 {
        for ri in [0.0, 0.2, 0.4, 0.6, 0.8, 1.0] {
            for ci in [0.0, 0.2, 0.4, 0.6, 0.8, 1.0] {
                for wi in [0.0, 0.2, 0.4, 0.6, 0.8, 1.0] {
                    let next = adapt_level(level, 12, ri, ci, wi);
                    assert!((1..=12).contains(&next));
                }
            }
        }
    }
}

#[test]
fn useable_dict_size_clamps_to_the_codec_window() {
    assert_eq!(useable_dict_size(1 << 20, 1 << 16), 1 << 16);
}

#[test]
fn useable_dict_size_passes_through_when_smaller_than_window() {
    assert_eq!(useable_dict_size(512, 1 << 16), 512);
}

#[test]
fn useable_dict_size_of_zero_is_zero() {
    assert_eq!(useable_dict_size(0, 1 << 16), 0);
}
