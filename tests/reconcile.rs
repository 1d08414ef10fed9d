//! Duration reconciliation against synthetic sources.

mod common;

use common::SyntheticSource;
use stillframe::{DurationMethod, reconcile};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn picks_the_largest_candidate() {
    let mut source = SyntheticSource::new(1800, 30.0)
        .with_end_position(Some(61.8))
        .with_seconds_per_frame(Some(62.0 / 1799.0));

    let estimate = reconcile(&mut source);

    assert_eq!(estimate.candidate_methods.len(), 3);
    assert_close(estimate.candidate(DurationMethod::EndSeek).unwrap(), 61.8);
    assert_close(
        estimate.candidate(DurationMethod::FramesOverRate).unwrap(),
        60.0,
    );
    assert_close(
        estimate.candidate(DurationMethod::LastDecodedFrame).unwrap(),
        62.0,
    );
    assert_close(estimate.seconds, 62.0);
    assert_close(estimate.frame_rate, 30.0);
    assert!(estimate.is_determinable());
    assert!(!estimate.has_disagreement());
}

#[test]
fn candidates_keep_probe_order() {
    let mut source = SyntheticSource::new(1800, 30.0)
        .with_end_position(Some(61.8))
        .with_seconds_per_frame(Some(62.0 / 1799.0));

    let estimate = reconcile(&mut source);
    let methods: Vec<DurationMethod> = estimate
        .candidate_methods
        .iter()
        .map(|&(method, _)| method)
        .collect();

    assert_eq!(
        methods,
        vec![
            DurationMethod::EndSeek,
            DurationMethod::FramesOverRate,
            DurationMethod::LastDecodedFrame,
        ]
    );
}

#[test]
fn degenerate_candidates_are_discarded() {
    for end in [Some(0.0), Some(-1.0), Some(f64::NAN), Some(f64::INFINITY), None] {
        let mut source = SyntheticSource::new(300, 30.0).with_end_position(end);
        let estimate = reconcile(&mut source);

        assert_eq!(estimate.candidate(DurationMethod::EndSeek), None, "{end:?}");
        assert_close(estimate.seconds, 10.0);
        assert_eq!(estimate.candidate_methods.len(), 2);
    }
}

#[test]
fn reports_disagreement_beyond_tolerance() {
    let mut source = SyntheticSource::new(300, 30.0).with_end_position(Some(12.0));
    let estimate = reconcile(&mut source);

    assert_close(estimate.seconds, 12.0);
    assert_close(estimate.spread(), 12.0 - 299.0 / 30.0);
    assert!(estimate.has_disagreement());
}

#[test]
fn rewinds_to_the_first_frame() {
    let mut source = SyntheticSource::new(120, 24.0).with_end_position(Some(5.0));
    let _ = reconcile(&mut source);

    assert_eq!(source.seeks.last(), Some(&0));
}

#[test]
fn last_frame_probe_decodes_past_an_earlier_keyframe() {
    let mut source = SyntheticSource::new(100, 10.0).with_keyframe_interval(12);
    let estimate = reconcile(&mut source);

    assert_close(
        estimate.candidate(DurationMethod::LastDecodedFrame).unwrap(),
        9.9,
    );
    // Frames 96..=99 are decoded after landing on keyframe 96.
    assert_eq!(source.decoded, 4);
}

#[test]
fn sampled_scan_runs_when_everything_else_degenerates() {
    let mut source = SyntheticSource::new(100, 25.0).with_reported_frame_count(0);
    let estimate = reconcile(&mut source);

    assert_eq!(estimate.candidate_methods.len(), 1);
    assert_eq!(estimate.candidate_methods[0].0, DurationMethod::SampledScan);
    assert_close(estimate.seconds, 99.0 / 25.0);
}

#[test]
fn sampled_scan_reads_at_most_the_sample_limit() {
    let mut source = SyntheticSource::new(1000, 25.0).with_reported_frame_count(0);
    let estimate = reconcile(&mut source);

    assert_eq!(source.decoded, 300);
    assert_close(estimate.seconds, 299.0 / 25.0);
}

#[test]
fn sampled_scan_is_skipped_without_a_frame_rate() {
    let mut source = SyntheticSource::new(100, 0.0)
        .with_reported_frame_count(0)
        .with_seconds_per_frame(Some(0.04));
    let estimate = reconcile(&mut source);

    assert!(estimate.candidate_methods.is_empty());
    assert_eq!(source.decoded, 0);
    assert!(!estimate.is_determinable());
}

#[test]
fn all_degenerate_is_zero_not_an_error() {
    let mut source = SyntheticSource::new(100, 30.0)
        .with_reported_frame_count(0)
        .with_seconds_per_frame(None);
    let estimate = reconcile(&mut source);

    assert_eq!(estimate.seconds, 0.0);
    assert!(estimate.candidate_methods.is_empty());
    assert_eq!(estimate.duration(), None);
    assert!(!estimate.has_disagreement());
}
