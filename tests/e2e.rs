mod common;

use animal_tracker::angle::heading_difference;
use animal_tracker::filters::intensity_from_u8;
use animal_tracker::image::{Frame, GridF32};
use animal_tracker::orientation::AxisLabel;
use animal_tracker::{FaultPolicy, FrameResult, Orientation, ParallelGrid, Tracker, TrackerParams};
use common::init_logging;
use common::synthetic_image::{ellipse_u8, gray_to_rgb};
use std::f64::consts::PI;

const W: usize = 160;
const H: usize = 120;
const FPS: f64 = 30.0;

fn sequential_tracker(params: TrackerParams) -> Tracker {
    Tracker::with_grid(params, ParallelGrid::sequential())
}

fn subject(cx: f64, cy: f64) -> Vec<u8> {
    ellipse_u8(W, H, cx, cy, 12.0, 5.0, 0.0, 220, 16)
}

fn track_sweep(tracker: &mut Tracker, start: f64, step: f64, frames: usize) -> Vec<FrameResult> {
    (0..frames)
        .map(|i| {
            let px = subject(start + step * i as f64, 60.0);
            tracker
                .process(&Frame::gray(W, H, &px), Some(i as f64 / FPS))
                .expect("valid frame")
        })
        .collect()
}

#[test]
fn blank_frame_reports_empty_everywhere() {
    init_logging();
    let mut tracker = sequential_tracker(TrackerParams::default());
    let px = vec![0u8; W * H];
    let r = tracker
        .process(&Frame::gray(W, H, &px), Some(0.0))
        .expect("valid frame");

    assert!(r.empty);
    assert!(!r.faulted);
    assert_eq!(r.foreground_pixels, 0);
    assert!(!r.ellipse.valid);
    assert_eq!(r.orientation, Orientation::NotOriented);
    assert!(r.hough_lines.is_empty());
    assert!(r.velocity.is_none());
    assert_eq!((r.smoothed.x, r.smoothed.y), (79.5, 59.5));
    assert!(tracker.orientation_path().is_empty());
    assert_eq!(r.timing.stages[0].label, "grayscale");
}

#[test]
fn subject_moving_right_keeps_the_raw_axis() {
    init_logging();
    let mut tracker = sequential_tracker(TrackerParams::default());
    let results = track_sweep(&mut tracker, 30.0, 4.0, 16);

    for r in &results {
        assert!(!r.empty && !r.faulted, "frame {} degraded", r.frame_index);
        let angle = r.orientation.angle().expect("oriented");
        assert!(
            heading_difference(angle, 0.0) < 0.1,
            "frame {} heading {angle}",
            r.frame_index
        );
    }
    assert!(tracker.orientation_path().iter().all(|&l| l == AxisLabel::Keep));

    let last = results.last().expect("frames");
    assert!((last.ellipse.centroid.x - 90.0).abs() < 0.1);
    assert!((last.ellipse.centroid.y - 60.0).abs() < 0.1);
    assert!((last.smoothed.x - last.ellipse.centroid.x).abs() < 0.5);
    let v = last.velocity.expect("velocity");
    assert!((v.x - 120.0).abs() < 2.0, "vx = {}", v.x);
    assert!(v.y.abs() < 2.0, "vy = {}", v.y);
    assert!(last.scalars.major_length.value > last.scalars.minor_length.value);
}

#[test]
fn subject_moving_left_is_flipped_retroactively() {
    init_logging();
    let mut tracker = sequential_tracker(TrackerParams::default());
    let results = track_sweep(&mut tracker, 130.0, -4.0, 12);

    // Nothing is known about motion on the first frame.
    assert!(matches!(
        results[0].orientation,
        Orientation::Oriented {
            label: AxisLabel::Keep,
            ..
        }
    ));
    for r in &results[1..] {
        let angle = r.orientation.angle().expect("oriented");
        assert!(
            heading_difference(angle, PI) < 0.1,
            "frame {} heading {angle}",
            r.frame_index
        );
    }
    let path = tracker.orientation_path();
    assert_eq!(path.len(), results.len());
    assert!(path.iter().all(|&l| l == AxisLabel::Flip));
}

#[test]
fn blank_frames_hold_the_track() {
    init_logging();
    let mut tracker = sequential_tracker(TrackerParams::default());
    let results = track_sweep(&mut tracker, 30.0, 4.0, 4);
    let before = results.last().expect("frames").smoothed;

    let blank = vec![16u8; W * H];
    let r = tracker
        .process(&Frame::gray(W, H, &blank), Some(4.0 / FPS))
        .expect("valid frame");
    assert!(r.empty);
    assert_eq!(r.orientation, Orientation::NotOriented);
    assert_eq!(r.smoothed, before);
    assert_eq!(tracker.orientation_path().len(), 4);
    assert_eq!(tracker.frames_processed(), 5);
}

#[test]
fn rgb_and_gray_frames_agree() {
    init_logging();
    let gray = subject(70.0, 50.0);
    let rgb = gray_to_rgb(&gray);

    let mut a = sequential_tracker(TrackerParams::default());
    let mut b = sequential_tracker(TrackerParams::default());
    let rg = a.process(&Frame::gray(W, H, &gray), None).expect("gray");
    let rc = b.process(&Frame::rgb(W, H, &rgb), None).expect("rgb");

    assert!((rg.ellipse.centroid - rc.ellipse.centroid).norm() < 0.1);
    assert!((rg.ellipse.angle - rc.ellipse.angle).abs() < 0.01);
}

#[test]
fn non_finite_pixels_fault_the_frame_under_repeat_last() {
    init_logging();
    let params = TrackerParams {
        fault_policy: FaultPolicy::RepeatLast,
        ..TrackerParams::default()
    };
    let mut tracker = sequential_tracker(params);
    let seq = ParallelGrid::sequential();

    let good: GridF32 = intensity_from_u8(&seq, W, H, &subject(60.0, 60.0));
    let first = tracker.process_intensity(&good, Some(0.0));
    assert!(!first.faulted);

    let mut bad = intensity_from_u8(&seq, W, H, &subject(64.0, 60.0));
    bad.set(64, 60, f32::INFINITY);
    let r = tracker.process_intensity(&bad, Some(1.0 / FPS));

    assert!(!r.empty);
    assert!(r.faulted);
    assert!(!r.ellipse.valid);
    assert!(r.hu.is_none());
    assert!(r.scalars.axis_angle.faulted);
    assert_eq!(r.scalars.axis_angle.value, first.scalars.axis_angle.value);
    assert_eq!(r.scalars.major_length.value, first.scalars.major_length.value);
    assert_eq!(r.orientation, Orientation::NotOriented);
    assert_eq!(r.smoothed, first.smoothed);
    assert_eq!(tracker.orientation_path().len(), 1);

    let next = intensity_from_u8(&seq, W, H, &subject(68.0, 60.0));
    let r = tracker.process_intensity(&next, Some(2.0 / FPS));
    assert!(!r.faulted);
    assert!(r.orientation.is_oriented());
    assert_eq!(tracker.orientation_path().len(), 2);
}

#[test]
fn nan_policy_publishes_nan() {
    init_logging();
    let mut tracker = sequential_tracker(TrackerParams::default());
    let mut img = intensity_from_u8(&ParallelGrid::sequential(), W, H, &subject(60.0, 60.0));
    img.set(60, 60, f32::INFINITY);
    let r = tracker.process_intensity(&img, None);
    assert!(r.faulted);
    assert!(r.scalars.minor_length.value.is_nan());
}

#[test]
fn results_serialize_with_tagged_orientation() {
    let mut tracker = sequential_tracker(TrackerParams::default());
    let px = subject(50.0, 40.0);
    let r = tracker.process(&Frame::gray(W, H, &px), Some(0.0)).expect("frame");
    let json = serde_json::to_value(&r).expect("json");
    assert_eq!(json["orientation"]["state"], "oriented");
    assert_eq!(json["orientation"]["label"], "keep");
    assert!(json["timing"]["totalMs"].is_number());
    assert_eq!(json["frame_index"], 0);
}

#[cfg(feature = "parallel")]
#[test]
fn pooled_tracker_matches_sequential() {
    init_logging();
    let pooled = ParallelGrid::with_threads(4)
        .expect("pool")
        .with_threshold(64);
    let mut par = Tracker::with_grid(TrackerParams::default(), pooled);
    let mut seq = sequential_tracker(TrackerParams::default());

    let a = track_sweep(&mut par, 40.0, 3.0, 6);
    let b = track_sweep(&mut seq, 40.0, 3.0, 6);
    for (p, s) in a.iter().zip(&b) {
        assert_eq!(p.foreground_pixels, s.foreground_pixels);
        assert_eq!(p.threshold, s.threshold);
        assert_eq!(p.edge_pixels, s.edge_pixels);
        assert!((p.ellipse.centroid - s.ellipse.centroid).norm() < 1e-9);
        assert_eq!(
            p.orientation.is_oriented(),
            s.orientation.is_oriented()
        );
        let votes = |r: &FrameResult| r.hough_lines.iter().map(|l| l.votes).collect::<Vec<_>>();
        assert_eq!(votes(p), votes(s));
    }
    assert_eq!(par.orientation_path(), seq.orientation_path());
}
