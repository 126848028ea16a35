use animal_tracker::handoff::LatestFrame;
use animal_tracker::image::io::OwnedFrame;
use animal_tracker::image::PixelFormat;
use animal_tracker::{Tracker, TrackerParams};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    // Demo: a capture thread renders a bright ellipse swimming left to right;
    // the tracker keeps up with whatever frame is newest.
    env_logger::init();
    let (w, h) = (160usize, 120usize);
    let fps = 30.0;
    let slot = Arc::new(LatestFrame::<(f64, OwnedFrame)>::new());

    let producer = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            for i in 0..40usize {
                let t = i as f64 / fps;
                let (cx, cy) = (30.0 + 2.0 * i as f64, 60.0 + 0.5 * i as f64);
                let pixels = render_ellipse(w, h, cx, cy, 12.0, 5.0, 0.1);
                slot.publish((t, OwnedFrame::new(w, h, PixelFormat::Gray8, pixels)));
                thread::sleep(Duration::from_millis(2));
            }
            slot.close();
        })
    };

    let mut tracker = Tracker::new(TrackerParams::default());
    while let Some((t, frame)) = slot.wait_take() {
        match tracker.process(&frame.as_view(), Some(t)) {
            Ok(r) => println!(
                "t={t:.3} centroid=({:.1},{:.1}) heading={} smoothed=({:.1},{:.1}) lines={} ms={:.3}",
                r.ellipse.centroid.x,
                r.ellipse.centroid.y,
                r.orientation
                    .angle()
                    .map_or_else(|| "-".to_string(), |a| format!("{a:.3}")),
                r.smoothed.x,
                r.smoothed.y,
                r.hough_lines.len(),
                r.timing.total_ms
            ),
            Err(err) => eprintln!("t={t:.3}: {err}"),
        }
    }
    if producer.join().is_err() {
        eprintln!("capture thread panicked");
    }
    println!(
        "processed={} published={} dropped={}",
        tracker.frames_processed(),
        slot.published(),
        slot.dropped()
    );
}

fn render_ellipse(w: usize, h: usize, cx: f64, cy: f64, a: f64, b: f64, angle: f64) -> Vec<u8> {
    let (s, c) = angle.sin_cos();
    let mut img = vec![16u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let u = (c * dx + s * dy) / a;
            let v = (-s * dx + c * dy) / b;
            if u * u + v * v <= 1.0 {
                img[y * w + x] = 220;
            }
        }
    }
    img
}
