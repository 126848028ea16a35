/// Renders a filled ellipse (semi-axes `a`, `b`, major axis at `angle`) on a
/// uniform background. Pixel centres are at integer coordinates.
#[allow(clippy::too_many_arguments)]
pub fn ellipse_u8(
    width: usize,
    height: usize,
    cx: f64,
    cy: f64,
    a: f64,
    b: f64,
    angle: f64,
    fg: u8,
    bg: u8,
) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(a > 0.0 && b > 0.0, "semi-axes must be positive");

    let (s, c) = angle.sin_cos();
    let mut img = vec![bg; width * height];
    for y in 0..height {
        for x in 0..width {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let u = (c * dx + s * dy) / a;
            let v = (-s * dx + c * dy) / b;
            if u * u + v * v <= 1.0 {
                img[y * width + x] = fg;
            }
        }
    }
    img
}

/// Expands a gray buffer to packed RGB with equal channels.
pub fn gray_to_rgb(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&v| [v, v, v]).collect()
}

/// Nearest-neighbour upscale by an integer factor.
pub fn replicate<T: Copy>(width: usize, height: usize, data: &[T], factor: usize) -> Vec<T> {
    assert_eq!(data.len(), width * height, "buffer does not match dimensions");
    let (w2, h2) = (width * factor, height * factor);
    let mut out = Vec::with_capacity(w2 * h2);
    for y in 0..h2 {
        for x in 0..w2 {
            out.push(data[(y / factor) * width + x / factor]);
        }
    }
    out
}

/// Deterministic pseudo-random samples in `[0, 1)`.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }
}
