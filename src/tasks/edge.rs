//! Edge detection task
//!
//! Grayscale → 5×5 Gaussian → Sobel gradients → non-maximum suppression →
//! hysteresis thresholding.

use super::grayscale::luma_plane;
use super::{ParameterSet, ProcessingTask, TaskDescriptor, TaskId, TaskParameter};
use crate::error::{Error, Result};
use crate::types::PixelBuffer;

const KERNEL_SIZE: usize = 5;

// tan(22.5°) in Q15
const TG22: i64 = 13573;
const Q15_SHIFT: u32 = 15;

const NOT_EDGE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Gaussian smoothing followed by a dual-threshold edge detector
pub struct EdgeDetectionTask {
    descriptor: TaskDescriptor,
}

impl EdgeDetectionTask {
    pub const LOW_THRESHOLD: &'static str = "lowThreshold";
    pub const HIGH_THRESHOLD: &'static str = "highThreshold";

    pub fn new() -> Self {
        Self {
            descriptor: TaskDescriptor {
                id: TaskId::EdgeDetection,
                name: "Edge Detection",
                description: "Detects edges using Canny algorithm with dual thresholds.",
                parameters: vec![
                    TaskParameter::float(Self::LOW_THRESHOLD, "Low Threshold", 50.0, 0.0, 255.0),
                    TaskParameter::float(Self::HIGH_THRESHOLD, "High Threshold", 150.0, 0.0, 255.0),
                ],
            },
        }
    }

    fn threshold(&self, params: &ParameterSet, key: &str) -> Result<f64> {
        let param = self
            .descriptor
            .parameter(key)
            .ok_or_else(|| Error::Internal(format!("Edge detection lacks parameter {}", key)))?;
        params.float(param)
    }
}

impl Default for EdgeDetectionTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingTask for EdgeDetectionTask {
    fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    fn process(&self, input: &PixelBuffer, params: &ParameterSet) -> Result<PixelBuffer> {
        let low = self.threshold(params, Self::LOW_THRESHOLD)?;
        let high = self.threshold(params, Self::HIGH_THRESHOLD)?;

        let width = input.width as usize;
        let height = input.height as usize;
        let gray = luma_plane(input);
        let blurred = gaussian_blur_5x5(&gray, width, height);
        let edges = canny(&blurred, width, height, low, high);

        Ok(PixelBuffer::from_gray(
            &edges,
            input.width,
            input.height,
            input.format,
        ))
    }
}

/// Binomial 5-tap kernel (sigma 1.1), weights sum to 16
fn gaussian_kernel() -> [u32; KERNEL_SIZE] {
    [1, 4, 6, 4, 1]
}

/// Reflect-101 border: ...c b | a b c ... | b a...
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

/// Separable 5×5 Gaussian with rounding, 8-bit in and out
pub(crate) fn gaussian_blur_5x5(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let kernel = gaussian_kernel();
    let radius = (KERNEL_SIZE / 2) as isize;

    // Horizontal pass keeps the unnormalised sums (max 16 * 255)
    let mut tmp = vec![0u32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            tmp[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * row[reflect_101(x as isize + k as isize - radius, width)] as u32)
                .sum();
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let sum: u32 = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    w * tmp[reflect_101(y as isize + k as isize - radius, height) * width + x]
                })
                .sum();
            out[y * width + x] = ((sum + 128) >> 8) as u8;
        }
    }
    out
}

/// 3×3 Sobel derivatives with replicated borders
fn sobel(src: &[u8], width: usize, height: usize) -> (Vec<i32>, Vec<i32>) {
    let at = |x: isize, y: isize| -> i32 {
        let cx = x.clamp(0, width as isize - 1) as usize;
        let cy = y.clamp(0, height as isize - 1) as usize;
        src[cy * width + cx] as i32
    };

    let mut dx = vec![0i32; width * height];
    let mut dy = vec![0i32; width * height];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let idx = y as usize * width + x as usize;
            dx[idx] = (at(x + 1, y - 1) - at(x - 1, y - 1))
                + 2 * (at(x + 1, y) - at(x - 1, y))
                + (at(x + 1, y + 1) - at(x - 1, y + 1));
            dy[idx] = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
        }
    }
    (dx, dy)
}

/// Hysteresis edge detector; returns a 0/255 mask
///
/// Thresholds are floored; if `low > high` they are swapped.
pub(crate) fn canny(src: &[u8], width: usize, height: usize, low: f64, high: f64) -> Vec<u8> {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let low = low.floor() as i32;
    let high = high.floor() as i32;

    let (dx, dy) = sobel(src, width, height);
    let magnitude: Vec<i32> = dx.iter().zip(&dy).map(|(x, y)| x.abs() + y.abs()).collect();
    let map = non_max_suppression(&magnitude, &dx, &dy, width, height, low, high);
    hysteresis(map, width, height)
}

/// Classify each pixel as not-edge, weak or strong, keeping only local maxima
/// along the gradient direction
fn non_max_suppression(
    magnitude: &[i32],
    dx: &[i32],
    dy: &[i32],
    width: usize,
    height: usize,
    low: i32,
    high: i32,
) -> Vec<u8> {
    // Out-of-image neighbours have zero magnitude
    let mag = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    let mut map = vec![NOT_EDGE; width * height];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let idx = y as usize * width + x as usize;
            let m = magnitude[idx];
            if m <= low {
                continue;
            }

            let gx = dx[idx] as i64;
            let gy = dy[idx] as i64;
            let xs = gx.abs();
            let ys = gy.abs() << Q15_SHIFT;
            let tg22x = xs * TG22;

            let is_max = if ys < tg22x {
                // Near-horizontal gradient: compare left/right
                m > mag(x - 1, y) && m >= mag(x + 1, y)
            } else {
                let tg67x = tg22x + (xs << (Q15_SHIFT + 1));
                if ys > tg67x {
                    // Near-vertical gradient: compare up/down
                    m > mag(x, y - 1) && m >= mag(x, y + 1)
                } else {
                    let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
                    m > mag(x - s, y - 1) && m > mag(x + s, y + 1)
                }
            };

            if is_max {
                map[idx] = if m > high { STRONG } else { WEAK };
            }
        }
    }
    map
}

/// Promote weak pixels 8-connected to a strong one; drop the rest
fn hysteresis(mut map: Vec<u8>, width: usize, height: usize) -> Vec<u8> {
    let mut stack: Vec<usize> = map
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v == STRONG)
        .map(|(i, _)| i)
        .collect();

    while let Some(idx) = stack.pop() {
        let x = (idx % width) as isize;
        let y = (idx / width) as isize;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                if map[n] == WEAK {
                    map[n] = STRONG;
                    stack.push(n);
                }
            }
        }
    }

    map.into_iter()
        .map(|v| if v == STRONG { 255 } else { 0 })
        .collect()
}
