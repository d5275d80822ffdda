//! Synthetic YUV test-pattern source

use super::{FrameSource, Plane, RawFrame};
use crate::error::{Error, Result};
use crate::types::Resolution;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces I420 frames with a moving diagonal gradient and colour bars
pub struct SyntheticSource {
    resolution: Resolution,
    rotation_degrees: i32,
    frame_index: u64,
    released: Arc<AtomicU64>,
}

impl SyntheticSource {
    pub fn new(resolution: Resolution) -> Result<Self> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(Error::Config(format!(
                "Synthetic source needs a non-empty resolution, got {}",
                resolution
            )));
        }
        Ok(Self {
            resolution,
            rotation_degrees: 0,
            frame_index: 0,
            released: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Rotation reported with every frame
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Frames produced so far
    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }

    /// Frames handed out but not yet released
    pub fn outstanding(&self) -> u64 {
        self.frame_index - self.released.load(Ordering::SeqCst)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<RawFrame> {
        let w = self.resolution.width as usize;
        let h = self.resolution.height as usize;
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let shift = self.frame_index as usize;

        let mut luma = vec![0u8; w * h];
        for (y, row) in luma.chunks_exact_mut(w).enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = ((x + y + shift * 4) % 256) as u8;
            }
        }

        // Eight vertical colour bars in the chroma planes
        let mut u = vec![128u8; cw * ch];
        let mut v = vec![128u8; cw * ch];
        for y in 0..ch {
            for x in 0..cw {
                let bar = (x * 8 / cw.max(1)) as u8;
                u[y * cw + x] = bar.wrapping_mul(32);
                v[y * cw + x] = 255 - bar.wrapping_mul(32);
            }
        }

        self.frame_index += 1;
        let released = self.released.clone();
        Ok(RawFrame::new(
            self.resolution.width,
            self.resolution.height,
            self.rotation_degrees,
            vec![
                Plane::new(luma, w, 1),
                Plane::new(u, cw, 1),
                Plane::new(v, cw, 1),
            ],
        )
        .with_release(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }
}
