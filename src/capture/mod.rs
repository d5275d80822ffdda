//! Capture boundary
//!
//! Raw frames arrive from an external capture service as YUV 4:2:0 planes.
//! A frame owns a release hook that hands its backing storage back to the
//! source; the hook fires exactly once, when the frame is dropped.

mod synthetic;

pub use synthetic::SyntheticSource;

use crate::error::Result;
use crate::types::Resolution;

/// Callback returning a frame's backing storage to its source
pub type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

/// One plane of a planar or semi-planar frame
#[derive(Debug, Clone)]
pub struct Plane {
    /// Plane bytes
    pub data: Vec<u8>,
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between consecutive samples within a row
    pub pixel_stride: usize,
}

impl Plane {
    pub fn new(data: Vec<u8>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }
}

/// A raw sensor frame, exclusively owned by the analyzer for one call
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation needed to display the frame upright
    pub rotation_degrees: i32,
    /// Luma plane followed by the U and V chroma planes
    pub planes: Vec<Plane>,
    release: Option<ReleaseHook>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, rotation_degrees: i32, planes: Vec<Plane>) -> Self {
        Self {
            width,
            height,
            rotation_degrees,
            planes,
            release: None,
        }
    }

    /// Planar 4:2:0 (Y, U, V in one contiguous buffer, no padding)
    pub fn from_i420(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let y_size = w * h;
        let c_size = cw * ch;
        check_len(data, y_size + 2 * c_size, "I420")?;

        Ok(Self::new(
            width,
            height,
            0,
            vec![
                Plane::new(data[..y_size].to_vec(), w, 1),
                Plane::new(data[y_size..y_size + c_size].to_vec(), cw, 1),
                Plane::new(data[y_size + c_size..y_size + 2 * c_size].to_vec(), cw, 1),
            ],
        ))
    }

    /// Semi-planar 4:2:0 with interleaved U/V
    pub fn from_nv12(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        Self::from_semi_planar(width, height, data, false)
    }

    /// Semi-planar 4:2:0 with interleaved V/U
    pub fn from_nv21(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        Self::from_semi_planar(width, height, data, true)
    }

    fn from_semi_planar(width: u32, height: u32, data: &[u8], v_first: bool) -> Result<Self> {
        let (w, h) = (width as usize, height as usize);
        let row = w.div_ceil(2) * 2;
        let y_size = w * h;
        let uv_size = row * h.div_ceil(2);
        check_len(data, y_size + uv_size, if v_first { "NV21" } else { "NV12" })?;

        // Both chroma planes view the same interleaved rows, offset by one byte
        let uv = &data[y_size..y_size + uv_size];
        let first = uv.to_vec();
        let second = uv[1..].to_vec();
        let (u, v) = if v_first { (second, first) } else { (first, second) };

        Ok(Self::new(
            width,
            height,
            0,
            vec![
                Plane::new(data[..y_size].to_vec(), w, 1),
                Plane::new(u, row, 2),
                Plane::new(v, row, 2),
            ],
        ))
    }

    /// Set the rotation reported by the sensor
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Attach the hook that returns this frame's storage to its source
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Sensor resolution (before rotation)
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Release the frame explicitly; equivalent to dropping it
    pub fn release(self) {}
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("planes", &self.planes.len())
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

fn check_len(data: &[u8], expected: usize, layout: &str) -> Result<()> {
    if data.len() < expected {
        return Err(crate::error::Error::Conversion(format!(
            "{} buffer is {} bytes, expected at least {}",
            layout,
            data.len(),
            expected
        )));
    }
    Ok(())
}

/// Trait for frame producers
pub trait FrameSource: Send {
    /// Produce the next frame
    fn next_frame(&mut self) -> Result<RawFrame>;

    /// Resolution the source delivers
    fn resolution(&self) -> Resolution;
}
