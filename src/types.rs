//! Common types used throughout framesight

use serde::{Deserialize, Serialize};

/// Frame resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    // Common resolutions
    pub const VGA: Self = Self::new(640, 480);
    pub const HD_720P: Self = Self::new(1280, 720);
    pub const FHD_1080P: Self = Self::new(1920, 1080);

    /// Calculate total pixels
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Dimensions after rotating by `degrees` (already normalised to 0/90/180/270)
    pub fn rotated(&self, degrees: u32) -> Self {
        match degrees {
            90 | 270 => Self::new(self.height, self.width),
            _ => *self,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD_720P
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Resolution {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| crate::error::Error::Config(format!("Invalid resolution: {}", s)))?;
        match (w.trim().parse(), h.trim().parse()) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(Self::new(width, height)),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid resolution: {}",
                s
            ))),
        }
    }
}

/// Which physical camera the capture collaborator should bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Front => write!(f, "front"),
            CameraFacing::Back => write!(f, "back"),
        }
    }
}

/// Channel order of a packed 4-byte pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PixelFormat {
    /// R, G, B, A
    #[default]
    Rgba,
    /// B, G, R, A
    Bgra,
}

impl PixelFormat {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Byte offsets of (red, green, blue) within one pixel
    pub fn rgb_offsets(&self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Rgba => (0, 1, 2),
            PixelFormat::Bgra => (2, 1, 0),
        }
    }
}

/// Packed, row-major, 4 bytes per pixel image with a top-left origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl PixelBuffer {
    /// Create an opaque black buffer
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * PixelFormat::BYTES_PER_PIXEL];
        for px in data.chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL) {
            px[3] = 255;
        }
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Wrap existing packed data, checking its length
    pub fn from_data(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> crate::error::Result<Self> {
        let expected = width as usize * height as usize * PixelFormat::BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(crate::error::Error::Processing(format!(
                "Pixel buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Build an opaque buffer from a single-channel plane, replicating it into R/G/B
    pub fn from_gray(gray: &[u8], width: u32, height: u32, format: PixelFormat) -> Self {
        let mut data = Vec::with_capacity(gray.len() * PixelFormat::BYTES_PER_PIXEL);
        for &v in gray {
            data.extend_from_slice(&[v, v, v, 255]);
        }
        Self {
            data,
            width,
            height,
            format,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Pixel at (x, y) as stored (channel order per `format`)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * PixelFormat::BYTES_PER_PIXEL;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Pixel at (x, y) as (r, g, b, a) regardless of storage order
    pub fn rgba_at(&self, x: u32, y: u32) -> [u8; 4] {
        let px = self.pixel(x, y);
        let (r, g, b) = self.format.rgb_offsets();
        [px[r], px[g], px[b], px[3]]
    }

    /// Calculate buffer size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Frames handed to the analyzer
    pub frames_received: u64,
    /// Frames that produced a result
    pub frames_processed: u64,
    /// Frames discarded because a frame was already in flight
    pub frames_dropped: u64,
    /// Frames discarded because conversion or processing failed
    pub frames_failed: u64,
    /// FPS samples emitted
    pub fps_samples: u64,
    /// Most recent FPS sample
    pub last_fps: u32,
}
