//! Quarter-turn rotation of packed pixel buffers

use crate::error::{Error, Result};
use crate::types::{PixelBuffer, PixelFormat};

/// Map any multiple of 90 (including negatives) onto 0/90/180/270
pub fn normalize_degrees(degrees: i32) -> Result<u32> {
    let normalized = degrees.rem_euclid(360);
    if normalized % 90 != 0 {
        return Err(Error::Conversion(format!(
            "Unsupported rotation: {} degrees",
            degrees
        )));
    }
    Ok(normalized as u32)
}

/// Rotate clockwise by a normalised angle; 90/270 swap width and height
pub fn rotate(buffer: PixelBuffer, degrees: u32) -> PixelBuffer {
    if degrees == 0 {
        return buffer;
    }

    let src_w = buffer.width as usize;
    let src_h = buffer.height as usize;
    let bpp = PixelFormat::BYTES_PER_PIXEL;
    let target = buffer.resolution().rotated(degrees);
    let dst_w = target.width as usize;

    let mut output = vec![0u8; buffer.data.len()];
    for y in 0..src_h {
        for x in 0..src_w {
            let (dx, dy) = match degrees {
                90 => (src_h - 1 - y, x),
                180 => (src_w - 1 - x, src_h - 1 - y),
                _ => (y, src_w - 1 - x),
            };
            let src_idx = (y * src_w + x) * bpp;
            let dst_idx = (dy * dst_w + dx) * bpp;
            output[dst_idx..dst_idx + bpp].copy_from_slice(&buffer.data[src_idx..src_idx + bpp]);
        }
    }

    PixelBuffer {
        data: output,
        width: target.width,
        height: target.height,
        format: buffer.format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 buffer: red on the left, blue on the right
    fn red_blue() -> PixelBuffer {
        PixelBuffer::from_data(
            vec![255, 0, 0, 255, 0, 0, 255, 255],
            2,
            1,
            PixelFormat::Rgba,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_degrees(0).unwrap(), 0);
        assert_eq!(normalize_degrees(-90).unwrap(), 270);
        assert_eq!(normalize_degrees(450).unwrap(), 90);
        assert!(normalize_degrees(30).is_err());
    }

    #[test]
    fn test_rotate_90_clockwise() {
        // Left pixel ends up on top
        let out = rotate(red_blue(), 90);
        assert_eq!((out.width, out.height), (1, 2));
        assert_eq!(out.rgba_at(0, 0), [255, 0, 0, 255]);
        assert_eq!(out.rgba_at(0, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn test_rotate_270_clockwise() {
        let out = rotate(red_blue(), 270);
        assert_eq!((out.width, out.height), (1, 2));
        assert_eq!(out.rgba_at(0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_rotate_180() {
        let out = rotate(red_blue(), 180);
        assert_eq!((out.width, out.height), (2, 1));
        assert_eq!(out.rgba_at(0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_four_quarter_turns_identity() {
        let original = PixelBuffer::from_data((0..24).collect(), 3, 2, PixelFormat::Rgba).unwrap();
        let mut buf = original.clone();
        for _ in 0..4 {
            buf = rotate(buf, 90);
        }
        assert_eq!(buf, original);
    }
}
