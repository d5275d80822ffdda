//! YUV 4:2:0 to packed RGBA conversion

use super::rotate;
use crate::capture::{Plane, RawFrame};
use crate::error::{Error, Result};
use crate::types::{PixelBuffer, PixelFormat};

// Full-range BT.601 coefficients
const V_TO_R: f32 = 1.370705;
const U_TO_G: f32 = 0.337633;
const V_TO_G: f32 = 0.698001;
const U_TO_B: f32 = 1.732446;

/// Stateless YUV → RGBA converter
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorConverter;

impl ColorConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a raw frame, rotating the result clockwise by `rotation_degrees`
    pub fn convert(&self, frame: &RawFrame, rotation_degrees: i32) -> Result<PixelBuffer> {
        convert_yuv420(frame, rotation_degrees)
    }
}

/// Convert a YUV 4:2:0 frame to RGBA and apply rotation
///
/// Channel values are truncated toward zero before clamping.
pub fn convert_yuv420(frame: &RawFrame, rotation_degrees: i32) -> Result<PixelBuffer> {
    let degrees = rotate::normalize_degrees(rotation_degrees)?;
    let (luma, u_plane, v_plane) = validate_layout(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let chroma_row_stride = u_plane.row_stride;
    let chroma_pixel_stride = u_plane.pixel_stride;

    let mut rgba = vec![0u8; width * height * PixelFormat::BYTES_PER_PIXEL];
    for (y, out_row) in rgba
        .chunks_exact_mut(width * PixelFormat::BYTES_PER_PIXEL)
        .enumerate()
    {
        let luma_row = y * luma.row_stride;
        let chroma_row = (y >> 1) * chroma_row_stride;
        for (x, px) in out_row
            .chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL)
            .enumerate()
        {
            let uv_index = chroma_row + (x >> 1) * chroma_pixel_stride;
            let y_val = luma.data[luma_row + x] as i32;
            let u_val = u_plane.data[uv_index] as i32 - 128;
            let v_val = v_plane.data[uv_index] as i32 - 128;
            px.copy_from_slice(&yuv_to_rgba(y_val, u_val, v_val));
        }
    }

    let buffer = PixelBuffer {
        data: rgba,
        width: frame.width,
        height: frame.height,
        format: PixelFormat::Rgba,
    };
    Ok(rotate::rotate(buffer, degrees))
}

/// One pixel; `u` and `v` are already centred on zero
#[inline]
fn yuv_to_rgba(y: i32, u: i32, v: i32) -> [u8; 4] {
    let (y, u, v) = (y as f32, u as f32, v as f32);
    let r = (y + V_TO_R * v) as i32;
    let g = (y - U_TO_G * u - V_TO_G * v) as i32;
    let b = (y + U_TO_B * u) as i32;
    [
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
        255,
    ]
}

/// Check plane count, strides and buffer lengths before touching any sample
fn validate_layout(frame: &RawFrame) -> Result<(&Plane, &Plane, &Plane)> {
    if frame.width == 0 || frame.height == 0 {
        return Err(Error::Conversion(format!(
            "Empty frame {}x{}",
            frame.width, frame.height
        )));
    }
    let [luma, u, v, ..] = frame.planes.as_slice() else {
        return Err(Error::UnsupportedLayout(format!(
            "Expected at least 3 planes, got {}",
            frame.planes.len()
        )));
    };
    if luma.pixel_stride != 1 {
        return Err(Error::UnsupportedLayout(format!(
            "Luma pixel stride {} (expected 1)",
            luma.pixel_stride
        )));
    }
    if !matches!(u.pixel_stride, 1 | 2) {
        return Err(Error::UnsupportedLayout(format!(
            "Chroma pixel stride {} (expected 1 or 2)",
            u.pixel_stride
        )));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    if luma.row_stride < width {
        return Err(Error::Conversion(format!(
            "Luma row stride {} is narrower than width {}",
            luma.row_stride, width
        )));
    }
    let luma_needed = (height - 1)
        .checked_mul(luma.row_stride)
        .and_then(|n| n.checked_add(width))
        .ok_or_else(|| overflow("Luma", luma))?;
    if luma.data.len() < luma_needed {
        return Err(Error::Conversion(format!(
            "Luma plane is {} bytes, need {}",
            luma.data.len(),
            luma_needed
        )));
    }

    let chroma_needed = ((height - 1) >> 1)
        .checked_mul(u.row_stride)
        .and_then(|n| n.checked_add(((width - 1) >> 1) * u.pixel_stride + 1))
        .ok_or_else(|| overflow("Chroma", u))?;
    for (name, plane) in [("U", u), ("V", v)] {
        if plane.data.len() < chroma_needed {
            return Err(Error::Conversion(format!(
                "{} plane is {} bytes, need {}",
                name,
                plane.data.len(),
                chroma_needed
            )));
        }
    }

    Ok((luma, u, v))
}

fn overflow(name: &str, plane: &Plane) -> Error {
    Error::Conversion(format!(
        "{} row stride {} does not fit the address space",
        name, plane.row_stride
    ))
}
