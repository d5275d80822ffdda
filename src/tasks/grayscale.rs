//! Grayscale task

use super::{ParameterSet, ProcessingTask, TaskDescriptor, TaskId};
use crate::error::Result;
use crate::types::{PixelBuffer, PixelFormat};

// BT.601 luma weights in 14-bit fixed point; they sum to 1 << 14
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Luma of every pixel as a single-channel plane
///
/// Weights follow the buffer's declared channel order, so pure red is 76 for
/// both RGBA and BGRA input.
pub(crate) fn luma_plane(input: &PixelBuffer) -> Vec<u8> {
    let (r, g, b) = input.format.rgb_offsets();
    input
        .data
        .chunks_exact(PixelFormat::BYTES_PER_PIXEL)
        .map(|px| {
            let sum = R_WEIGHT * px[r] as u32 + G_WEIGHT * px[g] as u32 + B_WEIGHT * px[b] as u32;
            ((sum + (1 << (SHIFT - 1))) >> SHIFT) as u8
        })
        .collect()
}

/// Converts to luma and replicates it across R, G and B
pub struct GrayscaleTask {
    descriptor: TaskDescriptor,
}

impl GrayscaleTask {
    pub fn new() -> Self {
        Self {
            descriptor: TaskDescriptor {
                id: TaskId::Grayscale,
                name: "Grayscale",
                description: "Converts image to grayscale.",
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for GrayscaleTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingTask for GrayscaleTask {
    fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    fn process(&self, input: &PixelBuffer, _params: &ParameterSet) -> Result<PixelBuffer> {
        let gray = luma_plane(input);
        Ok(PixelBuffer::from_gray(
            &gray,
            input.width,
            input.height,
            input.format,
        ))
    }
}
