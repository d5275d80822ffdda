//! PNG snapshots of processed frames

use crate::error::{Error, Result};
use crate::types::{PixelBuffer, PixelFormat};

use std::path::Path;

/// Write a buffer as an 8-bit RGBA PNG
pub fn write_png(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = match buffer.format {
        PixelFormat::Rgba => buffer.data.clone(),
        PixelFormat::Bgra => {
            let mut data = buffer.data.clone();
            for px in data.chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL) {
                px.swap(0, 2);
            }
            data
        }
    };

    let image = image::RgbaImage::from_raw(buffer.width, buffer.height, data).ok_or_else(|| {
        Error::Snapshot(format!(
            "Buffer does not match {}x{}",
            buffer.width, buffer.height
        ))
    })?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Error::Snapshot(format!("{}: {}", path.display(), e)))?;

    tracing::info!(
        path = %path.display(),
        bytes = buffer.size_bytes(),
        "Snapshot written"
    );
    Ok(())
}
