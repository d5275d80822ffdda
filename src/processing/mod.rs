//! Frame conversion
//!
//! Provides:
//! - YUV 4:2:0 (planar and semi-planar) to packed RGBA
//! - Quarter-turn rotation correction

mod convert;
mod rotate;

pub use convert::{convert_yuv420, ColorConverter};
pub use rotate::{normalize_degrees, rotate};
