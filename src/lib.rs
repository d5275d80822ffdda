//! framesight: live camera frame analysis
//!
//! Converts raw YUV 4:2:0 camera frames to RGBA, applies one selectable
//! image-processing task and delivers the results together with FPS and
//! resolution metrics.
//!
//! # Features
//!
//! - **Conversion**: planar and semi-planar YUV 4:2:0 to RGBA with rotation
//! - **Tasks**: grayscale and Canny edge detection with typed parameters
//! - **Backpressure**: one frame in flight, newer frames dropped while busy
//! - **Metrics**: frames-per-second samples and detected sensor resolution
//!
//! # Example
//!
//! ```rust,no_run
//! use framesight::{ChannelSink, FrameSource, PipelineBuilder, Resolution, SyntheticSource, TaskId};
//! use std::sync::Arc;
//!
//! fn main() -> framesight::Result<()> {
//!     let (sink, results) = ChannelSink::unbounded();
//!     let pipeline = PipelineBuilder::new()
//!         .task(TaskId::Grayscale)
//!         .sink(Arc::new(sink))
//!         .build()?;
//!     pipeline.start()?;
//!
//!     let mut source = SyntheticSource::new(Resolution::VGA)?;
//!     pipeline.offer(source.next_frame()?);
//!
//!     pipeline.stop()?;
//!     println!("{} events", results.len());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod rate;
pub mod tasks;
pub mod types;

// Re-exports for convenience
pub use analyzer::{FrameAnalyzer, FrameOutcome};
pub use capture::{FrameSource, Plane, RawFrame, SyntheticSource};
pub use config::{AnalysisConfig, AnalyzerConfig, CameraSettings};
pub use error::{Error, ErrorKind, Result};
pub use output::{AnalyzerEvent, ChannelSink, NullSink, ResultSink};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use rate::RateTracker;
pub use tasks::{ParamValue, ParameterSet, ProcessingTask, TaskDescriptor, TaskId, TaskRegistry};
pub use types::{CameraFacing, PixelBuffer, PixelFormat, Resolution, Stats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
