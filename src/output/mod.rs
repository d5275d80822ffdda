//! Result sinks
//!
//! The analyzer reports through three independent channels:
//! - processed frames
//! - FPS samples (at most once per second)
//! - the delivered resolution (at most once per configuration epoch)

mod snapshot;

pub use snapshot::write_png;

use crate::types::{PixelBuffer, Resolution};
use crossbeam_channel::{Receiver, Sender};

/// Trait for consumers of analysis results
///
/// Called from the analysis worker; implementations must not block for long.
pub trait ResultSink: Send + Sync {
    /// A successfully processed frame; the sink takes ownership
    fn on_result(&self, buffer: PixelBuffer);

    /// Frames per second over the last window
    fn on_fps_sample(&self, fps: u32);

    /// Actual delivered sensor resolution
    fn on_resolution_detected(&self, resolution: Resolution);
}

/// Everything a sink can receive, as one message type
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    Result(PixelBuffer),
    Fps(u32),
    Resolution(Resolution),
}

/// Forwards events onto a crossbeam channel
pub struct ChannelSink {
    tx: Sender<AnalyzerEvent>,
}

impl ChannelSink {
    /// Unbounded sink plus its receiver
    pub fn unbounded() -> (Self, Receiver<AnalyzerEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Bounded sink; results that do not fit are discarded
    pub fn bounded(capacity: usize) -> (Self, Receiver<AnalyzerEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    fn send(&self, event: AnalyzerEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!("Result channel unavailable: {}", e);
        }
    }
}

impl ResultSink for ChannelSink {
    fn on_result(&self, buffer: PixelBuffer) {
        self.send(AnalyzerEvent::Result(buffer));
    }

    fn on_fps_sample(&self, fps: u32) {
        self.send(AnalyzerEvent::Fps(fps));
    }

    fn on_resolution_detected(&self, resolution: Resolution) {
        self.send(AnalyzerEvent::Resolution(resolution));
    }
}

/// Discards everything (for benchmarks and tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn on_result(&self, _buffer: PixelBuffer) {}
    fn on_fps_sample(&self, _fps: u32) {}
    fn on_resolution_detected(&self, _resolution: Resolution) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelFormat;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, rx) = ChannelSink::unbounded();
        sink.on_resolution_detected(Resolution::VGA);
        sink.on_fps_sample(30);
        sink.on_result(PixelBuffer::new(1, 1, PixelFormat::Rgba));

        assert_eq!(rx.recv().unwrap(), AnalyzerEvent::Resolution(Resolution::VGA));
        assert_eq!(rx.recv().unwrap(), AnalyzerEvent::Fps(30));
        assert!(matches!(rx.recv().unwrap(), AnalyzerEvent::Result(_)));
    }

    #[test]
    fn test_full_bounded_sink_does_not_block() {
        let (sink, rx) = ChannelSink::bounded(1);
        sink.on_fps_sample(1);
        sink.on_fps_sample(2);
        assert_eq!(rx.len(), 1);
        assert_eq!(rx.recv().unwrap(), AnalyzerEvent::Fps(1));
    }
}
