//! Analysis pipeline
//!
//! Connects capture → analyzer → result sink.
//! The analyzer runs on a dedicated worker thread fed through a zero-capacity
//! channel: a frame is handed over only while the worker is idle and waiting,
//! otherwise it is released at the boundary without blocking the producer.

use crate::analyzer::{FrameAnalyzer, FrameOutcome};
use crate::capture::RawFrame;
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::output::{NullSink, ResultSink};
use crate::tasks::{ParameterSet, TaskId, TaskRegistry};
use crate::types::{CameraFacing, Resolution, Stats};

use crossbeam_channel::{RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the worker waits for a frame before rechecking the running flag
const WORKER_POLL: Duration = Duration::from_millis(100);

/// Frame analysis pipeline
pub struct Pipeline {
    analyzer: Arc<FrameAnalyzer>,
    running: Arc<AtomicBool>,
    frame_tx: Mutex<Option<Sender<RawFrame>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Frames refused at the worker boundary
    rejected: AtomicU64,
}

impl Pipeline {
    /// Create a pipeline around an existing analyzer
    pub fn new(analyzer: Arc<FrameAnalyzer>) -> Self {
        Self {
            analyzer,
            running: Arc::new(AtomicBool::new(false)),
            frame_tx: Mutex::new(None),
            worker: Mutex::new(None),
            rejected: AtomicU64::new(0),
        }
    }

    /// Create pipeline from configuration with the built-in tasks
    pub fn from_config(config: &AnalyzerConfig, sink: Arc<dyn ResultSink>) -> Result<Self> {
        let analyzer = FrameAnalyzer::new(TaskRegistry::builtin(), sink, config)?;
        Ok(Self::new(Arc::new(analyzer)))
    }

    /// Start the analysis worker
    pub fn start(&self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(Error::PipelineAlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<RawFrame>(0);
        let running = self.running.clone();
        let analyzer = self.analyzer.clone();

        let handle = std::thread::Builder::new()
            .name("framesight-analysis".into())
            .spawn(move || {
                tracing::info!("Analysis worker started");

                while running.load(Ordering::SeqCst) {
                    match frame_rx.recv_timeout(WORKER_POLL) {
                        Ok(frame) => {
                            if analyzer.on_frame(frame) == FrameOutcome::Dropped {
                                tracing::debug!("Worker frame dropped by busy analyzer");
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::info!("Analysis worker stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                Error::Internal(format!("Failed to spawn analysis worker: {}", e))
            })?;

        *self.frame_tx.lock() = Some(frame_tx);
        *self.worker.lock() = Some(handle);
        tracing::info!(task = %self.analyzer.active_task(), "Pipeline started");
        Ok(())
    }

    /// Hand a frame to the worker without blocking
    ///
    /// Returns `false` when the worker is busy or the pipeline is stopped; the
    /// frame has then already been released.
    pub fn offer(&self, frame: RawFrame) -> bool {
        let result = match self.frame_tx.lock().as_ref() {
            Some(tx) => tx.try_send(frame),
            None => Err(TrySendError::Disconnected(frame)),
        };

        match result {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) | Err(TrySendError::Disconnected(frame)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Worker busy, frame released at boundary");
                frame.release();
                false
            }
        }
    }

    /// Stop the worker and wait for it to exit
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("Pipeline stop requested");

        self.frame_tx.lock().take();
        if let Some(handle) = self.worker.lock().take() {
            handle
                .join()
                .map_err(|_| Error::Internal("Analysis worker panicked".into()))?;
        }
        Ok(())
    }

    /// Check if pipeline is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Analyzer for runtime reconfiguration
    pub fn analyzer(&self) -> &Arc<FrameAnalyzer> {
        &self.analyzer
    }

    /// Get current statistics, including frames refused at the boundary
    pub fn stats(&self) -> Stats {
        let rejected = self.rejected.load(Ordering::Relaxed);
        let mut stats = self.analyzer.stats();
        stats.frames_received += rejected;
        stats.frames_dropped += rejected;
        stats
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Pipeline shutdown error: {}", e);
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: AnalyzerConfig,
    registry: Arc<TaskRegistry>,
    sink: Arc<dyn ResultSink>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            registry: TaskRegistry::builtin(),
            sink: Arc::new(NullSink),
        }
    }

    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: Arc<TaskRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn task(mut self, task: TaskId) -> Self {
        self.config = self.config.with_task(task);
        self
    }

    pub fn parameters(mut self, parameters: ParameterSet) -> Self {
        self.config = self.config.with_parameters(parameters);
        self
    }

    pub fn facing(mut self, facing: CameraFacing) -> Self {
        self.config = self.config.with_facing(facing);
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.config = self.config.with_resolution(Resolution::new(width, height));
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let analyzer = FrameAnalyzer::new(self.registry, self.sink, &self.config)?;
        Ok(Pipeline::new(Arc::new(analyzer)))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
