//! Frame analyzer
//!
//! Turns raw camera frames into processed RGBA buffers:
//! snapshot configuration → report resolution → count FPS → convert → process → emit.
//!
//! At most one frame is in flight; a frame arriving while another is being
//! analyzed is released immediately. Every frame is released exactly once
//! regardless of outcome.

use crate::capture::RawFrame;
use crate::config::{AnalyzerConfig, CameraSettings};
use crate::error::{Error, Result};
use crate::output::ResultSink;
use crate::processing::ColorConverter;
use crate::rate::RateTracker;
use crate::tasks::{ParamValue, ParameterSet, ProcessingTask, TaskDescriptor, TaskId, TaskRegistry};
use crate::types::{CameraFacing, PixelBuffer, Resolution, Stats};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// What happened to a frame handed to [`FrameAnalyzer::on_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Converted, processed and delivered to the sink
    Processed,
    /// Discarded because another frame was in flight
    Dropped,
    /// Discarded because conversion or processing failed (or panicked)
    Failed,
}

/// Immutable snapshot of everything a frame is analyzed with
#[derive(Clone)]
struct ActiveConfig {
    task: Arc<dyn ProcessingTask>,
    params: ParameterSet,
    camera: CameraSettings,
    /// Bumped whenever the task or camera changes
    epoch: u64,
}

/// State that restarts with every configuration epoch
struct EpochState {
    epoch: u64,
    rate: RateTracker,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    fps_samples: AtomicU64,
    last_fps: AtomicU32,
}

/// Clears the busy flag when analysis ends, including on unwind
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-active-task frame analyzer
pub struct FrameAnalyzer {
    registry: Arc<TaskRegistry>,
    sink: Arc<dyn ResultSink>,
    converter: ColorConverter,
    active: RwLock<Arc<ActiveConfig>>,
    epoch_state: Mutex<Option<EpochState>>,
    camera_subscribers: Mutex<Vec<Sender<CameraSettings>>>,
    busy: AtomicBool,
    counters: Counters,
}

impl FrameAnalyzer {
    /// Create an analyzer with the configured task and camera settings
    pub fn new(
        registry: Arc<TaskRegistry>,
        sink: Arc<dyn ResultSink>,
        config: &AnalyzerConfig,
    ) -> Result<Self> {
        let params = config.validate(&registry)?;
        let task = registry.get(config.analysis.task)?;
        let mut camera = config.camera.clone();
        camera.resolve();

        tracing::info!(
            task = %task.id(),
            camera = %camera.facing,
            resolution = %camera.resolution,
            "Frame analyzer created"
        );

        Ok(Self {
            registry,
            sink,
            converter: ColorConverter::new(),
            active: RwLock::new(Arc::new(ActiveConfig {
                task,
                params,
                camera,
                epoch: 0,
            })),
            epoch_state: Mutex::new(None),
            camera_subscribers: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
            counters: Counters::default(),
        })
    }

    /// Analyze one frame, or drop it if another frame is in flight
    ///
    /// The frame is released before this returns on every path.
    pub fn on_frame(&self, frame: RawFrame) -> FrameOutcome {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Analyzer busy, dropping frame");
            frame.release();
            return FrameOutcome::Dropped;
        }
        let _busy = BusyGuard(&self.busy);

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.analyze(&frame)))
            .unwrap_or_else(|payload| {
                Err(Error::Internal(format!(
                    "Analysis panicked: {}",
                    panic_message(&*payload)
                )))
            });

        let outcome = match result {
            Ok(buffer) => {
                self.sink.on_result(buffer);
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                FrameOutcome::Processed
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    width = frame.width,
                    height = frame.height,
                    "Frame analysis failed: {}",
                    e
                );
                FrameOutcome::Failed
            }
        };

        frame.release();
        outcome
    }

    fn analyze(&self, frame: &RawFrame) -> Result<PixelBuffer> {
        let config = self.snapshot();

        let (new_epoch, fps) = {
            let mut state = self.epoch_state.lock();
            if state.as_ref().is_some_and(|s| s.epoch != config.epoch) {
                *state = None;
            }
            let new_epoch = state.is_none();
            let current = state.get_or_insert_with(|| EpochState {
                epoch: config.epoch,
                rate: RateTracker::new(),
            });
            (new_epoch, current.rate.tick())
        };

        if new_epoch {
            let resolution = frame.resolution();
            tracing::info!(%resolution, "Camera resolution detected");
            self.sink.on_resolution_detected(resolution);
        }
        if let Some(fps) = fps {
            self.counters.fps_samples.fetch_add(1, Ordering::Relaxed);
            self.counters.last_fps.store(fps, Ordering::Relaxed);
            self.sink.on_fps_sample(fps);
        }

        let rgba = self.converter.convert(frame, frame.rotation_degrees)?;
        config.task.process(&rgba, &config.params)
    }

    fn snapshot(&self) -> Arc<ActiveConfig> {
        self.active.read().clone()
    }

    /// Switch the active task, resetting parameters to its defaults
    pub fn select_task(&self, id: TaskId) -> Result<()> {
        let task = self.registry.get(id)?;
        let params = task.descriptor().defaults();

        let mut active = self.active.write();
        let previous = active.task.id();
        *active = Arc::new(ActiveConfig {
            task,
            params,
            camera: active.camera.clone(),
            epoch: active.epoch + 1,
        });
        drop(active);

        tracing::info!(from = %previous, to = %id, "Task selected");
        Ok(())
    }

    /// Switch the active task by its stable identifier
    pub fn select_task_by_name(&self, name: &str) -> Result<()> {
        self.select_task(name.parse()?)
    }

    /// Change one parameter of the active task
    ///
    /// Rejected values leave the active configuration untouched.
    pub fn set_parameter(&self, key: &str, value: ParamValue) -> Result<()> {
        let mut active = self.active.write();

        let descriptor = active.task.descriptor();
        let param = descriptor
            .parameter(key)
            .ok_or_else(|| Error::UnknownParameter {
                task: descriptor.id.to_string(),
                key: key.to_string(),
            })?;
        let value = param.coerce(&value)?;
        tracing::info!(task = %descriptor.id, key, %value, "Parameter updated");

        let mut next = ActiveConfig::clone(&active);
        next.params.insert(key, value);
        *active = Arc::new(next);
        Ok(())
    }

    /// Switch lens; capture is notified through [`subscribe_camera_changes`](Self::subscribe_camera_changes)
    pub fn select_camera_facing(&self, facing: CameraFacing) {
        self.reconfigure_camera(|camera| camera.facing = facing);
    }

    /// Request a new sensor resolution
    ///
    /// When the device's supported list is known, an unsupported request falls
    /// back to the largest supported resolution.
    pub fn select_resolution(&self, resolution: Resolution) -> Result<()> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(Error::Config(format!("Invalid resolution {}", resolution)));
        }
        self.reconfigure_camera(|camera| {
            camera.resolution = resolution;
            camera.resolve();
        });
        Ok(())
    }

    /// Record the resolutions the opened device offers and re-check the request
    pub fn set_supported_resolutions(&self, supported: &[Resolution]) {
        self.reconfigure_camera(|camera| {
            camera.supported = supported.to_vec();
            camera.resolve();
        });
    }

    fn reconfigure_camera(&self, update: impl FnOnce(&mut CameraSettings)) {
        let settings = {
            let mut active = self.active.write();
            let mut next = ActiveConfig::clone(&active);
            update(&mut next.camera);
            next.epoch += 1;
            let settings = next.camera.clone();
            *active = Arc::new(next);
            settings
        };

        tracing::info!(
            facing = %settings.facing,
            resolution = %settings.resolution,
            "Camera reconfigured"
        );
        self.camera_subscribers
            .lock()
            .retain(|tx| tx.send(settings.clone()).is_ok());
    }

    /// Receive every camera change made after this call
    pub fn subscribe_camera_changes(&self) -> Receiver<CameraSettings> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.camera_subscribers.lock().push(tx);
        rx
    }

    pub fn active_task(&self) -> TaskId {
        self.active.read().task.id()
    }

    /// Parameters of the active task, defaults included
    pub fn parameters(&self) -> ParameterSet {
        self.active.read().params.clone()
    }

    pub fn camera_settings(&self) -> CameraSettings {
        self.active.read().camera.clone()
    }

    pub fn list_tasks(&self) -> Vec<TaskDescriptor> {
        self.registry.list_tasks()
    }

    pub fn defaults(&self, id: TaskId) -> Result<ParameterSet> {
        self.registry.defaults(id)
    }

    /// Check if a frame is currently being analyzed
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Get current statistics
    pub fn stats(&self) -> Stats {
        Stats {
            frames_received: self.counters.received.load(Ordering::Relaxed),
            frames_processed: self.counters.processed.load(Ordering::Relaxed),
            frames_dropped: self.counters.dropped.load(Ordering::Relaxed),
            frames_failed: self.counters.failed.load(Ordering::Relaxed),
            fps_samples: self.counters.fps_samples.load(Ordering::Relaxed),
            last_fps: self.counters.last_fps.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Plane;
    use crate::output::{AnalyzerEvent, ChannelSink, NullSink};
    use crate::tasks::{EdgeDetectionTask, GrayscaleTask, TaskParameter};
    use crossbeam_channel::bounded;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn counted_frame(releases: &Arc<AtomicUsize>) -> RawFrame {
        let releases = releases.clone();
        RawFrame::from_i420(4, 4, &[128u8; 24])
            .unwrap()
            .with_release(move || {
                releases.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn analyzer_with(registry: TaskRegistry, task: TaskId, sink: Arc<dyn ResultSink>) -> FrameAnalyzer {
        let config = AnalyzerConfig::default().with_task(task);
        FrameAnalyzer::new(Arc::new(registry), sink, &config).unwrap()
    }

    /// Signals when it starts and blocks until the gate opens
    struct GateTask {
        descriptor: TaskDescriptor,
        entered: Sender<()>,
        gate: Receiver<()>,
    }

    impl ProcessingTask for GateTask {
        fn descriptor(&self) -> &TaskDescriptor {
            &self.descriptor
        }

        fn process(&self, input: &PixelBuffer, _params: &ParameterSet) -> Result<PixelBuffer> {
            let _ = self.entered.send(());
            let _ = self.gate.recv();
            Ok(input.clone())
        }
    }

    /// Fails every other call
    struct FlakyTask {
        descriptor: TaskDescriptor,
        calls: AtomicUsize,
    }

    impl ProcessingTask for FlakyTask {
        fn descriptor(&self) -> &TaskDescriptor {
            &self.descriptor
        }

        fn process(&self, input: &PixelBuffer, _params: &ParameterSet) -> Result<PixelBuffer> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(Error::Processing("forced failure".into()));
            }
            Ok(input.clone())
        }
    }

    /// Fails unless it sees exactly its own parameter
    struct OwnKeyTask {
        descriptor: TaskDescriptor,
    }

    impl OwnKeyTask {
        fn new(id: TaskId, key: &'static str) -> Self {
            Self {
                descriptor: TaskDescriptor {
                    id,
                    name: "own key",
                    description: "checks its parameter set",
                    parameters: vec![TaskParameter::int(key, key, 1, 0, 10)],
                },
            }
        }
    }

    impl ProcessingTask for OwnKeyTask {
        fn descriptor(&self) -> &TaskDescriptor {
            &self.descriptor
        }

        fn process(&self, input: &PixelBuffer, params: &ParameterSet) -> Result<PixelBuffer> {
            let key = self.descriptor.parameters[0].key;
            if params.len() != 1 || params.get(key).is_none() {
                return Err(Error::Processing(format!("mixed parameters {:?}", params)));
            }
            Ok(input.clone())
        }
    }

    /// Panics on its first call, succeeds afterwards
    struct PanicOnceTask {
        descriptor: TaskDescriptor,
        calls: AtomicUsize,
    }

    impl ProcessingTask for PanicOnceTask {
        fn descriptor(&self) -> &TaskDescriptor {
            &self.descriptor
        }

        fn process(&self, input: &PixelBuffer, _params: &ParameterSet) -> Result<PixelBuffer> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("task blew up");
            }
            Ok(input.clone())
        }
    }

    fn plain_descriptor(id: TaskId) -> TaskDescriptor {
        TaskDescriptor {
            id,
            name: "test",
            description: "test task",
            parameters: Vec::new(),
        }
    }

    #[test]
    fn test_busy_analyzer_drops_second_frame() {
        let (entered_tx, entered_rx) = bounded(1);
        let (gate_tx, gate_rx) = bounded(1);
        let registry = TaskRegistry::builder()
            .register(GateTask {
                descriptor: plain_descriptor(TaskId::Grayscale),
                entered: entered_tx,
                gate: gate_rx,
            })
            .build();
        let analyzer = Arc::new(analyzer_with(registry, TaskId::Grayscale, Arc::new(NullSink)));
        let releases = Arc::new(AtomicUsize::new(0));

        let first = counted_frame(&releases);
        let worker = {
            let analyzer = analyzer.clone();
            thread::spawn(move || analyzer.on_frame(first))
        };
        entered_rx.recv().unwrap();
        assert!(analyzer.is_busy());

        assert_eq!(analyzer.on_frame(counted_frame(&releases)), FrameOutcome::Dropped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        gate_tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), FrameOutcome::Processed);
        assert_eq!(releases.load(Ordering::SeqCst), 2);
        assert!(!analyzer.is_busy());

        let stats = analyzer.stats();
        assert_eq!(stats.frames_received, 2);
        assert_eq!(stats.frames_processed, 1);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_every_frame_released_once() {
        let registry = TaskRegistry::builder()
            .register(FlakyTask {
                descriptor: plain_descriptor(TaskId::Grayscale),
                calls: AtomicUsize::new(0),
            })
            .build();
        let analyzer = analyzer_with(registry, TaskId::Grayscale, Arc::new(NullSink));
        let releases = Arc::new(AtomicUsize::new(0));

        for i in 0..1000 {
            let frame = if i % 5 == 0 {
                // Missing chroma planes
                let counter = releases.clone();
                RawFrame::new(4, 4, 0, vec![Plane::new(vec![0; 16], 4, 1)]).with_release(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            } else {
                counted_frame(&releases)
            };
            analyzer.on_frame(frame);
        }

        assert_eq!(releases.load(Ordering::SeqCst), 1000);
        let stats = analyzer.stats();
        assert_eq!(stats.frames_received, 1000);
        assert_eq!(stats.frames_processed + stats.frames_failed, 1000);
        assert_eq!(stats.frames_processed, 400);
        assert_eq!(stats.frames_failed, 600);
        assert!(!analyzer.is_busy());
    }

    #[test]
    fn test_overflowing_stride_fails_frame() {
        let analyzer = analyzer_with(
            TaskRegistry::builder().register(GrayscaleTask::new()).build(),
            TaskId::Grayscale,
            Arc::new(NullSink),
        );
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = releases.clone();
        let frame = RawFrame::new(
            2,
            3,
            0,
            vec![
                Plane::new(vec![0; 16], usize::MAX, 1),
                Plane::new(vec![128; 4], 1, 1),
                Plane::new(vec![128; 4], 1, 1),
            ],
        )
        .with_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(analyzer.on_frame(frame), FrameOutcome::Failed);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(
            analyzer.on_frame(counted_frame(&releases)),
            FrameOutcome::Processed
        );
        assert_eq!(analyzer.stats().frames_failed, 1);
    }

    #[test]
    fn test_panicking_task_counts_as_failed() {
        let registry = TaskRegistry::builder()
            .register(PanicOnceTask {
                descriptor: plain_descriptor(TaskId::Grayscale),
                calls: AtomicUsize::new(0),
            })
            .build();
        let analyzer = analyzer_with(registry, TaskId::Grayscale, Arc::new(NullSink));
        let releases = Arc::new(AtomicUsize::new(0));

        assert_eq!(analyzer.on_frame(counted_frame(&releases)), FrameOutcome::Failed);
        assert!(!analyzer.is_busy());
        assert_eq!(
            analyzer.on_frame(counted_frame(&releases)),
            FrameOutcome::Processed
        );
        assert_eq!(releases.load(Ordering::SeqCst), 2);

        let stats = analyzer.stats();
        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.frames_processed, 1);
    }

    #[test]
    fn test_task_switch_never_mixes_parameters() {
        let registry = TaskRegistry::builder()
            .register(OwnKeyTask::new(TaskId::Grayscale, "alpha"))
            .register(OwnKeyTask::new(TaskId::EdgeDetection, "beta"))
            .build();
        let analyzer = Arc::new(analyzer_with(registry, TaskId::Grayscale, Arc::new(NullSink)));

        let switcher = {
            let analyzer = analyzer.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let id = if i % 2 == 0 {
                        TaskId::EdgeDetection
                    } else {
                        TaskId::Grayscale
                    };
                    analyzer.select_task(id).unwrap();
                }
            })
        };

        let releases = Arc::new(AtomicUsize::new(0));
        for _ in 0..500 {
            analyzer.on_frame(counted_frame(&releases));
        }
        switcher.join().unwrap();

        assert_eq!(analyzer.stats().frames_failed, 0);
        assert_eq!(analyzer.stats().frames_processed, 500);
        assert_eq!(analyzer.active_task(), TaskId::Grayscale);
        assert!(analyzer.parameters().get("alpha").is_some());
    }

    #[test]
    fn test_resolution_reported_once_per_epoch() {
        let (sink, events) = ChannelSink::unbounded();
        let analyzer = analyzer_with(
            TaskRegistry::builder().register(GrayscaleTask::new()).build(),
            TaskId::Grayscale,
            Arc::new(sink),
        );
        let releases = Arc::new(AtomicUsize::new(0));
        let resolutions = |events: &Receiver<AnalyzerEvent>| {
            events
                .try_iter()
                .filter(|e| matches!(e, AnalyzerEvent::Resolution(_)))
                .count()
        };

        for _ in 0..3 {
            assert_eq!(analyzer.on_frame(counted_frame(&releases)), FrameOutcome::Processed);
        }
        assert_eq!(resolutions(&events), 1);

        analyzer.select_camera_facing(CameraFacing::Front);
        analyzer.on_frame(counted_frame(&releases));
        analyzer.on_frame(counted_frame(&releases));
        assert_eq!(resolutions(&events), 1);

        analyzer.select_task(TaskId::Grayscale).unwrap();
        analyzer.on_frame(counted_frame(&releases));
        assert_eq!(resolutions(&events), 1);
    }

    #[test]
    fn test_results_reach_sink() {
        let (sink, events) = ChannelSink::unbounded();
        let analyzer = analyzer_with(
            TaskRegistry::builder().register(GrayscaleTask::new()).build(),
            TaskId::Grayscale,
            Arc::new(sink),
        );
        let frame = RawFrame::from_i420(4, 2, &[128u8; 12]).unwrap().with_rotation(90);
        analyzer.on_frame(frame);

        let events: Vec<_> = events.try_iter().collect();
        assert_eq!(events[0], AnalyzerEvent::Resolution(Resolution::new(4, 2)));
        match &events[1] {
            AnalyzerEvent::Result(buffer) => {
                assert_eq!((buffer.width, buffer.height), (2, 4));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_rejected_configuration_leaves_state_unchanged() {
        let analyzer = FrameAnalyzer::new(
            TaskRegistry::builtin(),
            Arc::new(NullSink),
            &AnalyzerConfig::default(),
        )
        .unwrap();
        let before = analyzer.parameters();

        assert!(matches!(
            analyzer.set_parameter("sigma", ParamValue::Float(1.0)),
            Err(Error::UnknownParameter { .. })
        ));
        assert!(matches!(
            analyzer.set_parameter("lowThreshold", ParamValue::Float(-3.0)),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            analyzer.set_parameter("lowThreshold", ParamValue::Bool(true)),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            analyzer.select_task_by_name("sharpen"),
            Err(Error::UnknownTask(_))
        ));
        assert!(analyzer.select_resolution(Resolution::new(0, 0)).is_err());

        assert_eq!(analyzer.parameters(), before);
        assert_eq!(analyzer.active_task(), TaskId::EdgeDetection);
        assert_eq!(analyzer.camera_settings(), CameraSettings::default());
    }

    #[test]
    fn test_set_parameter_and_select_task() {
        let analyzer = FrameAnalyzer::new(
            TaskRegistry::builtin(),
            Arc::new(NullSink),
            &AnalyzerConfig::default(),
        )
        .unwrap();

        analyzer.set_parameter("lowThreshold", ParamValue::Int(10)).unwrap();
        assert_eq!(
            analyzer.parameters().get("lowThreshold"),
            Some(&ParamValue::Float(10.0))
        );

        analyzer.select_task_by_name("grayscale").unwrap();
        assert_eq!(analyzer.active_task(), TaskId::Grayscale);
        assert!(analyzer.parameters().is_empty());

        analyzer.select_task(TaskId::EdgeDetection).unwrap();
        assert_eq!(analyzer.parameters(), analyzer.defaults(TaskId::EdgeDetection).unwrap());
        assert_eq!(analyzer.list_tasks().len(), 2);
    }

    #[test]
    fn test_camera_changes_are_broadcast() {
        let analyzer = FrameAnalyzer::new(
            Arc::new(TaskRegistry::builder().register(EdgeDetectionTask::new()).build()),
            Arc::new(NullSink),
            &AnalyzerConfig::default(),
        )
        .unwrap();
        let changes = analyzer.subscribe_camera_changes();

        analyzer.select_camera_facing(CameraFacing::Front);
        analyzer.select_resolution(Resolution::VGA).unwrap();

        assert_eq!(
            changes.try_recv().unwrap(),
            CameraSettings::default().with_facing(CameraFacing::Front)
        );
        let latest = changes.try_recv().unwrap();
        assert_eq!(latest.resolution, Resolution::VGA);
        assert_eq!(analyzer.camera_settings(), latest);
    }

    #[test]
    fn test_unsupported_resolution_falls_back_to_largest() {
        let mut config = AnalyzerConfig::default().with_resolution(Resolution::new(3840, 2160));
        config.camera.supported = vec![Resolution::FHD_1080P, Resolution::VGA];
        let analyzer =
            FrameAnalyzer::new(TaskRegistry::builtin(), Arc::new(NullSink), &config).unwrap();
        assert_eq!(analyzer.camera_settings().resolution, Resolution::FHD_1080P);
        assert_eq!(
            analyzer.camera_settings().supported,
            vec![Resolution::VGA, Resolution::FHD_1080P]
        );

        let changes = analyzer.subscribe_camera_changes();
        analyzer.select_resolution(Resolution::VGA).unwrap();
        assert_eq!(changes.try_recv().unwrap().resolution, Resolution::VGA);

        analyzer.select_resolution(Resolution::HD_720P).unwrap();
        assert_eq!(changes.try_recv().unwrap().resolution, Resolution::FHD_1080P);

        analyzer.set_supported_resolutions(&[Resolution::VGA, Resolution::HD_720P]);
        let latest = changes.try_recv().unwrap();
        assert_eq!(latest.resolution, Resolution::HD_720P);
        assert_eq!(analyzer.camera_settings(), latest);
    }

    #[test]
    fn test_invalid_initial_config_rejected() {
        let config = AnalyzerConfig::default()
            .with_parameters(ParameterSet::new().with("lowThreshold", ParamValue::Str("x".into())));
        let result = FrameAnalyzer::new(TaskRegistry::builtin(), Arc::new(NullSink), &config);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));

        let registry = Arc::new(TaskRegistry::builder().register(GrayscaleTask::new()).build());
        let result = FrameAnalyzer::new(registry, Arc::new(NullSink), &AnalyzerConfig::default());
        assert!(matches!(result, Err(Error::UnknownTask(_))));
    }
}
