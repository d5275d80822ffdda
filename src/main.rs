//! framesight CLI
//!
//! Command-line interface for exercising the analysis pipeline with a
//! synthetic camera.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use framesight::{
    output::write_png, AnalyzerConfig, AnalyzerEvent, CameraFacing, ChannelSink, FrameAnalyzer,
    FrameSource, NullSink, PixelBuffer, Pipeline, Resolution, Stats, SyntheticSource, TaskId,
    TaskRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Events buffered between CLI drains; older results are discarded beyond this
const EVENT_BACKLOG: usize = 64;

/// Camera lens for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Facing {
    Front,
    Back,
}

impl From<Facing> for CameraFacing {
    fn from(f: Facing) -> Self {
        match f {
            Facing::Front => CameraFacing::Front,
            Facing::Back => CameraFacing::Back,
        }
    }
}

#[derive(Parser)]
#[command(name = "framesight")]
#[command(about = "Live camera frame analysis - convert, process, measure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available processing tasks and their parameters
    Tasks {
        /// Print the catalogue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze frames from the synthetic camera
    Run {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Task identifier (grayscale, edge_detection)
        #[arg(short, long)]
        task: Option<String>,

        /// Parameter override, repeatable (e.g. lowThreshold=30)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Frame width
        #[arg(long)]
        width: Option<u32>,

        /// Frame height
        #[arg(long)]
        height: Option<u32>,

        /// Frames per second offered by the camera
        #[arg(short, long, default_value = "30")]
        fps: u32,

        /// Sensor rotation in degrees (multiple of 90)
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,

        /// Camera lens
        #[arg(long, value_enum)]
        facing: Option<Facing>,

        /// Resolutions the camera offers (e.g. 640x480,1280x720)
        #[arg(long, value_delimiter = ',')]
        supported: Vec<Resolution>,

        /// Stop after this many frames (runs until Ctrl+C otherwise)
        #[arg(short = 'n', long)]
        frames: Option<u64>,

        /// Write the last processed frame to this PNG file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Measure synchronous analysis throughput
    Bench {
        /// Task identifier
        #[arg(short, long, default_value = "edge_detection")]
        task: String,

        /// Number of frames to analyze
        #[arg(short = 'n', long, default_value = "120")]
        frames: u32,

        /// Frame width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "720")]
        height: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framesight=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tasks { json } => cmd_tasks(json),
        Commands::Run {
            config,
            task,
            set,
            width,
            height,
            fps,
            rotation,
            facing,
            supported,
            frames,
            snapshot,
        } => {
            let config = build_config(config, task, set, width, height, facing, supported)?;
            cmd_run(config, fps, rotation, frames, snapshot).await
        }
        Commands::Bench {
            task,
            frames,
            width,
            height,
        } => cmd_bench(task, frames, width, height),
    }
}

fn cmd_tasks(json: bool) -> anyhow::Result<()> {
    let tasks = TaskRegistry::builtin().list_tasks();

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    println!("Available Tasks");
    println!("===============\n");

    for task in tasks {
        let default = if task.id == TaskId::default() {
            " (default)"
        } else {
            ""
        };
        println!("  {:<16} {}{} - {}", task.id.as_str(), task.name, default, task.description);
        for param in &task.parameters {
            let range = param
                .range
                .map(|r| format!(" [{}..{}]", r.min, r.max))
                .unwrap_or_default();
            println!(
                "      {:<14} {:?}, default {}{}",
                param.key, param.kind, param.default, range
            );
        }
    }

    println!("\nUsage: framesight run --task <id> --set <key>=<value>");

    Ok(())
}

/// Merge the configuration file with command-line overrides
fn build_config(
    path: Option<PathBuf>,
    task: Option<String>,
    set: Vec<String>,
    width: Option<u32>,
    height: Option<u32>,
    facing: Option<Facing>,
    supported: Vec<Resolution>,
) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match path {
        Some(path) => AnalyzerConfig::from_file(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    if let Some(task) = task {
        config = config.with_task(task.parse()?);
    }

    if width.is_some() || height.is_some() {
        let current = config.camera.resolution;
        config = config.with_resolution(Resolution::new(
            width.unwrap_or(current.width),
            height.unwrap_or(current.height),
        ));
    }

    if let Some(facing) = facing {
        config = config.with_facing(facing.into());
    }

    if !supported.is_empty() {
        config.camera = config.camera.with_supported(supported);
    }

    let registry = TaskRegistry::builtin();
    let descriptor = registry.get(config.analysis.task)?.descriptor().clone();
    for assignment in set {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
        let param = descriptor.parameter(key.trim()).ok_or_else(|| {
            framesight::Error::UnknownParameter {
                task: descriptor.id.to_string(),
                key: key.trim().to_string(),
            }
        })?;
        let value = param.parse(value)?;
        config.analysis.parameters.insert(param.key, value);
    }

    config.validate(&registry)?;
    Ok(config)
}

async fn cmd_run(
    config: AnalyzerConfig,
    fps: u32,
    rotation: i32,
    frames: Option<u64>,
    snapshot: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0, "--fps must be at least 1");

    let (sink, events) = ChannelSink::bounded(EVENT_BACKLOG);
    let pipeline = Pipeline::from_config(&config, Arc::new(sink))?;
    let camera = pipeline.analyzer().camera_settings();
    let mut source = SyntheticSource::new(camera.resolution)?.with_rotation(rotation);

    println!("Configuration:");
    println!("  Task: {}", config.analysis.task);
    for (key, value) in pipeline.analyzer().parameters().iter() {
        println!("    {} = {}", key, value);
    }
    println!("  Camera: {}", camera.facing);
    if camera.resolution != config.camera.resolution {
        println!(
            "  Resolution: {} (requested {})",
            camera.resolution, config.camera.resolution
        );
    } else {
        println!("  Resolution: {}", camera.resolution);
    }
    println!("  Rotation: {}", rotation);
    println!("  FPS: {}", fps);
    println!();

    pipeline.start()?;
    println!("Analysis started. Press Ctrl+C to stop.\n");

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut last_result = None;
    let mut produced = 0u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                pipeline.offer(source.next_frame()?);
                produced += 1;
                drain_events(&events, &mut last_result);
                if frames.is_some_and(|n| produced >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                break;
            }
        }
    }

    pipeline.stop()?;
    drain_events(&events, &mut last_result);

    if let Some(path) = snapshot {
        match &last_result {
            Some(buffer) => {
                write_png(buffer, &path)?;
                println!("Snapshot written to {}", path.display());
            }
            None => eprintln!("No processed frame available for snapshot"),
        }
    }

    print_stats(&pipeline.stats(), source.outstanding());
    Ok(())
}

fn drain_events(
    events: &crossbeam_channel::Receiver<AnalyzerEvent>,
    last_result: &mut Option<PixelBuffer>,
) {
    for event in events.try_iter() {
        match event {
            AnalyzerEvent::Result(buffer) => *last_result = Some(buffer),
            AnalyzerEvent::Fps(fps) => tracing::info!(fps, "FPS"),
            AnalyzerEvent::Resolution(resolution) => {
                tracing::info!(%resolution, "Resolution")
            }
        }
    }
}

fn print_stats(stats: &Stats, outstanding: u64) {
    println!("\nStatistics:");
    println!("  Frames received: {}", stats.frames_received);
    println!("  Frames processed: {}", stats.frames_processed);
    println!("  Frames dropped: {}", stats.frames_dropped);
    println!("  Frames failed: {}", stats.frames_failed);
    println!("  FPS samples: {}", stats.fps_samples);
    println!("  Last FPS: {}", stats.last_fps);
    println!("  Frames not released: {}", outstanding);
    if outstanding > 0 {
        tracing::warn!(outstanding, "Frames were never released");
    }
}

fn cmd_bench(task: String, frames: u32, width: u32, height: u32) -> anyhow::Result<()> {
    println!("framesight Analysis Benchmark");
    println!("=============================\n");

    let task: TaskId = task.parse()?;
    let resolution = Resolution::new(width, height);
    let config = AnalyzerConfig::default()
        .with_task(task)
        .with_resolution(resolution);

    println!("Task: {}", task);
    println!("Frames: {}", frames);
    println!("Resolution: {}", resolution);
    println!();

    let analyzer = FrameAnalyzer::new(TaskRegistry::builtin(), Arc::new(NullSink), &config)?;
    let mut source = SyntheticSource::new(resolution)?;

    println!("Running benchmark...\n");
    let start = Instant::now();
    for _ in 0..frames {
        analyzer.on_frame(source.next_frame()?);
    }
    let elapsed = start.elapsed();

    let fps = frames as f64 / elapsed.as_secs_f64();
    let ms_per_frame = elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64;

    println!("Results:");
    println!("  Total time: {:.2}s", elapsed.as_secs_f64());
    println!("  Analysis FPS: {:.1}", fps);
    println!("  ms/frame: {:.2}", ms_per_frame);
    println!(
        "  Realtime capable (30fps): {}",
        if fps >= 30.0 { "Yes" } else { "No" }
    );

    print_stats(&analyzer.stats(), source.outstanding());
    Ok(())
}
