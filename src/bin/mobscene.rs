use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mobscene", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tick a scene headlessly and print a JSON summary of every frame.
    Run(RunArgs),
    /// Evaluate animation tracks at one point in time and print the snapshots as JSON.
    Eval(EvalArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input scene document JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Runtime options JSON. Relative script paths resolve against the scene's directory when
    /// the config does not set `script_root`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of update/draw pairs to run.
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Frames per second; `dt` is `1 / fps`.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// JSON array of animation tracks.
    #[arg(long)]
    tracks: PathBuf,

    /// Absolute time in seconds.
    #[arg(long)]
    time: f64,
}

#[derive(serde::Serialize)]
struct FrameSummary {
    frame: u64,
    time: f64,
    draw_calls: usize,
}

#[derive(serde::Serialize)]
struct RunSummary {
    frames: Vec<FrameSummary>,
    scene: mobscene::scene::document::SceneDocument,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Eval(args) => cmd_eval(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("--fps must be finite and positive");
    }

    let mut opts = match &args.config {
        Some(path) => mobscene::SceneOpts::from_path(path)?,
        None => mobscene::SceneOpts::default(),
    };
    if opts.script_root.is_none() {
        opts.script_root = args.scene.parent().map(Path::to_path_buf);
    }

    let doc: mobscene::scene::document::SceneDocument = read_json(&args.scene, "scene")?;
    let mut scene = mobscene::Scene::new(opts)?;
    scene.deserialize(&doc)?;

    let dt = 1.0 / args.fps;
    let mut frames = Vec::new();
    for frame in 0..args.frames {
        let time = frame as f64 * dt;
        scene.update(dt, time);
        let mut canvas = mobscene::RecordingCanvas::new();
        scene.draw(&mut canvas, time);
        frames.push(FrameSummary {
            frame,
            time,
            draw_calls: canvas.calls().len(),
        });
    }

    let summary = RunSummary {
        frames,
        scene: scene.serialize(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let tracks: Vec<mobscene::AnimationTrack> = read_json(&args.tracks, "tracks")?;
    let snapshots = mobscene::Evaluator::eval(&tracks, args.time)?;
    println!("{}", serde_json::to_string_pretty(&snapshots)?);
    Ok(())
}
