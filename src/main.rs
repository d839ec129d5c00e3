use std::fs;

use clap::{Args, Parser, Subcommand};
use playfield::config::{ConfigError, EngineConfig};
use playfield::engine::{Action, EngineCore, EngineError};
use playfield::input::Mode;
use playfield::object::SceneObject;
use playfield::render::{HeadlessPainter, RenderError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("invalid atlas size {0:?}; expected WIDTHxHEIGHT")]
    AtlasSize(String),
    #[error("document uses atlas {0}; pass --atlas-size")]
    NeedsAtlas(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "playfield", about = "Check and run playfield documents headless")]
struct Cli {
    /// Pixel size of the document's atlas image, as WIDTHxHEIGHT.
    #[arg(long, env = "PLAYFIELD_ATLAS_SIZE", global = true)]
    atlas_size: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document and report whether it hydrates.
    Check(CheckArgs),
    /// Run a document for a number of frames and print object geometry.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    path: String,
}

#[derive(Args, Debug)]
struct RunArgs {
    path: String,

    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Simulated time between frames.
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f64,
}

#[derive(Debug, Serialize)]
struct ObjectReport {
    #[serde(rename = "$type")]
    classname: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl From<&SceneObject> for ObjectReport {
    fn from(object: &SceneObject) -> Self {
        Self {
            classname: object.classname().as_str(),
            id: object.id.clone(),
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
        }
    }
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let atlas_size = cli.atlas_size.as_deref().map(parse_atlas_size).transpose()?;

    match cli.command {
        Command::Check(args) => run_check(&args, atlas_size),
        Command::Run(args) => run_frames(&args, atlas_size),
    }
}

fn parse_atlas_size(raw: &str) -> Result<(u32, u32), CliError> {
    let invalid = || CliError::AtlasSize(raw.to_owned());
    let (width, height) = raw.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

/// Build an engine holding the document at `path`, resolving its atlas with
/// the given image size.
fn load_engine(path: &str, atlas_size: Option<(u32, u32)>) -> Result<EngineCore, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
    let mut core = EngineCore::new(EngineConfig::from_env()?);

    for action in core.load_document_text(&text)? {
        if let Action::LoadAtlas { url, ticket, .. } = action {
            let (width, height) = atlas_size.ok_or_else(|| CliError::NeedsAtlas(url.clone()))?;
            core.atlas_loaded(ticket, &url, width, height)?;
        }
    }
    Ok(core)
}

fn run_check(args: &CheckArgs, atlas_size: Option<(u32, u32)>) -> Result<(), CliError> {
    let core = load_engine(&args.path, atlas_size)?;
    let objects = core.scene().borrow().len();
    tracing::info!(path = %args.path, objects, "document ok");
    println!("ok: {objects} objects");
    Ok(())
}

fn run_frames(args: &RunArgs, atlas_size: Option<(u32, u32)>) -> Result<(), CliError> {
    let mut core = load_engine(&args.path, atlas_size)?;
    let mut painter = HeadlessPainter::default();

    core.set_mode(Mode::Running);
    for frame in 0..args.frames {
        core.tick(f64::from(frame) * args.frame_ms, &mut painter)?;
    }
    tracing::info!(path = %args.path, frames = args.frames, "run finished");

    let report: Vec<ObjectReport> = core.scene().borrow().iter().map(ObjectReport::from).collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
