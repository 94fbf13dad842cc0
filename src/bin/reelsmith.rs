use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a script to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the per-line plan as JSON without synthesizing anything.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Script JSON. The built-in three-line script is used when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Pipeline config JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run seed (overrides the config).
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Folder of local footage searched by keyword.
    #[arg(long)]
    library: Option<PathBuf>,

    /// Folder holding the sound effect files.
    #[arg(long)]
    sfx_dir: Option<PathBuf>,

    /// Folder of background music tracks.
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// Speech program to run per chunk.
    #[arg(long)]
    tts_program: Option<String>,

    /// Speech program argument; repeat for each. Replaces the configured template.
    #[arg(long = "tts-arg", allow_hyphen_values = true)]
    tts_args: Vec<String>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    report: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_inputs(
    common: &CommonArgs,
) -> anyhow::Result<(reelsmith::PipelineConfig, reelsmith::Script)> {
    let mut config = match &common.config {
        Some(path) => reelsmith::PipelineConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => reelsmith::PipelineConfig::default(),
    };
    if let Some(seed) = common.seed {
        config.seed = seed;
    }
    let script = match &common.script {
        Some(path) => reelsmith::Script::from_path(path)
            .with_context(|| format!("load script '{}'", path.display()))?,
        None => {
            tracing::info!("no script given; using the built-in script");
            reelsmith::Script::fallback()
        }
    };
    Ok((config, script))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut config, script) = load_inputs(&args.common)?;
    if args.library.is_some() {
        config.library = args.library;
    }
    if args.sfx_dir.is_some() {
        config.sfx.dir = args.sfx_dir;
    }
    if args.music_dir.is_some() {
        config.timeline.music_dir = args.music_dir;
    }
    if let Some(program) = args.tts_program {
        config.speech.program = program;
    }
    if !args.tts_args.is_empty() {
        config.speech.args = args.tts_args;
    }
    config.validate().context("invalid configuration")?;

    let pipeline = reelsmith::Pipeline::from_config(config)?;
    let report = pipeline
        .render_to_file(&script, &args.out)
        .with_context(|| format!("render '{}'", args.out.display()))?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    eprintln!(
        "wrote {} ({} scenes, {} skipped, {:.2}s)",
        args.out.display(),
        report.scenes,
        report.skipped,
        report.duration_secs
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (config, script) = load_inputs(&args.common)?;
    let pipeline = reelsmith::Pipeline::from_config(config)?;
    let plans = pipeline.inspect(&script);
    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}
