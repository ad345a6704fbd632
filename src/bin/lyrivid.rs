use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lyrivid::{JobEvent, RenderConfig, RenderRequest, RenderService};

#[derive(Parser, Debug)]
#[command(name = "lyrivid", version)]
struct Cli {
    /// Render config JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a lyric video (requires `ffmpeg` and `ffprobe`).
    Render(RenderArgs),
    /// Rasterize a single verse as a PNG.
    Frame(FrameArgs),
    /// Split plain lyrics into verse JSON.
    Split(SplitArgs),
    /// List rendered videos.
    Exports(ExportsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Render request JSON.
    #[arg(long)]
    request: PathBuf,

    /// Override the asset root.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Override the output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Render request JSON.
    #[arg(long)]
    request: PathBuf,

    /// Verse index (0-based, request order).
    #[arg(long, default_value_t = 0)]
    verse: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// Plain-text lyrics; `-` reads stdin.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportsArgs {
    /// Directory to list. Defaults to the configured output directory.
    #[arg(long)]
    dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(config, args),
        Command::Frame(args) => cmd_frame(config, args),
        Command::Split(args) => cmd_split(args),
        Command::Exports(args) => cmd_exports(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    match path {
        Some(p) => Ok(RenderConfig::from_path(p)?),
        None => Ok(RenderConfig::default()),
    }
}

fn cmd_render(mut config: RenderConfig, args: RenderArgs) -> anyhow::Result<()> {
    if let Some(root) = args.assets {
        config.assets_root = root;
    }
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }
    let request = RenderRequest::from_path(&args.request)?;
    let service = RenderService::new(config)?;
    let handle = service.submit(request)?;
    let events = handle.events();

    for event in events {
        match event {
            JobEvent::Progress { percent } => {
                tracing::info!(job = %handle.id(), percent, status = %handle.status(), "progress");
            }
            JobEvent::Completed { output } => {
                eprintln!("wrote {}", output.display());
                return Ok(());
            }
            JobEvent::Failed(failure) => {
                anyhow::bail!("render failed ({:?}): {}", failure.kind, failure.message);
            }
        }
    }
    // The channel closes only after a terminal event.
    let output = handle.wait().map_err(anyhow::Error::new)?;
    eprintln!("wrote {}", output.display());
    Ok(())
}

fn cmd_frame(config: RenderConfig, args: FrameArgs) -> anyhow::Result<()> {
    let request = RenderRequest::from_path(&args.request)?;
    let verse = request.verses.get(args.verse).with_context(|| {
        format!(
            "verse index {} out of range ({} verses)",
            args.verse,
            request.verses.len()
        )
    })?;
    verse.validate(args.verse)?;

    let fonts = lyrivid::FontBook::load(&config.fonts);
    let rasterizer = lyrivid::TextRasterizer::new(config.canvas, fonts);
    let fill = match request.background() {
        Some(_) => None,
        None => Some(request.background_color),
    };
    let frame = rasterizer.rasterize_verse(args.verse, verse, fill)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_split(args: SplitArgs) -> anyhow::Result<()> {
    let text = if args.in_path.as_os_str() == "-" {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("read lyrics from stdin")?;
        s
    } else {
        std::fs::read_to_string(&args.in_path)
            .with_context(|| format!("read lyrics '{}'", args.in_path.display()))?
    };
    let verses = lyrivid::split_lyrics(&text);
    println!("{}", serde_json::to_string_pretty(&verses)?);
    Ok(())
}

fn cmd_exports(config: RenderConfig, args: ExportsArgs) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or(config.output_dir);
    let entries = lyrivid::list_exports(&dir)?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
