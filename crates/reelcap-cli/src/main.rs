use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use reelcap_lib::api::RenderForm;
use reelcap_lib::core::captions::{
    compile_subtitle_document, group_with_highlights, GroupingOptions, TranscriptWord,
};
use reelcap_lib::core::ffmpeg::{detect_ffmpeg, FFmpegRunner};
use reelcap_lib::core::render::{CaptionRenderer, RenderInput};
use reelcap_lib::core::settings::RenderConfig;
use reelcap_lib::core::VideoInfo;

#[derive(Parser, Debug)]
#[command(name = "reelcap", version)]
struct Cli {
    /// Config file (JSON). Falls back to $REELCAP_CONFIG, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Burn captions and overlays into a video (requires `ffmpeg` and `ffprobe`).
    Render(RenderArgs),
    /// Print a video's geometry and duration as JSON.
    Probe(ProbeArgs),
    /// Compile captions to an ASS document without rendering.
    Subtitles(SubtitlesArgs),
    /// Group a word-level transcript into caption blocks.
    Group(GroupArgs),
}

/// Caption inputs shared by `render` and `subtitles`
#[derive(Parser, Debug)]
struct CaptionInputs {
    /// Caption blocks JSON.
    #[arg(long)]
    captions: PathBuf,

    /// Global style JSON.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Per-block offsets JSON.
    #[arg(long)]
    offsets: Option<PathBuf>,

    /// Per-block style overrides JSON.
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    #[command(flatten)]
    inputs: CaptionInputs,

    /// Image overlays JSON.
    #[arg(long)]
    overlays: Option<PathBuf>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<String>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the auto-save copy to the desktop.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Video to probe.
    video: PathBuf,
}

#[derive(Parser, Debug)]
struct SubtitlesArgs {
    #[command(flatten)]
    inputs: CaptionInputs,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 1920)]
    height: u32,

    /// Write the document here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GroupArgs {
    /// Transcript JSON: an array of `{word, start, end, confidence?}`.
    transcript: PathBuf,

    /// Grouping options JSON.
    #[arg(long)]
    options: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RenderConfig::load(cli.config.as_deref());

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    reelcap_lib::init_logging(Some(&config.log_dir), level);

    match cli.cmd {
        Command::Render(args) => cmd_render(config, args).await,
        Command::Probe(args) => cmd_probe(config, args).await,
        Command::Subtitles(args) => cmd_subtitles(args),
        Command::Group(args) => cmd_group(args),
    }
}

async fn cmd_render(mut config: RenderConfig, args: RenderArgs) -> anyhow::Result<()> {
    if args.no_save {
        config.auto_save = false;
    }

    let mut form = args.inputs.to_form()?;
    form.overlays_json = read_optional(args.overlays.as_deref())?;
    form.fps = args.fps;
    let request = form.decode()?;

    let renderer = CaptionRenderer::from_config(config)?;
    let outcome = renderer
        .render(RenderInput::Path(args.video.clone()), &request)
        .await
        .with_context(|| format!("render {}", args.video.display()))?;

    std::fs::write(&args.out, &outcome.bytes)
        .with_context(|| format!("write {}", args.out.display()))?;

    println!("{}", args.out.display());
    if let Some(saved) = &outcome.saved_path {
        println!("saved: {}", saved.display());
    }
    if !outcome.report.is_clean() {
        eprintln!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }
    Ok(())
}

async fn cmd_probe(config: RenderConfig, args: ProbeArgs) -> anyhow::Result<()> {
    let info = detect_ffmpeg(config.ffmpeg_path.as_deref(), config.ffprobe_path.as_deref())?;
    let runner = FFmpegRunner::new(info).with_timeout(config.engine_timeout());
    let video = runner
        .probe_video(&args.video)
        .await
        .with_context(|| format!("probe {}", args.video.display()))?;

    println!("{}", serde_json::to_string_pretty(&video)?);
    Ok(())
}

fn cmd_subtitles(args: SubtitlesArgs) -> anyhow::Result<()> {
    let request = args.inputs.to_form()?.decode()?;
    let video = VideoInfo::new(args.width, args.height, 0.0);
    let document = compile_subtitle_document(
        &request.captions,
        &request.style,
        &request.offsets,
        &request.overrides,
        &video,
    );

    match &args.out {
        Some(out) => std::fs::write(out, document.to_string())
            .with_context(|| format!("write {}", out.display()))?,
        None => print!("{}", document),
    }
    Ok(())
}

fn cmd_group(args: GroupArgs) -> anyhow::Result<()> {
    let raw = read(&args.transcript)?;
    let words: Vec<TranscriptWord> = serde_json::from_str(&raw)
        .with_context(|| format!("parse transcript {}", args.transcript.display()))?;

    let options: GroupingOptions = match read_optional(args.options.as_deref())? {
        Some(raw) => serde_json::from_str(&raw).context("parse grouping options")?,
        None => GroupingOptions::default(),
    };

    let grouped = group_with_highlights(&words, &options);
    println!("{}", serde_json::to_string_pretty(&grouped)?);
    Ok(())
}

impl CaptionInputs {
    /// Missing style/offset files mean "no style" and "no offsets".
    fn to_form(&self) -> anyhow::Result<RenderForm> {
        Ok(RenderForm {
            captions_json: Some(read(&self.captions)?),
            style_json: Some(read_optional(self.style.as_deref())?.unwrap_or_else(empty_object)),
            offsets_json: Some(
                read_optional(self.offsets.as_deref())?.unwrap_or_else(empty_object),
            ),
            overrides_json: read_optional(self.overrides.as_deref())?,
            ..Default::default()
        })
    }
}

fn empty_object() -> String {
    "{}".to_string()
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(read).transpose()
}
