// SYNOID Reel Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_reel::agent::assembler::{FfmpegAssembler, OutputFormat};
use synoid_reel::agent::asset_resolver::AssetResolver;
use synoid_reel::agent::health;
use synoid_reel::agent::placeholder::PlaceholderPainter;
use synoid_reel::agent::reel_pipeline::{ReelPipeline, RenderOutcome};
use synoid_reel::agent::scene_splitter::build_scenes;
use synoid_reel::agent::validation_gate::ValidationGate;
use synoid_reel::agent::voice::{TtsBackend, TtsEngine};
use synoid_reel::config::ReelConfig;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synoid-reel")]
#[command(about = "Turn a plain-text script into a narrated slideshow video", long_about = None)]
struct Cli {
    /// Narration engine
    #[arg(long, global = true, value_enum)]
    tts: Option<TtsBackend>,

    /// Voice name understood by the narration engine
    #[arg(long, global = true)]
    voice: Option<String>,

    /// TrueType font for placeholder captions
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one script to an MP4
    Render {
        /// Script file ("-" or omitted reads stdin)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Topic keywords used when a scene is too generic to search for
        #[arg(short, long)]
        keywords: Option<String>,

        /// Path to output video file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Paste scripts one after another and render each
    Interactive {
        /// Topic keywords used when a scene is too generic to search for
        #[arg(short, long)]
        keywords: Option<String>,

        /// Path to output video file (later runs get a numbered suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how a script is split into scenes, as JSON
    Scenes {
        /// Script file ("-" or omitted reads stdin)
        #[arg(short, long)]
        script: Option<PathBuf>,

        #[arg(short, long)]
        keywords: Option<String>,
    },

    /// Render a single placeholder image
    Placeholder {
        #[arg(short, long)]
        text: String,

        #[arg(short, long, default_value = "placeholder.png")]
        output: PathBuf,
    },

    /// Check that ffmpeg, ffprobe and the narration engine are installed
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,symphonia=error,reqwest=warn,hyper=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Global panic handler: log panics instead of crashing silently
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[SYNOID REEL PANIC] at {}: {}", location, message);
    }));

    let args = Cli::parse();

    let mut config = ReelConfig::from_env();
    if let Some(tts) = args.tts {
        config.tts = tts;
    }
    if args.voice.is_some() {
        config.voice = args.voice;
    }
    if args.font.is_some() {
        config.font_path = args.font;
    }

    info!("--- SYNOID REEL v{} ---", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Render {
            script,
            keywords,
            output,
        } => {
            warn_missing_dependencies(config.tts).await;
            let script = read_script(script.as_deref()).await?;
            let output = output.unwrap_or_else(|| config.output.clone());
            let pipeline = build_pipeline(&config);
            run_once(&pipeline, &script, keywords.as_deref(), &output).await?;
        }
        Commands::Interactive { keywords, output } => {
            warn_missing_dependencies(config.tts).await;
            let base_output = output.unwrap_or_else(|| config.output.clone());
            let pipeline = build_pipeline(&config);
            interactive_session(&pipeline, keywords.as_deref(), &base_output).await?;
        }
        Commands::Scenes { script, keywords } => {
            let script = read_script(script.as_deref()).await?;
            let scenes = build_scenes(&script, keywords.as_deref());
            println!("{}", serde_json::to_string_pretty(&scenes)?);
        }
        Commands::Placeholder { text, output } => {
            let format = OutputFormat::default();
            let painter =
                PlaceholderPainter::new(format.width, format.height, config.font_path.as_deref());
            painter.render_to(&text, &output)?;
            println!("Placeholder saved: {:?}", output);
        }
        Commands::Doctor => {
            let missing = health::check_dependencies(config.tts).await;
            for tool in health::required_tools(config.tts) {
                let ok = !missing.contains(&tool);
                println!(
                    "{} {:<10} ({})",
                    if ok { "[ok]     " } else { "[missing]" },
                    tool.program,
                    tool.purpose
                );
            }
            println!(
                "Image search: {}",
                if config.search.has_credential() {
                    "stock photos"
                } else {
                    "placeholders only (PEXELS_API_KEY not set)"
                }
            );
            if !missing.is_empty() {
                anyhow::bail!("{} required tool(s) missing", missing.len());
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: &ReelConfig) -> ReelPipeline<TtsEngine, FfmpegAssembler> {
    let format = OutputFormat::default();
    let painter = PlaceholderPainter::new(format.width, format.height, config.font_path.as_deref());
    let resolver = AssetResolver::new(config.search.clone(), painter);
    let narrator = TtsEngine::new(config.tts, config.voice.as_deref());

    ReelPipeline::new(narrator, resolver, FfmpegAssembler::new(format))
        .with_progress(Arc::new(|message: &str| println!("  {}", message)))
}

async fn run_once(
    pipeline: &ReelPipeline<TtsEngine, FfmpegAssembler>,
    script: &str,
    keywords: Option<&str>,
    output: &Path,
) -> Result<()> {
    match pipeline.render(script, keywords, output).await {
        Ok(RenderOutcome::NothingToRender) => {
            println!("Nothing to generate: the script is empty.");
            Ok(())
        }
        Ok(RenderOutcome::Rendered(report)) => {
            println!(
                "Video saved: {:?} ({} scenes, {:.1}s, {} placeholder image(s))",
                report.output,
                report.scenes.len(),
                report.total_duration(),
                report.placeholder_count()
            );
            match ValidationGate::probe(&report.output).await {
                Ok(probe) => info!(
                    "[VALIDATION] {}x{} @ {:.2} fps, {:.2}s",
                    probe.width, probe.height, probe.fps, probe.duration_secs
                ),
                Err(e) => warn!("[VALIDATION] Could not probe output: {:#}", e),
            }
            if !ValidationGate::verify(&report.output).await {
                warn!("[VALIDATION] {:?} did not decode cleanly", report.output);
            }
            Ok(())
        }
        Err(e) => {
            error!("Generation failed: {:#}", e);
            Err(e)
        }
    }
}

async fn interactive_session(
    pipeline: &ReelPipeline<TtsEngine, FfmpegAssembler>,
    keywords: Option<&str>,
    base_output: &Path,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut run = 0usize;

    loop {
        println!();
        println!("Paste your script. Separate scenes with a blank line.");
        println!("Finish with a line containing only '.', or type 'quit'.");

        let mut script = String::new();
        let mut reached_eof = false;
        loop {
            match lines.next_line().await? {
                Some(line) if line.trim() == "." => break,
                Some(line) if script.is_empty() && line.trim() == "quit" => return Ok(()),
                Some(line) => {
                    script.push_str(&line);
                    script.push('\n');
                }
                None => {
                    reached_eof = true;
                    break;
                }
            }
        }

        if !script.trim().is_empty() || !reached_eof {
            run += 1;
            let output = numbered_output(base_output, run);
            // Errors end this run only; the session keeps going.
            let _ = run_once(pipeline, &script, keywords, &output).await;
        }

        if reached_eof {
            return Ok(());
        }
    }
}

/// `reel.mp4` for the first run, `reel_2.mp4`, `reel_3.mp4`... after that.
fn numbered_output(base: &Path, run: usize) -> PathBuf {
    if run <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "synoid_reel_output".to_string());
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    base.with_file_name(format!("{}_{}.{}", stem, run, ext))
}

async fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("Cannot read script {:?}", p)),
        _ => {
            let mut script = String::new();
            tokio::io::stdin()
                .read_to_string(&mut script)
                .await
                .context("Cannot read script from stdin")?;
            Ok(script)
        }
    }
}

async fn warn_missing_dependencies(backend: TtsBackend) {
    let missing = health::check_dependencies(backend).await;
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|t| t.program).collect();
        warn!(
            "Missing dependencies: {:?}. Rendering will fail until they are installed.",
            names
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_output() {
        let base = Path::new("out/reel.mp4");
        assert_eq!(numbered_output(base, 1), PathBuf::from("out/reel.mp4"));
        assert_eq!(numbered_output(base, 3), PathBuf::from("out/reel_3.mp4"));
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "synoid-reel",
            "render",
            "--script",
            "story.txt",
            "--keywords",
            "space",
            "--tts",
            "espeak",
        ])
        .unwrap();
        assert_eq!(cli.tts, Some(TtsBackend::Espeak));
        match cli.command {
            Commands::Render { script, keywords, .. } => {
                assert_eq!(script, Some(PathBuf::from("story.txt")));
                assert_eq!(keywords.as_deref(), Some("space"));
            }
            _ => panic!("expected render"),
        }
    }
}
