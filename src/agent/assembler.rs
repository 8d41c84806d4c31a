// SYNOID Reel Assembler - Still Image + Narration Segments
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Each scene becomes one MP4 segment: the picture held for exactly the
// narration length, letterboxed to the output frame. The segments are then
// stitched in scene order.

use crate::agent::asset_resolver::AssetSource;
use crate::agent::video_stitcher::VideoStitcher;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

/// Frame geometry and rate of the final video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
        }
    }
}

/// Everything needed to render one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub image: PathBuf,
    pub image_source: AssetSource,
    pub audio: PathBuf,
    /// On-screen time, equal to the narration length
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    Libx264,
    Mpeg4,
}

impl VideoCodec {
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::Libx264 => "libx264",
            Self::Mpeg4 => "mpeg4",
        }
    }
}

/// Turns ordered segments into the final video file.
#[allow(async_fn_in_trait)]
pub trait Assembler {
    fn format(&self) -> OutputFormat;

    /// Scratch files go to `work_dir`; `output` is only written once the whole
    /// video exists.
    async fn assemble(&self, segments: &[Segment], work_dir: &Path, output: &Path)
        -> Result<PathBuf>;
}

#[derive(Debug, Default)]
pub struct FfmpegAssembler {
    format: OutputFormat,
}

impl FfmpegAssembler {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// FFmpeg arguments that render one segment.
    pub fn segment_args(&self, segment: &Segment, codec: VideoCodec, output: &Path) -> Vec<String> {
        let OutputFormat { width, height, fps } = self.format;
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,format=yuv420p",
            w = width,
            h = height
        );

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-nostdin".into(),
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            fps.to_string(),
            "-i".into(),
            segment.image.to_string_lossy().into_owned(),
            "-i".into(),
            segment.audio.to_string_lossy().into_owned(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-t".into(),
            format!("{:.3}", segment.duration_secs),
            "-vf".into(),
            filter,
            "-r".into(),
            fps.to_string(),
            "-c:v".into(),
            codec.encoder_name().into(),
        ];
        if codec == VideoCodec::Libx264 {
            args.extend(["-tune", "stillimage", "-preset", "medium"].map(String::from));
        }
        args.extend(
            [
                "-pix_fmt", "yuv420p", "-c:a", "aac", "-b:a", "192k", "-ar", "44100", "-ac", "2",
            ]
            .map(String::from),
        );
        args.push(output.to_string_lossy().into_owned());
        args
    }

    async fn render_segments(
        &self,
        segments: &[Segment],
        work_dir: &Path,
        codec: VideoCodec,
    ) -> Result<Vec<PathBuf>> {
        let mut rendered = Vec::with_capacity(segments.len());
        for segment in segments {
            let out = work_dir.join(format!("segment_{:03}.mp4", segment.index));
            info!(
                "[ASSEMBLER] Segment {}/{} ({:.2}s, {})",
                segment.index + 1,
                segments.len(),
                segment.duration_secs,
                codec.encoder_name()
            );
            run_ffmpeg(&self.segment_args(segment, codec, &out))
                .await
                .with_context(|| format!("Rendering segment {}", segment.index + 1))?;
            rendered.push(out);
        }
        Ok(rendered)
    }
}

impl Assembler for FfmpegAssembler {
    fn format(&self) -> OutputFormat {
        self.format
    }

    async fn assemble(
        &self,
        segments: &[Segment],
        work_dir: &Path,
        output: &Path,
    ) -> Result<PathBuf> {
        if segments.is_empty() {
            anyhow::bail!("Nothing to assemble");
        }

        // Mixed codecs cannot be stream-copied together, so a fallback
        // re-renders every segment.
        let rendered = match self
            .render_segments(segments, work_dir, VideoCodec::Libx264)
            .await
        {
            Ok(paths) => paths,
            Err(e) => {
                warn!("[ASSEMBLER] libx264 failed ({:#}), retrying with mpeg4", e);
                self.render_segments(segments, work_dir, VideoCodec::Mpeg4)
                    .await?
            }
        };

        let stitched = work_dir.join("reel.mp4");
        VideoStitcher::finalize(&rendered, &stitched).await?;
        move_into_place(&stitched, output).await?;

        info!("[ASSEMBLER] Video ready: {:?}", output);
        Ok(output.to_path_buf())
    }
}

/// Run ffmpeg to completion, turning a non-zero exit into an error carrying
/// the tail of stderr.
pub(crate) async fn run_ffmpeg(args: &[String]) -> Result<()> {
    let output = Command::new("ffmpeg")
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .context("Failed to execute ffmpeg")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        anyhow::bail!(
            "ffmpeg exited with {}: {}",
            output.status,
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        );
    }
    Ok(())
}

async fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Cannot create {:?}", parent))?;
    }
    if tokio::fs::rename(from, to).await.is_err() {
        // Different filesystem: copy instead.
        tokio::fs::copy(from, to)
            .await
            .with_context(|| format!("Cannot write {:?}", to))?;
        let _ = tokio::fs::remove_file(from).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(duration_secs: f64) -> Segment {
        Segment {
            index: 0,
            image: PathBuf::from("/work/scene_000.jpeg"),
            image_source: AssetSource::External,
            audio: PathBuf::from("/work/scene_000.mp3"),
            duration_secs,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_default_format_is_720p24() {
        let format = OutputFormat::default();
        assert_eq!((format.width, format.height, format.fps), (1280, 720, 24));
    }

    #[test]
    fn test_segment_duration_and_rate() {
        let assembler = FfmpegAssembler::default();
        let args = assembler.segment_args(&segment(3.25), VideoCodec::Libx264, Path::new("out.mp4"));
        assert_eq!(value_after(&args, "-t"), Some("3.250"));
        assert_eq!(value_after(&args, "-r"), Some("24"));
        assert_eq!(value_after(&args, "-framerate"), Some("24"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_segment_is_letterboxed_to_frame() {
        let assembler = FfmpegAssembler::default();
        let args = assembler.segment_args(&segment(1.0), VideoCodec::Libx264, Path::new("o.mp4"));
        let filter = value_after(&args, "-vf").unwrap();
        assert!(filter.contains("scale=1280:720:force_original_aspect_ratio=decrease"));
        assert!(filter.contains("pad=1280:720"));
    }

    #[test]
    fn test_mpeg4_fallback_drops_x264_options() {
        let assembler = FfmpegAssembler::new(OutputFormat {
            width: 640,
            height: 360,
            fps: 30,
        });
        let args = assembler.segment_args(&segment(2.0), VideoCodec::Mpeg4, Path::new("o.mp4"));
        assert_eq!(value_after(&args, "-c:v"), Some("mpeg4"));
        assert!(!args.iter().any(|a| a == "-tune"));
        assert_eq!(value_after(&args, "-r"), Some("30"));
    }

    #[tokio::test]
    async fn test_assemble_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegAssembler::default()
            .assemble(&[], dir.path(), &dir.path().join("out.mp4"))
            .await;
        assert!(result.is_err());
        assert!(!dir.path().join("out.mp4").exists());
    }
}
