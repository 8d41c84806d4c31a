// SYNOID Reel Video Stitcher
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Joins the per-scene segments with FFmpeg's concat demuxer (`-f concat`).
// Every segment is encoded with identical settings, so `-c copy` is enough
// and the join costs no quality.

use crate::agent::assembler::run_ffmpeg;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub struct VideoStitcher;

impl VideoStitcher {
    /// Build the contents of an FFmpeg concat manifest.
    ///
    /// Each line is `file '<path>'`, with single quotes escaped the way the
    /// concat demuxer expects.
    pub fn create_concat_manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the manifest next to the output and let FFmpeg join the segments.
    pub async fn finalize(segments: &[PathBuf], output_path: &Path) -> Result<PathBuf> {
        if segments.is_empty() {
            anyhow::bail!("No segments to stitch.");
        }

        let manifest_path = output_path.with_extension("concat_manifest.txt");
        let manifest_content = Self::create_concat_manifest(segments);
        tokio::fs::write(&manifest_path, &manifest_content)
            .await
            .with_context(|| format!("Cannot write manifest {:?}", manifest_path))?;

        info!(
            "[STITCHER] Manifest written ({} segments): {:?}",
            segments.len(),
            manifest_path
        );

        let args = vec![
            "-y".to_string(),
            "-nostdin".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            manifest_path.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output_path.to_string_lossy().into_owned(),
        ];
        let result = run_ffmpeg(&args).await;

        let _ = tokio::fs::remove_file(&manifest_path).await;

        match result {
            Ok(()) => {
                info!("[STITCHER] Final output: {:?}", output_path);
                Ok(output_path.to_path_buf())
            }
            Err(e) => {
                error!("[STITCHER] FFmpeg concat failed.");
                Err(e.context("FFmpeg concat demuxer failed"))
            }
        }
    }
}
