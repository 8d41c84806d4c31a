// SYNOID Reel Validation Gate
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Post-render checks on the finished reel: `ffprobe` for geometry, rate and
// length, and a "null decode" pass where FFmpeg decodes every packet and
// writes nothing. Corruption surfaces as text on stderr.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{error, info};

/// What ffprobe reports about the first video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamProbe {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl StreamProbe {
    /// Parse `ffprobe -of json` output.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: ProbeOutput = serde_json::from_str(json).context("Unreadable ffprobe output")?;
        let stream = parsed
            .streams
            .first()
            .ok_or_else(|| anyhow!("No video stream"))?;

        let fps = stream
            .r_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .ok_or_else(|| anyhow!("No frame rate"))?;
        let duration_secs = parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(Self {
            width: stream.width.ok_or_else(|| anyhow!("No width"))?,
            height: stream.height.ok_or_else(|| anyhow!("No height"))?,
            fps,
            duration_secs,
        })
    }
}

/// `"24/1"` or `"30000/1001"` or `"25"` to frames per second.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let rate = rate.trim();
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse().ok()?,
    };
    (value > 0.0).then_some(value)
}

pub struct ValidationGate;

impl ValidationGate {
    pub async fn probe(path: &Path) -> Result<StreamProbe> {
        let output = tokio::time::timeout(
            tokio::time::Duration::from_secs(10),
            Command::new("ffprobe")
                .kill_on_drop(true)
                .args([
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "stream=width,height,r_frame_rate:format=duration",
                    "-of",
                    "json",
                ])
                .arg(path)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("ffprobe timed out"))?
        .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            anyhow::bail!(
                "ffprobe failed on {:?}: {}",
                path,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        StreamProbe::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Returns `true` if FFmpeg can decode the whole file without errors.
    pub async fn verify(path: &Path) -> bool {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "null", "-"])
            .output()
            .await;

        match output {
            Ok(res) => {
                let stderr = String::from_utf8_lossy(&res.stderr);
                if res.status.success() && stderr.trim().is_empty() {
                    info!(
                        "[VALIDATION] Verified: {:?}",
                        path.file_name().unwrap_or_default()
                    );
                    true
                } else {
                    error!("[VALIDATION] Corruption in {:?}: {}", path, stderr.trim());
                    false
                }
            }
            Err(e) => {
                error!("[VALIDATION] Failed to spawn ffmpeg for verification: {}", e);
                false
            }
        }
    }
}
