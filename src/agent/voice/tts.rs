// SYNOID Reel TTS Engine
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Narration comes from an external speech command. `edge-tts` gives the
// neural voices, `espeak-ng` works offline.

use super::clip_duration::audio_duration;
use super::{NarrationClip, Narrator};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TtsBackend {
    /// Microsoft Edge online voices (`edge-tts`)
    #[default]
    Edge,
    /// Offline formant synthesis (`espeak-ng`)
    Espeak,
}

impl TtsBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "edge" | "edge-tts" | "edge_tts" => Some(Self::Edge),
            "espeak" | "espeak-ng" | "espeak_ng" => Some(Self::Espeak),
            _ => None,
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Edge => "edge-tts",
            Self::Espeak => "espeak-ng",
        }
    }

    /// Argument that makes the program print something and exit 0.
    pub fn probe_arg(&self) -> &'static str {
        match self {
            Self::Edge => "--help",
            Self::Espeak => "--version",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Edge => "mp3",
            Self::Espeak => "wav",
        }
    }

    pub fn default_voice(&self) -> &'static str {
        match self {
            Self::Edge => "en-US-ChristopherNeural",
            Self::Espeak => "en-us",
        }
    }

    /// Whether the text goes through stdin instead of argv.
    fn reads_stdin(&self) -> bool {
        matches!(self, Self::Espeak)
    }
}

pub struct TtsEngine {
    backend: TtsBackend,
    voice: String,
}

impl TtsEngine {
    pub fn new(backend: TtsBackend, voice: Option<&str>) -> Self {
        let voice = voice
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(backend.default_voice())
            .to_string();
        Self { backend, voice }
    }

    pub fn backend(&self) -> TtsBackend {
        self.backend
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Where the clip for `stem` ends up.
    pub fn output_path(&self, stem: &Path) -> std::path::PathBuf {
        stem.with_extension(self.backend.extension())
    }

    /// Command-line arguments for one synthesis call.
    pub fn command_args(&self, text: &str, output: &Path) -> Vec<OsString> {
        match self.backend {
            TtsBackend::Edge => {
                let mut text_arg = OsString::from("--text=");
                text_arg.push(text);
                vec![
                    OsString::from("--voice"),
                    OsString::from(&self.voice),
                    text_arg,
                    OsString::from("--write-media"),
                    output.as_os_str().to_os_string(),
                ]
            }
            TtsBackend::Espeak => vec![
                OsString::from("-v"),
                OsString::from(&self.voice),
                OsString::from("-w"),
                output.as_os_str().to_os_string(),
                OsString::from("--stdin"),
            ],
        }
    }

    pub async fn speak(&self, text: &str, output_path: &Path) -> Result<()> {
        info!(
            "[TTS] Generating audio ({} chars, voice {}) -> {:?}",
            text.chars().count(),
            self.voice,
            output_path
        );
        debug!("[TTS] Text: {}", text);

        let stdin = if self.backend.reads_stdin() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(self.backend.program())
            .args(self.command_args(text, output_path))
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute {}", self.backend.program()))?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(text.as_bytes())
                .await
                .context("Failed to send text to TTS process")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("TTS process did not finish")?;

        if !output.status.success() {
            anyhow::bail!(
                "{} failed ({}): {}",
                self.backend.program(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if !output_path.exists() {
            anyhow::bail!("{} produced no file at {:?}", self.backend.program(), output_path);
        }

        Ok(())
    }
}

impl Narrator for TtsEngine {
    async fn synthesize(&self, text: &str, stem: &Path) -> Result<NarrationClip> {
        let path = self.output_path(stem);
        self.speak(text, &path).await?;

        let duration_secs =
            audio_duration(&path).with_context(|| format!("Cannot measure {:?}", path))?;
        if duration_secs <= 0.0 {
            anyhow::bail!("Narration {:?} is empty", path);
        }

        Ok(NarrationClip {
            path,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(TtsBackend::parse("edge"), Some(TtsBackend::Edge));
        assert_eq!(TtsBackend::parse(" Espeak-NG "), Some(TtsBackend::Espeak));
        assert_eq!(TtsBackend::parse("gtts"), None);
    }

    #[test]
    fn test_default_voice_applies_when_blank() {
        let engine = TtsEngine::new(TtsBackend::Edge, Some("  "));
        assert_eq!(engine.voice(), "en-US-ChristopherNeural");
        let engine = TtsEngine::new(TtsBackend::Espeak, Some("en-gb"));
        assert_eq!(engine.voice(), "en-gb");
    }

    #[test]
    fn test_edge_args_keep_dash_text_as_value() {
        let engine = TtsEngine::new(TtsBackend::Edge, None);
        let args = engine.command_args("-- not a flag", Path::new("/tmp/scene_000.mp3"));
        assert_eq!(args[0], "--voice");
        assert_eq!(args[2], "--text=-- not a flag");
        assert_eq!(args[3], "--write-media");
        assert_eq!(args[4], "/tmp/scene_000.mp3");
    }

    #[test]
    fn test_espeak_reads_text_from_stdin() {
        let engine = TtsEngine::new(TtsBackend::Espeak, None);
        let args = engine.command_args("secret text", Path::new("out.wav"));
        assert!(args.iter().all(|a| a != "secret text"));
        assert!(args.iter().any(|a| a == "--stdin"));
    }

    #[test]
    fn test_output_extension_follows_backend() {
        let stem = Path::new("/work/scene_004");
        assert_eq!(
            TtsEngine::new(TtsBackend::Edge, None).output_path(stem),
            Path::new("/work/scene_004.mp3")
        );
        assert_eq!(
            TtsEngine::new(TtsBackend::Espeak, None).output_path(stem),
            Path::new("/work/scene_004.wav")
        );
    }
}
