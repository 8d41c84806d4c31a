// SYNOID Reel Health Check
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The reel leans on external programs. This reports which of them cannot be
// started so the user hears about it before a render fails halfway.

use crate::agent::voice::TtsBackend;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// An external program and the argument used to poke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTool {
    pub program: &'static str,
    pub probe_arg: &'static str,
    pub purpose: &'static str,
}

/// Tools a render with `backend` needs.
pub fn required_tools(backend: TtsBackend) -> Vec<ExternalTool> {
    vec![
        ExternalTool {
            program: "ffmpeg",
            probe_arg: "-version",
            purpose: "video encoding",
        },
        ExternalTool {
            program: "ffprobe",
            probe_arg: "-version",
            purpose: "output validation",
        },
        ExternalTool {
            program: backend.program(),
            probe_arg: backend.probe_arg(),
            purpose: "narration",
        },
    ]
}

/// Whether `tool` runs and exits cleanly.
pub async fn is_available(tool: &ExternalTool) -> bool {
    match Command::new(tool.program)
        .arg(tool.probe_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("[HEALTH] '{}' failed to start: {}", tool.program, e);
            false
        }
    }
}

/// Tools from [`required_tools`] that are missing or broken.
pub async fn check_dependencies(backend: TtsBackend) -> Vec<ExternalTool> {
    let mut missing = Vec::new();
    for tool in required_tools(backend) {
        if !is_available(&tool).await {
            missing.push(tool);
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_tools_follow_backend() {
        let tools = required_tools(TtsBackend::Espeak);
        let programs: Vec<&str> = tools.iter().map(|t| t.program).collect();
        assert_eq!(programs, vec!["ffmpeg", "ffprobe", "espeak-ng"]);
        assert_eq!(required_tools(TtsBackend::Edge)[2].program, "edge-tts");
    }

    #[tokio::test]
    async fn test_unknown_program_is_unavailable() {
        let tool = ExternalTool {
            program: "__synoid_reel_no_such_tool",
            probe_arg: "--version",
            purpose: "test",
        };
        assert!(!is_available(&tool).await);
    }
}
