// SYNOID Reel Pipeline - Script to Video Orchestrator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One run: split the script, narrate and illustrate every scene in order,
// then hand the segments to the assembler. Scratch files live in a per-run
// temp directory that disappears when the run ends.

use crate::agent::assembler::{Assembler, OutputFormat, Segment};
use crate::agent::asset_resolver::{AssetResolver, AssetSource};
use crate::agent::scene_splitter::build_scenes;
use crate::agent::voice::Narrator;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Shortest on-screen time for a scene, whatever the narration says.
pub const MIN_SEGMENT_SECS: f64 = 0.1;

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneReport {
    pub index: usize,
    pub query: String,
    pub source: AssetSource,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub scenes: Vec<SceneReport>,
}

impl RenderReport {
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }

    pub fn placeholder_count(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.source == AssetSource::Placeholder)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderReport),
    /// The script had no text; nothing was synthesized or written.
    NothingToRender,
}

pub struct ReelPipeline<N, A> {
    narrator: N,
    resolver: AssetResolver,
    assembler: A,
    progress_callback: Option<ProgressCallback>,
}

impl<N: Narrator, A: Assembler> ReelPipeline<N, A> {
    pub fn new(narrator: N, resolver: AssetResolver, assembler: A) -> Self {
        Self {
            narrator,
            resolver,
            assembler,
            progress_callback: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    /// Render `script` to `output`.
    ///
    /// Image search trouble is absorbed per scene. Narration or assembly
    /// failures end the run with an error and leave `output` untouched.
    pub async fn render(
        &self,
        script: &str,
        topic_keywords: Option<&str>,
        output: &Path,
    ) -> Result<RenderOutcome> {
        let scenes = build_scenes(script, topic_keywords);
        if scenes.is_empty() {
            info!("[REEL] Script is empty, nothing to generate");
            return Ok(RenderOutcome::NothingToRender);
        }

        let work_dir = tempfile::Builder::new()
            .prefix("synoid_reel_")
            .tempdir()
            .context("Cannot create scratch directory")?;
        info!("[REEL] Scratch directory: {:?}", work_dir.path());

        let total = scenes.len();
        self.report_progress(&format!("Generating narration and images for {} scene(s)", total));

        let mut segments = Vec::with_capacity(total);
        let mut reports = Vec::with_capacity(total);

        for scene in &scenes {
            let stem = work_dir.path().join(format!("scene_{:03}", scene.index));
            let clip = self
                .narrator
                .synthesize(&scene.text, &stem)
                .await
                .with_context(|| format!("Narration failed for scene {}", scene.index + 1))?;

            let asset = self.resolver.resolve(scene, work_dir.path()).await;
            let duration_secs = clip.duration_secs.max(MIN_SEGMENT_SECS);

            reports.push(SceneReport {
                index: scene.index,
                query: scene.query.clone(),
                source: asset.source,
                duration_secs,
            });
            segments.push(Segment {
                index: scene.index,
                image: asset.path,
                image_source: asset.source,
                audio: clip.path,
                duration_secs,
            });

            self.report_progress(&format!("Prepared scene {}/{}", scene.index + 1, total));
        }

        self.report_progress("Assembling video");
        let output = self
            .assembler
            .assemble(&segments, work_dir.path(), output)
            .await
            .context("Video assembly failed")?;

        let report = RenderReport {
            output,
            format: self.assembler.format(),
            scenes: reports,
        };
        info!(
            "[REEL] Done: {} scene(s), {:.1}s, {} placeholder(s)",
            report.scenes.len(),
            report.total_duration(),
            report.placeholder_count()
        );
        Ok(RenderOutcome::Rendered(report))
    }

    fn report_progress(&self, message: &str) {
        info!("[REEL] {}", message);
        if let Some(callback) = &self.progress_callback {
            callback(message);
        }
    }
}
