pub mod clip_duration;
pub mod tts;

pub use clip_duration::audio_duration;
pub use tts::{TtsBackend, TtsEngine};

use std::path::{Path, PathBuf};

/// Spoken audio for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationClip {
    pub path: PathBuf,
    /// Seconds, always > 0
    pub duration_secs: f64,
}

/// Anything that can turn scene text into a narration clip.
#[allow(async_fn_in_trait)]
pub trait Narrator {
    /// `stem` is the output path without extension; the implementation picks it.
    async fn synthesize(&self, text: &str, stem: &Path) -> anyhow::Result<NarrationClip>;
}
