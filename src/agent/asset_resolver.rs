// SYNOID Reel Asset Resolver
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One picture per scene, always. A stock photo from the search API when a key
// is configured and the search works out, a rendered placeholder otherwise.

use crate::agent::placeholder::PlaceholderPainter;
use crate::agent::scene_splitter::Scene;
use crate::config::SearchConfig;
use anyhow::{anyhow, Context, Result};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    External,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub source: AssetSource,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    src: PhotoSource,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoSource {
    large: Option<String>,
    medium: Option<String>,
    original: Option<String>,
}

impl PhotoSource {
    fn best(&self) -> Option<&str> {
        [&self.large, &self.medium, &self.original]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .find(|s| !s.trim().is_empty())
    }
}

pub struct AssetResolver {
    config: SearchConfig,
    client: reqwest::Client,
    painter: PlaceholderPainter,
}

impl AssetResolver {
    pub fn new(config: SearchConfig, painter: PlaceholderPainter) -> Self {
        if !config.has_credential() {
            warn!("[ASSETS] No image search key configured, every scene gets a placeholder");
        }
        Self {
            config,
            client: reqwest::Client::new(),
            painter,
        }
    }

    pub fn is_offline(&self) -> bool {
        !self.config.has_credential()
    }

    /// Get the picture for `scene`, writing it into `dest_dir`.
    ///
    /// Search problems are logged and answered with a placeholder; they never
    /// reach the caller. A placeholder that cannot be written to `dest_dir` is
    /// written to the system temp directory instead. Only if that fails too
    /// does the returned path point at nothing, and assembly then fails the run.
    pub async fn resolve(&self, scene: &Scene, dest_dir: &Path) -> Asset {
        if let Some(key) = self.config.api_key.as_deref() {
            match self.fetch_external(key, scene, dest_dir).await {
                Ok(path) => {
                    info!(
                        "[ASSETS] Scene {}: stock image for '{}'",
                        scene.index + 1,
                        scene.query
                    );
                    return Asset {
                        source: AssetSource::External,
                        path,
                    };
                }
                Err(e) => warn!(
                    "[ASSETS] Image search failed for '{}': {:#}. Using placeholder.",
                    scene.query, e
                ),
            }
        }

        self.placeholder(scene, dest_dir)
    }

    fn placeholder(&self, scene: &Scene, dest_dir: &Path) -> Asset {
        let mut path = dest_dir.join(format!("scene_{:03}_placeholder.png", scene.index));
        if let Err(e) = self.painter.render_to(&scene.text, &path) {
            warn!("[ASSETS] {:#}. Retrying in the temp directory.", e);
            match self.spare_placeholder(scene) {
                Ok(spare) => path = spare,
                Err(e) => error!("[ASSETS] {:#}", e),
            }
        }
        info!("[ASSETS] Scene {}: placeholder", scene.index + 1);
        Asset {
            source: AssetSource::Placeholder,
            path,
        }
    }

    fn spare_placeholder(&self, scene: &Scene) -> Result<PathBuf> {
        let path = tempfile::Builder::new()
            .prefix(&format!("synoid_reel_scene_{:03}_", scene.index))
            .suffix(".png")
            .tempfile()
            .context("cannot create spare placeholder file")?
            .into_temp_path()
            .keep()
            .context("cannot keep spare placeholder file")?;
        self.painter.render_to(&scene.text, &path)?;
        Ok(path)
    }

    async fn fetch_external(&self, key: &str, scene: &Scene, dest_dir: &Path) -> Result<PathBuf> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .header(AUTHORIZATION, key)
            .query(&[
                ("query", scene.query.as_str()),
                ("per_page", "1"),
                ("orientation", "landscape"),
            ])
            .timeout(self.config.search_timeout)
            .send()
            .await
            .context("search request failed")?
            .error_for_status()
            .context("search rejected")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("malformed search response")?;

        let photo = body
            .photos
            .first()
            .ok_or_else(|| anyhow!("no results"))?;
        let src = photo
            .src
            .best()
            .ok_or_else(|| anyhow!("result has no image url"))?;

        let bytes = self
            .client
            .get(src)
            .timeout(self.config.download_timeout)
            .send()
            .await
            .context("image download failed")?
            .error_for_status()
            .context("image download rejected")?
            .bytes()
            .await
            .context("image download interrupted")?;

        let format = image::guess_format(&bytes).context("download is not an image")?;
        image::load_from_memory_with_format(&bytes, format)
            .context("downloaded image does not decode")?;

        let ext = format.extensions_str().first().copied().unwrap_or("img");
        let path = dest_dir.join(format!("scene_{:03}.{}", scene.index, ext));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("cannot write {:?}", path))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_source_prefers_large() {
        let src = PhotoSource {
            large: Some("L".into()),
            medium: Some("M".into()),
            original: Some("O".into()),
        };
        assert_eq!(src.best(), Some("L"));

        let src = PhotoSource {
            large: Some(" ".into()),
            medium: None,
            original: Some("O".into()),
        };
        assert_eq!(src.best(), Some("O"));
        assert_eq!(PhotoSource::default().best(), None);
    }

    #[test]
    fn test_response_without_photos_parses_empty() {
        let body: SearchResponse = serde_json::from_str(r#"{"total_results":0}"#).unwrap();
        assert!(body.photos.is_empty());
    }

    #[tokio::test]
    async fn test_offline_resolver_paints_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new(
            SearchConfig::offline(),
            PlaceholderPainter::without_font(1280, 720),
        );
        assert!(resolver.is_offline());

        let scene = Scene::new(2, "Mountains at dusk.", None);
        let asset = resolver.resolve(&scene, dir.path()).await;
        assert_eq!(asset.source, AssetSource::Placeholder);
        assert_eq!(asset.path, dir.path().join("scene_002_placeholder.png"));
        assert!(asset.path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_dest_still_yields_placeholder_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone").join("deeper");
        let resolver = AssetResolver::new(
            SearchConfig::offline(),
            PlaceholderPainter::without_font(320, 180),
        );

        let scene = Scene::new(4, "Rain on the window.", None);
        let asset = resolver.resolve(&scene, &missing).await;
        assert_eq!(asset.source, AssetSource::Placeholder);
        assert!(asset.path.exists());
        assert!(!asset.path.starts_with(&missing));
        assert_eq!(image::image_dimensions(&asset.path).unwrap(), (320, 180));
        std::fs::remove_file(&asset.path).unwrap();
    }
}
