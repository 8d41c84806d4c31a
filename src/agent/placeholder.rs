// SYNOID Reel Placeholder Painter
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Fallback visual for scenes without a stock image: a dark canvas with the
// scene text centered on it. DejaVu Sans ships inside the binary, so a caption
// is drawn even on hosts without any system fonts.

use anyhow::{anyhow, Context, Result};
use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const BACKGROUND: [u8; 3] = [20, 20, 20];
pub const FOREGROUND: [u8; 3] = [230, 230, 230];
const ACCENT: [u8; 3] = [60, 60, 60];

const MAX_CAPTION_CHARS: usize = 120;
const FONT_SIZE: f32 = 44.0;

/// Shown when the scene has no printable text.
pub const GENERIC_LABEL: &str = "Scene";

static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

pub struct PlaceholderPainter {
    width: u32,
    height: u32,
    font: Option<Font>,
}

impl PlaceholderPainter {
    /// Load the configured font, else the bundled one.
    pub fn new(width: u32, height: u32, font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => match load_font(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!("[PLACEHOLDER] {:#}. Using the bundled font.", e);
                    bundled_font()
                }
            },
            None => bundled_font(),
        };

        if font.is_none() {
            warn!("[PLACEHOLDER] No usable font, placeholders will carry no caption");
        }

        Self { width, height, font }
    }

    /// Painter that never draws text. Skips font parsing, handy in tests.
    pub fn without_font(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font: None,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn render(&self, text: &str) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, Rgb(BACKGROUND));
        let mut caption = caption_text(text);
        if !caption.chars().any(char::is_alphanumeric) {
            caption = GENERIC_LABEL.to_string();
        }

        match &self.font {
            Some(font) => self.draw_caption(&mut canvas, font, &caption),
            None => self.draw_label_band(&mut canvas),
        }

        canvas
    }

    /// Render and save. The format follows the file extension.
    pub fn render_to(&self, text: &str, dest: &Path) -> Result<()> {
        self.render(text)
            .save(dest)
            .with_context(|| format!("Failed to write placeholder {:?}", dest))
    }

    fn draw_caption(&self, canvas: &mut RgbImage, font: &Font, caption: &str) {
        let margin = self.width as f32 * 0.1;
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: margin,
            y: 0.0,
            max_width: Some(self.width as f32 - 2.0 * margin),
            max_height: Some(self.height as f32),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            wrap_style: WrapStyle::Word,
            ..LayoutSettings::default()
        });
        layout.append(&[font], &TextStyle::new(caption, FONT_SIZE, 0));

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = font.rasterize_config(glyph.key);
            let origin_x = glyph.x.round() as i64;
            let origin_y = glyph.y.round() as i64;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    if coverage == 0 {
                        continue;
                    }
                    let x = origin_x + col as i64;
                    let y = origin_y + row as i64;
                    if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                        continue;
                    }
                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    blend(pixel, FOREGROUND, coverage);
                }
            }
        }
    }

    fn draw_label_band(&self, canvas: &mut RgbImage) {
        let band_half = (self.height / 18).max(1);
        let top = (self.height / 2).saturating_sub(band_half);
        let bottom = (self.height / 2 + band_half).min(self.height);
        let left = self.width / 5;
        let right = self.width - left;

        for y in top..bottom {
            for x in left..right {
                canvas.put_pixel(x, y, Rgb(ACCENT));
            }
        }
    }
}

/// First characters of the scene on one line; the layout does the wrapping.
pub fn caption_text(text: &str) -> String {
    let clipped: String = text.chars().take(MAX_CAPTION_CHARS).collect();
    clipped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn blend(pixel: &mut Rgb<u8>, color: [u8; 3], coverage: u8) {
    let alpha = coverage as u32;
    for (channel, target) in pixel.0.iter_mut().zip(color) {
        *channel = ((*channel as u32 * (255 - alpha) + target as u32 * alpha) / 255) as u8;
    }
}

fn load_font(path: &Path) -> Result<Font> {
    let bytes = fs::read(path).with_context(|| format!("Cannot read font {:?}", path))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| anyhow!("Failed to parse font {:?}: {}", path, e))
}

fn bundled_font() -> Option<Font> {
    match Font::from_bytes(BUNDLED_FONT, FontSettings::default()) {
        Ok(font) => {
            debug!("[PLACEHOLDER] Using bundled DejaVu Sans");
            Some(font)
        }
        Err(e) => {
            warn!("[PLACEHOLDER] Bundled font does not parse: {}", e);
            None
        }
    }
}
