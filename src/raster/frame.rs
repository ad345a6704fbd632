use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::ImageEncoder;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyricError, LyricResult, file_label};

/// One rasterized verse: a straight-alpha RGBA8 image covering the whole canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerseFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels, straight alpha.
    pub rgba8: Vec<u8>,
}

impl VerseFrame {
    /// Fully transparent frame.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            rgba8: vec![0; canvas.rgba_len()],
        }
    }

    /// Frame filled with a single color.
    pub fn solid(canvas: Canvas, color: Rgba8) -> Self {
        let px = [color.r, color.g, color.b, color.a];
        let rgba8 = px
            .iter()
            .copied()
            .cycle()
            .take(canvas.rgba_len())
            .collect();
        Self {
            width: canvas.width,
            height: canvas.height,
            rgba8,
        }
    }

    /// Pixel at `(x, y)`; `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.rgba8.get(i..i + 4)?;
        Some(Rgba8 {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }

    /// Return `true` when every pixel is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.rgba8.chunks_exact(4).all(|p| p[3] == 0)
    }

    /// Encode as PNG. The encoding is deterministic for identical pixels.
    pub fn encode_png(&self) -> LyricResult<Vec<u8>> {
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(Cursor::new(&mut out))
            .write_image(
                &self.rgba8,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .context("encode verse frame as PNG")?;
        Ok(out)
    }

    /// Encode as PNG and write to `path`.
    pub fn write_png(&self, path: &Path) -> LyricResult<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write verse frame '{}'", file_label(path)))?;
        Ok(())
    }

    /// Load a PNG written by [`VerseFrame::write_png`], checking it matches `canvas`.
    pub fn read_png(path: &Path, canvas: Canvas) -> LyricResult<Self> {
        let img = image::open(path)
            .with_context(|| format!("read verse frame '{}'", file_label(path)))?
            .into_rgba8();
        if img.width() != canvas.width || img.height() != canvas.height {
            return Err(LyricError::assembly(format!(
                "verse frame '{}' is {}x{}, expected {}x{}",
                file_label(path),
                img.width(),
                img.height(),
                canvas.width,
                canvas.height
            )));
        }
        Ok(Self {
            width: img.width(),
            height: img.height(),
            rgba8: img.into_raw(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/frame.rs"]
mod tests;
