use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{LyricError, LyricResult};

/// Deployment configuration for the render pipeline.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: u32,
    /// Canonical output directory for finished videos.
    pub output_dir: PathBuf,
    /// Parent directory for per-job scratch directories. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Root that request asset ids (`audioPath`, `backgroundPath`) are resolved against.
    pub assets_root: PathBuf,
    /// Append the job id to output filenames so concurrent jobs never collide.
    pub unique_output_names: bool,
    /// Rasterizer worker threads. `None` uses rayon defaults.
    pub render_threads: Option<usize>,
    /// Codec/quality policy.
    pub encode: EncodePolicy,
    /// Font discovery.
    pub fonts: FontConfig,
    /// External tool locations.
    pub tools: ToolPaths,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::FULL_HD,
            fps: 30,
            output_dir: PathBuf::from("exports"),
            scratch_dir: None,
            assets_root: PathBuf::from("."),
            unique_output_names: true,
            render_threads: None,
            encode: EncodePolicy::default(),
            fonts: FontConfig::default(),
            tools: ToolPaths::default(),
        }
    }
}

impl RenderConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LyricResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| LyricError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> LyricResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LyricError::config(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check value ranges.
    pub fn validate(&self) -> LyricResult<()> {
        self.canvas.validate()?;
        if self.fps == 0 || self.fps > 240 {
            return Err(LyricError::config("fps must be in 1..=240"));
        }
        if let Some(n) = self.render_threads
            && n == 0
        {
            return Err(LyricError::config(
                "render_threads must be >= 1 when set",
            ));
        }
        self.encode.validate()
    }

    /// Parent directory for job scratch directories.
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("lyrivid"))
    }
}

/// Fixed codec/quality policy applied to every job of a deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodePolicy {
    /// ffmpeg video encoder name.
    pub video_codec: String,
    /// Encoder speed preset.
    pub preset: String,
    /// Constant rate factor (0..=51, lower is better).
    pub crf: u8,
    /// Output pixel format.
    pub pix_fmt: String,
    /// ffmpeg audio encoder name.
    pub audio_codec: String,
    /// Audio bitrate, e.g. `192k`.
    pub audio_bitrate: String,
    /// Move the moov atom to the front for progressive playback.
    pub faststart: bool,
}

impl Default for EncodePolicy {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_owned(),
            preset: "medium".to_owned(),
            crf: 23,
            pix_fmt: "yuv420p".to_owned(),
            audio_codec: "aac".to_owned(),
            audio_bitrate: "192k".to_owned(),
            faststart: true,
        }
    }
}

impl EncodePolicy {
    fn validate(&self) -> LyricResult<()> {
        if self.crf > 51 {
            return Err(LyricError::config("encode.crf must be in 0..=51"));
        }
        for (name, v) in [
            ("video_codec", &self.video_codec),
            ("preset", &self.preset),
            ("pix_fmt", &self.pix_fmt),
            ("audio_codec", &self.audio_codec),
            ("audio_bitrate", &self.audio_bitrate),
        ] {
            if v.trim().is_empty() {
                return Err(LyricError::config(format!("encode.{name} must be non-empty")));
            }
        }
        Ok(())
    }
}

/// Font discovery settings for the text rasterizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Family used when a verse requests a family that is not installed.
    pub default_family: String,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
    /// Load fonts installed on the host.
    pub load_system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            default_family: "Arial".to_owned(),
            font_dirs: vec![PathBuf::from("fonts")],
            load_system_fonts: true,
        }
    }
}

/// Locations of the external media tools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// `ffmpeg` binary.
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
