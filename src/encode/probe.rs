use std::path::Path;
use std::process::{Command, Stdio};

use crate::foundation::error::{LyricError, LyricResult, file_label};

/// Container facts the assembler needs about an input file.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds; `0` when ffprobe reports none.
    pub duration_sec: f64,
    /// At least one audio stream is present.
    pub has_audio: bool,
    /// At least one video stream is present (still images count).
    pub has_video: bool,
}

/// Probe `path` with `ffprobe`.
pub fn probe_media(ffprobe: &Path, path: &Path) -> LyricResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            tracing::warn!(tool = %ffprobe.display(), error = %e, "failed to run ffprobe");
            LyricError::assembly(format!("failed to run '{}': {e}", file_label(ffprobe)))
        })?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        tracing::warn!(path = %path.display(), stderr = %stderr.trim(), "ffprobe failed");
        let label = file_label(path);
        return Err(LyricError::assembly(format!(
            "ffprobe failed for '{label}': {}",
            stderr.trim().replace(&path.display().to_string(), &label)
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| LyricError::assembly(format!("ffprobe json parse failed: {e}")))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);
    let has = |kind: &str| {
        parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    Ok(MediaInfo {
        duration_sec,
        has_audio: has("audio"),
        has_video: has("video"),
    })
}

/// Duration of an audio file in seconds, failing when it carries no audio stream.
pub fn probe_audio_duration(ffprobe: &Path, path: &Path) -> LyricResult<f64> {
    let info = probe_media(ffprobe, path)?;
    if !info.has_audio {
        return Err(LyricError::assembly(format!(
            "'{}' has no audio stream",
            file_label(path)
        )));
    }
    Ok(info.duration_sec)
}

/// Return `true` when `tool -version` runs successfully.
pub fn is_tool_available(tool: &Path) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_tool_available(Path::new("ffmpeg"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/probe.rs"]
mod tests;
