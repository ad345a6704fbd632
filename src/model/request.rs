use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{LyricError, LyricResult};
use crate::model::verse::Verse;

/// A render request as handed over by the HTTP/project layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Project name; the output filename is derived from it.
    pub project_name: String,
    /// Verses in editor order (not necessarily sorted by time).
    pub verses: Vec<Verse>,
    /// Asset id of the audio track.
    pub audio_path: String,
    /// Asset id of the background image or video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_path: Option<String>,
    /// Solid background used when no background media is given.
    #[serde(default)]
    pub background_color: Rgba8,
    /// Which audio variant the user picked (informational).
    #[serde(default = "default_audio_type")]
    pub audio_type: String,
}

fn default_audio_type() -> String {
    "original".to_owned()
}

impl RenderRequest {
    /// Parse a request from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LyricResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| LyricError::invalid_request(format!("parse render request JSON: {e}")))
    }

    /// Parse a request from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> LyricResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LyricError::invalid_request(format!(
                "open render request JSON '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Background asset id, treating an empty string as absent.
    pub fn background(&self) -> Option<&str> {
        self.background_path
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Filesystem-safe stem derived from the project name.
    pub fn output_stem(&self) -> String {
        sanitize_filename(&self.project_name)
    }

    /// Check required fields and every verse.
    pub fn validate(&self) -> LyricResult<()> {
        if self.project_name.trim().is_empty() {
            return Err(LyricError::invalid_request("projectName is required"));
        }
        if self.audio_path.trim().is_empty() {
            return Err(LyricError::invalid_request("audioPath is required"));
        }
        if self.verses.is_empty() {
            return Err(LyricError::invalid_request(
                "at least one verse is required",
            ));
        }

        let mut seen = HashSet::with_capacity(self.verses.len());
        for (i, verse) in self.verses.iter().enumerate() {
            verse.validate(i)?;
            if !seen.insert(verse.id.as_str()) {
                return Err(LyricError::invalid_request(format!(
                    "duplicate verse id '{}'",
                    verse.id
                )));
            }
        }
        Ok(())
    }

    /// Latest verse end time in seconds.
    pub fn last_end_time(&self) -> f64 {
        self.verses
            .iter()
            .map(|v| v.end_time)
            .fold(0.0, f64::max)
    }
}

const ACCENTED: &str = "áàâãéèêíïóôõöúçñ";

/// Turn a project name into a filesystem-safe, lowercase file stem.
///
/// Keeps ASCII letters and digits, `-`, and the accented letters used by the editor's
/// Portuguese UI. Runs of whitespace become a single `-`; everything else is dropped. The result
/// is a fixed point: sanitizing it again returns it unchanged. Names that sanitize to nothing map
/// to `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '-' || ACCENTED.contains(c)) {
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.push(c);
    }

    if out.is_empty() {
        "untitled".to_owned()
    } else {
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/request.rs"]
mod tests;
