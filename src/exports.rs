use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Context;
use serde::Serialize;

use crate::foundation::error::LyricResult;

/// One published file in the output directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    /// File name within the output directory.
    pub file_name: String,
    /// Full path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modification time as Unix seconds, when the platform reports it.
    pub modified_unix_secs: Option<u64>,
}

/// List published files in `dir`, sorted by file name.
///
/// A missing directory is an empty listing. In-progress `.part` files are skipped.
pub fn list_exports(dir: &Path) -> LyricResult<Vec<ExportEntry>> {
    let rd = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to list exports in '{}'", dir.display()))
                .into());
        }
    };

    let mut out = Vec::new();
    for entry in rd {
        let entry =
            entry.with_context(|| format!("failed to read entry in '{}'", dir.display()))?;
        let meta = entry
            .metadata()
            .with_context(|| format!("failed to stat '{}'", entry.path().display()))?;
        if !meta.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.ends_with(".part") {
            continue;
        }
        out.push(ExportEntry {
            path: entry.path(),
            size_bytes: meta.len(),
            modified_unix_secs: meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
            file_name,
        });
    }
    out.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/unit/exports.rs"]
mod tests;
