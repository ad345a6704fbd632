use std::path::{Path, PathBuf};

use crate::foundation::error::{LyricError, LyricResult};

/// Maps request asset ids (`audioPath`, `backgroundPath`) to readable local files.
pub trait AssetResolver: Send + Sync {
    /// Resolve `id`, failing with [`LyricError::AssetNotFound`] when no readable file exists.
    fn resolve_asset_path(&self, id: &str) -> LyricResult<PathBuf>;
}

/// Resolves asset ids as paths relative to a root directory.
///
/// Ids may carry a leading `/` (upload URLs such as `/uploads/audio/x.mp3`); it is ignored.
/// `..` segments are rejected.
#[derive(Clone, Debug)]
pub struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    /// Resolver rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve_asset_path(&self, id: &str) -> LyricResult<PathBuf> {
        let rel = normalize_rel_path(id.trim().trim_start_matches('/'))?;
        let path = self.root.join(rel);
        if !path.is_file() {
            tracing::debug!(asset = id, path = %path.display(), "asset missing");
            return Err(LyricError::asset_not_found(format!("'{id}'")));
        }
        Ok(path)
    }
}

/// Normalize a relative asset path to `/`-separated form without `.` or empty segments.
pub fn normalize_rel_path(source: &str) -> LyricResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LyricError::invalid_request(format!(
            "asset path '{source}' must be relative"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LyricError::invalid_request(format!(
                "asset path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LyricError::invalid_request(
            "asset path must contain a file name",
        ));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/job/assets.rs"]
mod tests;
