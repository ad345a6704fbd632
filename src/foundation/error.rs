use std::path::Path;

/// Convenience result type used across lyrivid.
pub type LyricResult<T> = Result<T, LyricError>;

/// Top-level error taxonomy of the render pipeline.
#[derive(thiserror::Error, Debug)]
pub enum LyricError {
    /// Missing or malformed required request fields. No job is created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An audio/background asset could not be resolved to a readable file.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// Rendering a verse's text into a frame failed.
    #[error("rasterization error (verse {verse_index}): {message}")]
    Rasterization {
        /// Index of the verse in the request's original list order.
        verse_index: usize,
        /// Underlying cause.
        message: String,
    },

    /// The encode/mux stage failed.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// The job was cancelled by its caller.
    #[error("render cancelled")]
    Cancelled,

    /// Invalid deployment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stable error classification delivered to job observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`LyricError::InvalidRequest`].
    InvalidRequest,
    /// See [`LyricError::AssetNotFound`].
    AssetNotFound,
    /// See [`LyricError::Rasterization`].
    Rasterization,
    /// See [`LyricError::Assembly`].
    Assembly,
    /// See [`LyricError::Cancelled`].
    Cancelled,
    /// Configuration or unexpected internal failures.
    Internal,
}

impl LyricError {
    /// Build a [`LyricError::InvalidRequest`] value.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Build a [`LyricError::AssetNotFound`] value.
    pub fn asset_not_found(msg: impl Into<String>) -> Self {
        Self::AssetNotFound(msg.into())
    }

    /// Build a [`LyricError::Rasterization`] value for `verse_index`.
    pub fn rasterization(verse_index: usize, msg: impl Into<String>) -> Self {
        Self::Rasterization {
            verse_index,
            message: msg.into(),
        }
    }

    /// Build a [`LyricError::Assembly`] value.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// Build a [`LyricError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error for observers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::AssetNotFound(_) => ErrorKind::AssetNotFound,
            Self::Rasterization { .. } => ErrorKind::Rasterization,
            Self::Assembly(_) => ErrorKind::Assembly,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Return `true` for errors that must be reported synchronously to the submitter.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::AssetNotFound(_))
    }
}

/// File name of `path`, for error text that leaves the process.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unnamed>".to_owned())
}

/// Rewrite occurrences of the absolute directories `roots` in `message` relative to them.
///
/// Relative roots are left alone. Longer roots are stripped first so nested roots resolve to the
/// innermost one.
pub(crate) fn strip_roots(message: &str, roots: &[&Path]) -> String {
    let mut prefixes: Vec<String> = roots
        .iter()
        .filter(|r| r.is_absolute())
        .flat_map(|r| {
            let mut forms = vec![r.display().to_string()];
            if let Ok(canon) = r.canonicalize() {
                forms.push(canon.display().to_string());
            }
            forms
        })
        .map(|s| s.trim_end_matches(['/', '\\']).to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    prefixes.dedup();

    let mut out = message.to_owned();
    for prefix in &prefixes {
        out = strip_prefix_occurrences(&out, prefix);
    }
    out
}

fn strip_prefix_occurrences(message: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(at) = rest.find(prefix) {
        out.push_str(&rest[..at]);
        let tail = &rest[at + prefix.len()..];
        match tail.chars().next() {
            Some('/' | '\\') => rest = &tail[1..],
            Some(c) if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') => {
                out.push_str(prefix);
                rest = tail;
            }
            _ => {
                out.push('.');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
