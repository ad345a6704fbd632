use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

use crate::config::FontConfig;

/// Font database shared by every rasterization of a service.
///
/// Loading system fonts is slow, so a book is built once and cloned cheaply (`Arc`) into jobs.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    default_family: String,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("default_family", &self.default_family)
            .finish()
    }
}

impl FontBook {
    /// Build a book from host fonts and the configured font directories.
    pub fn load(cfg: &FontConfig) -> Self {
        let mut db = fontdb::Database::new();
        if cfg.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &cfg.font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database loaded");
        Self::from_database(db, cfg.default_family.clone())
    }

    /// Wrap an already populated database.
    pub fn from_database(db: fontdb::Database, default_family: impl Into<String>) -> Self {
        Self {
            db: Arc::new(db),
            default_family: default_family.into(),
        }
    }

    /// Number of loaded font faces.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Configured fallback family.
    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Return `true` when at least one face of `family` is loaded.
    pub fn has_family(&self, family: &str) -> bool {
        let families = [to_fontdb_family(family)];
        self.db
            .query(&fontdb::Query {
                families: &families,
                ..Default::default()
            })
            .is_some()
    }

    /// Pick the family to render `requested` with.
    ///
    /// Order: the requested family, the configured default family, then the family of the
    /// first generic sans-serif face, then any loaded face. Returns `None` when the book holds no
    /// faces at all.
    pub fn resolve_family(&self, requested: &str) -> Option<String> {
        let requested = requested.trim();
        if !requested.is_empty() && self.has_family(requested) {
            return Some(requested.to_owned());
        }
        if self.has_family(&self.default_family) {
            tracing::warn!(
                requested,
                fallback = %self.default_family,
                "font family not installed, using default family"
            );
            return Some(self.default_family.clone());
        }

        let sans = [fontdb::Family::SansSerif];
        let id = self
            .db
            .query(&fontdb::Query {
                families: &sans,
                ..Default::default()
            })
            .or_else(|| self.db.faces().next().map(|f| f.id))?;
        let family = self.db.face(id)?.families.first()?.0.clone();
        tracing::warn!(
            requested,
            fallback = %family,
            "neither requested nor default font family installed"
        );
        Some(family)
    }

    pub(crate) fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

fn to_fontdb_family(name: &str) -> fontdb::Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => fontdb::Family::Name(name),
    }
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font file");
        }
    }
}

/// usvg font resolver that never leaves text without a face when any face is loaded.
pub(crate) fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, db| {
            let mut families = Vec::<fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                });
            }
            families.push(fontdb::Family::SansSerif);
            families.push(fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch: fontdb::Stretch::Normal,
                style,
            };

            db.query(&query).or_else(|| db.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/fonts.rs"]
mod tests;
