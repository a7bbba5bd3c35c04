use std::path::{Path, PathBuf};

/// Where a status icon is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IconSource {
    Svg(PathBuf),
    Raster(PathBuf),
    Glyph(&'static str),
}

const GLYPHS: &[(&str, &str)] = &[
    ("warning", "⚠"),
    ("error", "✖"),
    ("info", "ℹ"),
    ("check", "✔"),
    ("done", "✔"),
    ("lock", "🔒"),
    ("cloud", "☁"),
    ("cloud-off", "☁"),
    ("disconnected", "⛓"),
    ("sync", "⟳"),
    ("refresh", "⟳"),
    ("hourglass", "⌛"),
];

const FALLBACK_GLYPH: &str = "●";

/// Resolve an icon key.
///
/// A key containing `/` is a file path. Otherwise `<dir>/<key>.svg` and then
/// `<dir>/<key>.png` are tried, then the built-in glyph table.
pub(crate) fn resolve(key: &str, icon_dir: Option<&Path>) -> IconSource {
    if key.contains('/') {
        let path = PathBuf::from(key);
        return if is_raster(&path) {
            IconSource::Raster(path)
        } else {
            IconSource::Svg(path)
        };
    }

    if let Some(dir) = icon_dir {
        let svg = dir.join(format!("{key}.svg"));
        if svg.is_file() {
            return IconSource::Svg(svg);
        }
        let png = dir.join(format!("{key}.png"));
        if png.is_file() {
            return IconSource::Raster(png);
        }
    }

    match GLYPHS.iter().find(|(name, _)| *name == key) {
        Some(&(_, glyph)) => IconSource::Glyph(glyph),
        None => {
            tracing::debug!("icons: no icon for {key:?}");
            IconSource::Glyph(FALLBACK_GLYPH)
        }
    }
}

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}
