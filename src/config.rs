use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OPACITY: f32 = 0.7;
pub const DEFAULT_CLOSE_DELAY_MS: u64 = 800;

/// Presentation and timing settings for the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Backdrop opacity used when a show-signal does not carry one.
    pub opacity: f32,
    /// Fade-out time between closing and dismissing the surface.
    pub close_delay: Duration,
    /// Directory searched for `<icon>.svg` / `<icon>.png`.
    pub icon_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            close_delay: Duration::from_millis(DEFAULT_CLOSE_DELAY_MS),
            icon_dir: None,
            debug: false,
        }
    }
}

/// Shell commands backing the session probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub check: Option<String>,
    pub validate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub overlay: OverlayConfig,
    pub session: SessionConfig,
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Overlay,
    Session,
}

/// Return the path to the config file.
pub fn config_file_path() -> PathBuf {
    home_dir().join(".config/server-overlay/config.md")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Load the config file, falling back to defaults when it is missing.
pub fn load() -> Config {
    load_from(&config_file_path())
}

pub fn load_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            tracing::info!("config: loaded {}", path.display());
            parse_config(&content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("config: {} not found, using defaults", path.display());
            Config::default()
        }
        Err(e) => {
            tracing::warn!("config: cannot read {}: {e}, using defaults", path.display());
            Config::default()
        }
    }
}

/// Parse the markdown-style config.
///
/// Format:
/// ```markdown
/// # overlay
/// - opacity: 0.7
/// - close-delay-ms: 800
/// - icons: ~/.local/share/server-overlay/icons
/// - debug: true
///
/// # session
/// - check: ~/bin/check-session
/// - validate: ~/bin/validate-session
/// ```
///
/// Unknown sections and keys are ignored, as are values that do not parse.
pub fn parse_config(content: &str) -> Config {
    let mut config = Config::default();
    let mut section = Section::None;

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(heading) = trimmed.strip_prefix("# ") {
            section = match heading.trim().to_lowercase().as_str() {
                "overlay" => Section::Overlay,
                "session" => Section::Session,
                other => {
                    tracing::warn!("config: unknown section {other:?}");
                    Section::None
                }
            };
            continue;
        }

        let Some((key, value)) = trimmed
            .strip_prefix("- ")
            .and_then(|rest| rest.split_once(':'))
        else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            continue;
        }

        match (section, key) {
            (Section::Overlay, "opacity") => {
                if let Ok(o) = value.parse::<f32>() {
                    config.overlay.opacity = o.clamp(0.0, 1.0);
                }
            }
            (Section::Overlay, "close-delay-ms") => {
                if let Ok(ms) = value.parse::<u64>() {
                    config.overlay.close_delay = Duration::from_millis(ms.min(10_000));
                }
            }
            (Section::Overlay, "icons") => {
                config.overlay.icon_dir = Some(expand_home(value));
            }
            (Section::Overlay, "debug") => {
                config.overlay.debug = matches!(value, "true" | "yes" | "on");
            }
            (Section::Session, "check") => config.session.check = Some(value.to_string()),
            (Section::Session, "validate") => config.session.validate = Some(value.to_string()),
            _ => {}
        }
    }

    config
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
