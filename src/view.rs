use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::icons::{self, IconSource};
use crate::loader::{LoaderAssets, LoaderStyle, Spinner};
use crate::overlay::{OverlayContent, OverlayView};

/// The iced-side view. Holds what should be on screen; the app turns
/// `wants_surface` into layer-surface open/close tasks.
pub(crate) struct IcedView {
    ready: bool,
    content: Option<OverlayContent>,
    /// Resolved once per present, not per frame.
    icon: Option<IconSource>,
    fade_started: Option<Instant>,
    close_delay: Duration,
    pub(crate) spinner: Spinner,
    pub(crate) icon_dir: Option<PathBuf>,
}

impl IcedView {
    pub(crate) fn new(close_delay: Duration, icon_dir: Option<PathBuf>) -> Self {
        Self {
            ready: false,
            content: None,
            icon: None,
            fade_started: None,
            close_delay,
            spinner: Spinner::default(),
            icon_dir,
        }
    }

    /// Spinner frames are in; shows are accepted from now on.
    pub(crate) fn set_assets(&mut self, assets: LoaderAssets) {
        self.spinner.set_assets(assets);
        self.ready = true;
    }

    pub(crate) fn content(&self) -> Option<&OverlayContent> {
        self.content.as_ref()
    }

    pub(crate) fn icon(&self) -> Option<&IconSource> {
        self.icon.as_ref()
    }

    pub(crate) fn wants_surface(&self) -> bool {
        self.content.is_some()
    }

    /// True while something on screen changes from tick to tick.
    pub(crate) fn is_animating(&self) -> bool {
        self.fade_started.is_some() || self.content.as_ref().is_some_and(|c| c.spinner)
    }

    pub(crate) fn tick(&mut self) {
        if self.content.as_ref().is_some_and(|c| c.spinner) {
            self.spinner.tick();
        }
    }

    /// Alpha multiplier: 1.0 when fully shown, falling to 0.0 over the close
    /// transition.
    pub(crate) fn fade(&self) -> f32 {
        fade_at(self.fade_started, self.close_delay, Instant::now())
    }
}

fn fade_at(started: Option<Instant>, delay: Duration, now: Instant) -> f32 {
    match started {
        None => 1.0,
        Some(_) if delay.is_zero() => 0.0,
        Some(start) => {
            let elapsed = now.saturating_duration_since(start).as_secs_f32();
            (1.0 - elapsed / delay.as_secs_f32()).clamp(0.0, 1.0)
        }
    }
}

impl OverlayView for IcedView {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn present(&mut self, content: &OverlayContent) {
        self.fade_started = None;
        self.spinner
            .set_style(LoaderStyle::from_loading_icon(content.loading_icon.as_deref()));
        self.icon = content
            .icon
            .as_deref()
            .map(|key| icons::resolve(key, self.icon_dir.as_deref()));
        self.content = Some(content.clone());
    }

    fn fade_out(&mut self) {
        if self.content.is_some() && self.fade_started.is_none() {
            self.fade_started = Some(Instant::now());
        }
    }

    fn dismiss(&mut self) {
        self.fade_started = None;
        self.content = None;
        self.icon = None;
    }
}
