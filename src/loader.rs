use iced::widget::svg;

pub(crate) const LOADER_IMAGE_SIZE: f32 = 48.0;
pub(crate) const SVG_FRAME_COUNT: usize = 12;

// --- Spinner styles ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LoaderStyle {
    #[default]
    Braille,
    Bounce,
    Pipe,
    Dots,
    Svg,
}

impl LoaderStyle {
    /// Map a `loading_icon` value onto a style.
    ///
    /// `loading-icon-01` .. `loading-icon-05` pick a variant by number; the
    /// style labels are accepted as well. Anything else is the default.
    pub(crate) fn from_loading_icon(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::default();
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "loading-icon-01" | "braille" => LoaderStyle::Braille,
            "loading-icon-02" | "bounce" => LoaderStyle::Bounce,
            "loading-icon-03" | "pipe" => LoaderStyle::Pipe,
            "loading-icon-04" | "dots" => LoaderStyle::Dots,
            "loading-icon-05" | "svg" => LoaderStyle::Svg,
            other => {
                tracing::debug!("loader: unknown loading icon {other:?}, using braille");
                Self::default()
            }
        }
    }

    pub(crate) fn text_frames(self) -> &'static [&'static str] {
        match self {
            LoaderStyle::Braille => &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            LoaderStyle::Bounce => &[
                "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█", "▇", "▆", "▅", "▄", "▃", "▂",
            ],
            LoaderStyle::Pipe => &["|", "/", "-", "\\"],
            LoaderStyle::Dots => &["·  ", "·· ", "···", " ··", "  ·", "   "],
            LoaderStyle::Svg => &[],
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            LoaderStyle::Braille => "braille",
            LoaderStyle::Bounce => "bounce",
            LoaderStyle::Pipe => "pipe",
            LoaderStyle::Dots => "dots",
            LoaderStyle::Svg => "svg",
        }
    }
}

/// Pre-rendered spinner frames, built off the UI thread at startup.
#[derive(Debug, Clone)]
pub(crate) struct LoaderAssets {
    pub(crate) svg_frames: Vec<svg::Handle>,
}

impl LoaderAssets {
    pub(crate) fn load() -> Self {
        let svg_frames = generate_svg_frames(SVG_FRAME_COUNT);
        tracing::debug!("loader assets: {} svg frames", svg_frames.len());
        Self { svg_frames }
    }
}

/// Animated busy indicator. One frame per daemon tick.
#[derive(Debug, Default)]
pub(crate) struct Spinner {
    pub(crate) style: LoaderStyle,
    pub(crate) frame: usize,
    pub(crate) svg_frames: Vec<svg::Handle>,
}

pub(crate) enum SpinnerFrame<'a> {
    Text(&'static str),
    Svg(&'a svg::Handle),
    /// Svg style requested before the frames were loaded.
    Missing,
}

impl Spinner {
    pub(crate) fn set_assets(&mut self, assets: LoaderAssets) {
        self.svg_frames = assets.svg_frames;
    }

    /// Switch style, restarting the animation only if it changed.
    pub(crate) fn set_style(&mut self, style: LoaderStyle) {
        if self.style != style {
            tracing::debug!("loader: style -> {}", style.label());
            self.style = style;
            self.frame = 0;
        }
    }

    fn frame_count(&self) -> usize {
        match self.style {
            LoaderStyle::Svg => self.svg_frames.len().max(1),
            style => style.text_frames().len(),
        }
    }

    pub(crate) fn tick(&mut self) {
        self.frame = (self.frame + 1) % self.frame_count();
    }

    pub(crate) fn current(&self) -> SpinnerFrame<'_> {
        match self.style {
            LoaderStyle::Svg => match self.svg_frames.get(self.frame % self.frame_count()) {
                Some(handle) => SpinnerFrame::Svg(handle),
                None => SpinnerFrame::Missing,
            },
            style => {
                let frames = style.text_frames();
                SpinnerFrame::Text(frames[self.frame % frames.len()])
            }
        }
    }
}

fn generate_svg_frames(n: usize) -> Vec<svg::Handle> {
    (0..n)
        .map(|i| {
            let angle = (i as f64 / n as f64) * 360.0;
            let content = format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128">
  <circle cx="64" cy="64" r="44" fill="none" stroke="white" stroke-opacity="0.2" stroke-width="10"/>
  <path d="M64 20 A44 44 0 0 1 108 64" fill="none"
    stroke="white" stroke-width="10" stroke-linecap="round"
    transform="rotate({angle} 64 64)"/>
</svg>"#
            );
            svg::Handle::from_memory(content.into_bytes())
        })
        .collect()
}
