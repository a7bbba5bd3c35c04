use iced::{Background, Color};

/// Colors and font sizes used by the overlay.
pub struct OverlayColors {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    /// Full-screen scrim; its alpha is replaced by the content opacity.
    pub backdrop: Color,
    pub card_bg: Color,
    pub message_text: f32,
    pub glyph_size: f32,
    pub icon_size: f32,
}

impl Default for OverlayColors {
    fn default() -> Self {
        Self::dark()
    }
}

impl OverlayColors {
    pub fn dark() -> Self {
        Self {
            text: Color::from_rgb8(0xD8, 0xD8, 0xD8),
            muted: Color {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 0.4,
            },
            accent: Color {
                r: 1.0,
                g: 0.78,
                b: 0.0,
                a: 1.0,
            },
            backdrop: Color::BLACK,
            card_bg: Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 0.92,
            },
            message_text: 18.0,
            glyph_size: 48.0,
            icon_size: 64.0,
        }
    }

    /// `fade` scales every alpha while the close transition runs.
    pub fn backdrop_style(
        &self,
        opacity: f32,
        fade: f32,
    ) -> impl Fn(&iced::Theme) -> iced::widget::container::Style {
        let color = Color {
            a: opacity * fade,
            ..self.backdrop
        };
        move |_theme: &iced::Theme| iced::widget::container::Style {
            background: Some(Background::Color(color)),
            ..Default::default()
        }
    }

    pub fn card_style(&self, fade: f32) -> impl Fn(&iced::Theme) -> iced::widget::container::Style {
        let color = faded(self.card_bg, fade);
        move |_theme: &iced::Theme| iced::widget::container::Style {
            background: Some(Background::Color(color)),
            border: iced::Border {
                radius: 8.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

pub fn faded(color: Color, fade: f32) -> Color {
    Color {
        a: color.a * fade.clamp(0.0, 1.0),
        ..color
    }
}
