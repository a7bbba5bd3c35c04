use iced::widget::text::Shaping;
use iced::widget::{column, container, image as iced_image, mouse_area, svg, text};
use iced::{Alignment, Element, Font, Length};

use crate::app::{App, Message};
use crate::icons::IconSource;
use crate::loader::{SpinnerFrame, LOADER_IMAGE_SIZE};
use crate::theme::faded;

impl App {
    pub(crate) fn view_overlay(&self) -> Element<'_, Message> {
        let view = self.controller.view();
        let colors = &self.colors;

        // Surface still open for a frame after dismiss.
        let Some(content) = view.content() else {
            return container(text(""))
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        };

        let fade = view.fade();
        let text_color = faded(colors.text, fade);
        let mut card = column![].spacing(16).align_x(Alignment::Center);

        if let Some(icon) = view.icon() {
            let icon: Element<'_, Message> = match icon {
                IconSource::Svg(path) => svg(svg::Handle::from_path(path))
                    .width(colors.icon_size)
                    .height(colors.icon_size)
                    .opacity(fade)
                    .into(),
                IconSource::Raster(path) => iced_image(iced_image::Handle::from_path(path))
                    .width(colors.icon_size)
                    .height(colors.icon_size)
                    .opacity(fade)
                    .into(),
                IconSource::Glyph(glyph) => text(*glyph)
                    .size(colors.glyph_size)
                    .color(faded(colors.accent, fade))
                    .shaping(Shaping::Advanced)
                    .into(),
            };
            card = card.push(icon);
        }

        if content.spinner {
            let spinner: Element<'_, Message> = match view.spinner.current() {
                SpinnerFrame::Text(ch) => text(ch)
                    .size(colors.glyph_size)
                    .color(text_color)
                    .font(Font::MONOSPACE)
                    .shaping(Shaping::Advanced)
                    .into(),
                SpinnerFrame::Svg(handle) => svg(handle.clone())
                    .width(LOADER_IMAGE_SIZE)
                    .height(LOADER_IMAGE_SIZE)
                    .opacity(fade)
                    .into(),
                SpinnerFrame::Missing => text("…")
                    .size(colors.glyph_size)
                    .color(faded(colors.muted, fade))
                    .into(),
            };
            card = card.push(spinner);
        }

        if !content.description.is_empty() {
            card = card.push(
                text(content.description.as_str())
                    .size(colors.message_text)
                    .color(text_color)
                    .shaping(Shaping::Advanced),
            );
        }

        let card = container(card)
            .padding(32)
            .max_width(560.0)
            .style(colors.card_style(fade));

        let backdrop = container(card)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(colors.backdrop_style(content.opacity, fade));

        mouse_area(backdrop)
            .on_move(|_| Message::PointerMoved)
            .on_release(Message::PointerReleased)
            .into()
    }
}
