use iced_layershell::reexport::{Anchor, KeyboardInteractivity, Layer, NewLayerShellSettings};

fn make_output_option(output: Option<&str>) -> iced_layershell::reexport::OutputOption {
    match output {
        Some(name) => iced_layershell::reexport::OutputOption::OutputName(name.to_string()),
        None => iced_layershell::reexport::OutputOption::None,
    }
}

/// Full-screen modal surface. Takes pointer input and keyboard focus so the
/// desktop underneath cannot be used while the overlay is open.
pub(crate) fn overlay_settings(output: Option<&str>) -> NewLayerShellSettings {
    NewLayerShellSettings {
        layer: Layer::Overlay,
        anchor: Anchor::Top | Anchor::Bottom | Anchor::Left | Anchor::Right,
        keyboard_interactivity: KeyboardInteractivity::Exclusive,
        exclusive_zone: Some(-1),
        size: Some((0, 0)),
        events_transparent: false,
        output_option: make_output_option(output),
        ..Default::default()
    }
}
