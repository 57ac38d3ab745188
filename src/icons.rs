use iced::{
    Length, Theme,
    theme::palette::{Extended, Pair},
    widget::{self, svg},
};

const SVG_TABLE_OF_CONTENTS: &[u8] = include_bytes!("../assets/icons/table_of_contents.svg");
const SVG_EXPORT: &[u8] = include_bytes!("../assets/icons/export.svg");
const SVG_EXPAND: &[u8] = include_bytes!("../assets/icons/expand.svg");
const SVG_COLLAPSE: &[u8] = include_bytes!("../assets/icons/collapse.svg");

pub fn table_of_contents() -> svg::Handle {
    svg::Handle::from_memory(SVG_TABLE_OF_CONTENTS)
}

pub fn export() -> svg::Handle {
    svg::Handle::from_memory(SVG_EXPORT)
}

pub fn expand() -> svg::Handle {
    svg::Handle::from_memory(SVG_EXPAND)
}

pub fn collapse() -> svg::Handle {
    svg::Handle::from_memory(SVG_COLLAPSE)
}

#[derive(Debug, Clone, Copy)]
pub enum ButtonVariant {
    Primary,
    Subtle,
}

impl ButtonVariant {
    fn pair(self, palette: &Extended, strength: Strength) -> Pair {
        // The palette families are distinct types, so pick the pairs out one by one
        let (base, weak, strong) = match self {
            ButtonVariant::Primary => (palette.primary.base, palette.primary.weak, palette.primary.strong),
            ButtonVariant::Subtle => (
                palette.background.base,
                palette.background.weak,
                palette.background.strong,
            ),
        };
        match strength {
            Strength::Base => base,
            Strength::Weak => weak,
            Strength::Strong => strong,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strength {
    Base,
    Weak,
    Strong,
}

/// A small square button showing only an svg icon.
pub fn icon_button<'a, T>(
    handle: svg::Handle,
    variant: ButtonVariant,
) -> iced::widget::Button<'a, T> {
    const BTN_SIZE: f32 = 18.0;
    widget::button(widget::svg(handle).width(BTN_SIZE).height(BTN_SIZE).style(
        move |theme: &Theme, _| widget::svg::Style {
            color: Some(variant.pair(theme.extended_palette(), Strength::Base).text),
        },
    ))
    .width(Length::Shrink)
    .padding(4.0)
    .style(move |theme: &Theme, status| {
        let strength = match status {
            widget::button::Status::Hovered => Strength::Weak,
            widget::button::Status::Pressed => Strength::Strong,
            widget::button::Status::Active => Strength::Base,
            widget::button::Status::Disabled => return widget::button::Style::default(),
        };
        widget::button::Style {
            background: Some(variant.pair(theme.extended_palette(), strength).color.into()),
            border: iced::Border {
                radius: 4.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    })
}
