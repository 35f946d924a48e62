use ratatui::style::Color;
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    HighContrast,
}

/// Colours the UI draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub match_highlight: Color,
    pub link: Color,
    pub warning: Color,
}

impl ThemeName {
    pub fn palette(self) -> Palette {
        match self {
            ThemeName::Dark => Palette {
                accent: Color::Indexed(99),
                text: Color::White,
                muted: Color::Gray,
                selection_bg: Color::Indexed(55),
                selection_fg: Color::White,
                match_highlight: Color::Yellow,
                link: Color::LightBlue,
                warning: Color::Red,
            },
            ThemeName::Light => Palette {
                accent: Color::Indexed(61),
                text: Color::Black,
                muted: Color::DarkGray,
                selection_bg: Color::Indexed(189),
                selection_fg: Color::Black,
                match_highlight: Color::Magenta,
                link: Color::Blue,
                warning: Color::Red,
            },
            ThemeName::HighContrast => Palette {
                accent: Color::Cyan,
                text: Color::White,
                muted: Color::White,
                selection_bg: Color::White,
                selection_fg: Color::Black,
                match_highlight: Color::Yellow,
                link: Color::Cyan,
                warning: Color::LightRed,
            },
        }
    }
}
