use crate::store::{Storage, StorageError};
use ratatui::style::{Color, Modifier, Style};

/// Storage key holding `"dark"` or `"light"`
pub(crate) const THEME_KEY: &str = "calendar-theme";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Anything other than a stored `"dark"` means light
    pub(crate) fn load<S: Storage>(storage: &S) -> Theme {
        match storage.read(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub(crate) fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub(crate) fn save<S: Storage>(self, storage: &mut S) -> Result<(), StorageError> {
        storage.write(THEME_KEY, self.as_str())
    }

    pub(crate) fn palette(self) -> &'static Palette {
        match self {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Palette {
    pub(crate) base: Style,
    pub(crate) title: Style,
    pub(crate) weekday_header: Style,
    pub(crate) week_number: Style,
    pub(crate) weekend: Style,
    pub(crate) other_month: Style,
    pub(crate) today: Style,
    pub(crate) selected: Style,
    pub(crate) has_events: Style,
    pub(crate) muted: Style,
    pub(crate) status: Style,
}

const LIGHT_BASE: Style = Style::new().fg(Color::Black).bg(Color::White);

const LIGHT: Palette = Palette {
    base: LIGHT_BASE,
    title: LIGHT_BASE.add_modifier(Modifier::BOLD),
    weekday_header: LIGHT_BASE.add_modifier(Modifier::BOLD),
    week_number: LIGHT_BASE.fg(Color::Gray),
    weekend: LIGHT_BASE.fg(Color::Red),
    other_month: LIGHT_BASE.fg(Color::Gray),
    today: LIGHT_BASE.fg(Color::Blue).add_modifier(Modifier::BOLD),
    selected: LIGHT_BASE.add_modifier(Modifier::REVERSED),
    has_events: Style::new().add_modifier(Modifier::UNDERLINED),
    muted: LIGHT_BASE.fg(Color::DarkGray),
    status: LIGHT_BASE.fg(Color::Red),
};

const DARK_BASE: Style = Style::new().fg(Color::White).bg(Color::Black);

const DARK: Palette = Palette {
    base: DARK_BASE,
    title: DARK_BASE.add_modifier(Modifier::BOLD),
    weekday_header: DARK_BASE.add_modifier(Modifier::BOLD),
    week_number: DARK_BASE.fg(Color::DarkGray),
    weekend: DARK_BASE.fg(Color::LightRed),
    other_month: DARK_BASE.fg(Color::DarkGray),
    today: DARK_BASE.fg(Color::LightYellow).add_modifier(Modifier::BOLD),
    selected: DARK_BASE.add_modifier(Modifier::REVERSED),
    has_events: Style::new().add_modifier(Modifier::UNDERLINED),
    muted: DARK_BASE.fg(Color::Gray),
    status: DARK_BASE.fg(Color::LightRed),
};
