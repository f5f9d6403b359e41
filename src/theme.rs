use crate::level::Level;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Name of the palette every table is guaranteed to contain
pub(crate) const DEFAULT_THEME: &str = "classic";

/// The five colors used to draw contribution levels, lowest first
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Palette {
    pub(crate) none: Color,
    pub(crate) low: Color,
    pub(crate) moderate: Color,
    pub(crate) high: Color,
    pub(crate) very_high: Color,
}

impl Palette {
    const fn hex(colors: [u32; 5]) -> Palette {
        Palette {
            none: Color::from_u32(colors[0]),
            low: Color::from_u32(colors[1]),
            moderate: Color::from_u32(colors[2]),
            high: Color::from_u32(colors[3]),
            very_high: Color::from_u32(colors[4]),
        }
    }

    pub(crate) fn from_colors([none, low, moderate, high, very_high]: [Color; 5]) -> Palette {
        Palette {
            none,
            low,
            moderate,
            high,
            very_high,
        }
    }

    pub(crate) fn color(&self, level: Level) -> Color {
        match level {
            Level::None => self.none,
            Level::Low => self.low,
            Level::Moderate => self.moderate,
            Level::High => self.high,
            Level::VeryHigh => self.very_high,
        }
    }
}

const CLASSIC_LIGHT: Palette = Palette::hex([0xebedf0, 0x9be9a8, 0x40c463, 0x30a14e, 0x216e39]);
const CLASSIC_DARK: Palette = Palette::hex([0x161b22, 0x0e4429, 0x006d32, 0x26a641, 0x39d353]);

static LIGHT_THEMES: &[(&str, Palette)] = &[
    ("classic", CLASSIC_LIGHT),
    (
        "aurora",
        Palette::hex([0xebedf0, 0x88c0d0, 0x81a1c1, 0x5e81ac, 0x4c566a]),
    ),
    (
        "velvet",
        Palette::hex([0xebedf0, 0xff9ecd, 0xff69b4, 0xda1884, 0x851050]),
    ),
    (
        "solar",
        Palette::hex([0xebedf0, 0xffd700, 0xffa500, 0xff4500, 0x8b0000]),
    ),
    (
        "prism",
        Palette::hex([0xebedf0, 0xff9aa2, 0xc7ceea, 0xb5ead7, 0x85dcb8]),
    ),
    (
        "galaxy",
        Palette::hex([0xebedf0, 0x8e8cd8, 0x6b4f89, 0x483475, 0x2b1955]),
    ),
    (
        "pastel",
        Palette::hex([0xebedf0, 0xffd6e0, 0xffb3c6, 0xff8fab, 0xff6b8b]),
    ),
    (
        "monotone",
        Palette::hex([0xebedf0, 0xc6c6c6, 0x929292, 0x636363, 0x2f2f2f]),
    ),
    (
        "halloween",
        Palette::hex([0xebedf0, 0xffee4a, 0xffc501, 0xfe9600, 0x03001c]),
    ),
    (
        "winter",
        Palette::hex([0xebedf0, 0xb6e3ff, 0x54aeff, 0x0969da, 0x0a3069]),
    ),
    (
        "nature",
        Palette::hex([0xebedf0, 0xd8e8b0, 0x95c077, 0x4f772d, 0x31572c]),
    ),
];

static DARK_THEMES: &[(&str, Palette)] = &[
    ("classic", CLASSIC_DARK),
    (
        "aurora",
        Palette::hex([0x161b22, 0x133d55, 0x1c5a80, 0x2188c6, 0x4dabf5]),
    ),
    (
        "velvet",
        Palette::hex([0x161b22, 0x4b1736, 0x6e1e51, 0xa82577, 0xf25cb5]),
    ),
    (
        "solar",
        Palette::hex([0x161b22, 0x452c01, 0x6f4206, 0xa86406, 0xffa21f]),
    ),
    (
        "prism",
        Palette::hex([0x161b22, 0x153042, 0x1e4973, 0x2471b5, 0x5295e3]),
    ),
    (
        "galaxy",
        Palette::hex([0x161b22, 0x1d1d46, 0x2c2a6e, 0x413aa3, 0x695de3]),
    ),
    (
        "pastel",
        Palette::hex([0x161b22, 0x461536, 0x692155, 0xa13282, 0xe564c3]),
    ),
    (
        "monotone",
        Palette::hex([0x161b22, 0x222222, 0x444444, 0x666666, 0x888888]),
    ),
    (
        "halloween",
        Palette::hex([0x161b22, 0x341b00, 0x662c00, 0x873800, 0xc65000]),
    ),
    (
        "winter",
        Palette::hex([0x161b22, 0x0a1c40, 0x0f295c, 0x183e8a, 0x275bd6]),
    ),
    (
        "nature",
        Palette::hex([0x161b22, 0x1e3c16, 0x2c5a21, 0x3b7a2c, 0x57ad41]),
    ),
];

/// Concrete light/dark appearance after `system` has been resolved
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Shade {
    Light,
    Dark,
}

/// Appearance as requested by the user
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ColorScheme {
    Light,
    Dark,
    #[default]
    System,
}

impl ColorScheme {
    /// Resolve `System` using the terminal's `COLORFGBG` value, which looks
    /// like `"15;0"` or `"15;default;0"`.  Without a usable value the
    /// terminal is assumed to be dark.
    pub(crate) fn resolve(self, colorfgbg: Option<&str>) -> Shade {
        match self {
            ColorScheme::Light => Shade::Light,
            ColorScheme::Dark => Shade::Dark,
            ColorScheme::System => {
                match colorfgbg
                    .and_then(|s| s.rsplit(';').next())
                    .and_then(|bg| bg.trim().parse::<u8>().ok())
                {
                    Some(bg) if bg < 7 || bg == 8 => Shade::Dark,
                    Some(_) => Shade::Light,
                    None => Shade::Dark,
                }
            }
        }
    }
}

impl FromStr for ColorScheme {
    type Err = ParseColorSchemeError;

    fn from_str(s: &str) -> Result<ColorScheme, ParseColorSchemeError> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ColorScheme::Light),
            "dark" => Ok(ColorScheme::Dark),
            "system" | "auto" => Ok(ColorScheme::System),
            _ => Err(ParseColorSchemeError),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("color scheme must be \"light\", \"dark\", or \"system\"")]
pub(crate) struct ParseColorSchemeError;

/// Palettes available for one shade, keyed by name
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ThemeTable {
    default: Palette,
    named: BTreeMap<String, Palette>,
}

impl ThemeTable {
    pub(crate) fn builtin(shade: Shade) -> ThemeTable {
        let (default, themes) = match shade {
            Shade::Light => (CLASSIC_LIGHT, LIGHT_THEMES),
            Shade::Dark => (CLASSIC_DARK, DARK_THEMES),
        };
        ThemeTable {
            default,
            named: themes
                .iter()
                .map(|&(name, palette)| (name.to_owned(), palette))
                .collect(),
        }
    }

    /// Add or replace a palette.  Replacing `classic` also replaces the
    /// fallback.
    pub(crate) fn insert(&mut self, name: &str, palette: Palette) {
        if name == DEFAULT_THEME {
            self.default = palette;
        }
        self.named.insert(name.to_owned(), palette);
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Look up `name`, falling back to the default palette for unknown
    /// names
    pub(crate) fn get(&self, name: &str) -> Palette {
        if let Some(&palette) = self.named.get(name) {
            palette
        } else {
            tracing::debug!(theme = name, "Unknown theme; using {DEFAULT_THEME}");
            self.default
        }
    }

    /// Theme names in sorted order
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.named.keys().map(String::as_str)
    }

    /// The theme name after (or before) `current`, wrapping around
    pub(crate) fn cycle(&self, current: &str, forwards: bool) -> &str {
        let names = self.names().collect::<Vec<_>>();
        let Some(pos) = names.iter().position(|&n| n == current) else {
            return DEFAULT_THEME;
        };
        let len = names.len();
        let i = if forwards {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        names.get(i).copied().unwrap_or(DEFAULT_THEME)
    }
}

/// Styles for everything other than the cells themselves
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Chrome {
    pub(crate) background: Color,
    pub(crate) base: Style,
    pub(crate) muted: Style,
    pub(crate) heading: Style,
    pub(crate) error: Style,
}

const DARK_BG: Color = Color::from_u32(0x0d1117);
const LIGHT_BG: Color = Color::from_u32(0xffffff);

pub(crate) const DARK_CHROME: Chrome = Chrome {
    background: DARK_BG,
    base: Style::new().fg(Color::from_u32(0xe6edf3)).bg(DARK_BG),
    muted: Style::new().fg(Color::from_u32(0x8b949e)).bg(DARK_BG),
    heading: Style::new()
        .fg(Color::from_u32(0xe6edf3))
        .bg(DARK_BG)
        .add_modifier(Modifier::BOLD),
    error: Style::new().fg(Color::from_u32(0xf85149)).bg(DARK_BG),
};

pub(crate) const LIGHT_CHROME: Chrome = Chrome {
    background: LIGHT_BG,
    base: Style::new().fg(Color::from_u32(0x24292f)).bg(LIGHT_BG),
    muted: Style::new().fg(Color::from_u32(0x57606a)).bg(LIGHT_BG),
    heading: Style::new()
        .fg(Color::from_u32(0x24292f))
        .bg(LIGHT_BG)
        .add_modifier(Modifier::BOLD),
    error: Style::new().fg(Color::from_u32(0xcf222e)).bg(LIGHT_BG),
};

impl Chrome {
    pub(crate) fn for_shade(shade: Shade) -> Chrome {
        match shade {
            Shade::Light => LIGHT_CHROME,
            Shade::Dark => DARK_CHROME,
        }
    }

    /// `color` drawn at 30% opacity over the background
    pub(crate) fn fade(&self, color: Color) -> Color {
        match (color, self.background) {
            (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => {
                Color::Rgb(blend(r, br), blend(g, bg), blend(b, bb))
            }
            _ => Color::DarkGray,
        }
    }
}

fn blend(fg: u8, bg: u8) -> u8 {
    let mixed = (u16::from(fg) * 3 + u16::from(bg) * 7) / 10;
    u8::try_from(mixed).unwrap_or(u8::MAX)
}
