use crate::calendar::{DateRange, LabelDedup, Period, WeekStart};
use crate::theme::{ColorScheme, Palette, Shade, ThemeTable, DEFAULT_THEME};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::Date;

pub(crate) const MAX_CELL_SIZE: u16 = 3;
pub(crate) const MAX_MARGIN: u16 = 2;

/// Number of past years offered when none are configured, counting the
/// current one
const DEFAULT_YEAR_COUNT: i32 = 4;

/// User settings, read from a TOML file and then overridden from the
/// command line
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) week_start: WeekStart,
    /// Years offered alongside "last year"; empty means the current year and
    /// the three before it
    pub(crate) years: Vec<i32>,
    pub(crate) color_scheme: ColorScheme,
    pub(crate) theme: String,
    pub(crate) themes: BTreeMap<String, PaletteSpec>,
    /// Width of each day cell in columns
    pub(crate) cell_size: u16,
    /// Blank columns between adjacent weeks
    pub(crate) margin: u16,
    pub(crate) month_labels: LabelDedup,
    pub(crate) hide_color_legend: bool,
    pub(crate) hide_month_labels: bool,
    pub(crate) hide_weekday_labels: bool,
    pub(crate) hide_total_count: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            week_start: WeekStart::default(),
            years: Vec::new(),
            color_scheme: ColorScheme::default(),
            theme: String::from(DEFAULT_THEME),
            themes: BTreeMap::new(),
            cell_size: 1,
            margin: 1,
            month_labels: LabelDedup::default(),
            hide_color_legend: false,
            hide_month_labels: false,
            hide_weekday_labels: false,
            hide_total_count: false,
        }
    }
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Config::from_toml(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub(crate) fn from_toml(s: &str) -> Result<Config, ConfigError> {
        let config = toml::from_str::<Config>(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that deserialization alone cannot.  Called again
    /// after command-line overrides have been applied.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CELL_SIZE).contains(&self.cell_size) {
            return Err(ConfigError::OutOfRange {
                key: "cell_size",
                value: self.cell_size,
                min: 1,
                max: MAX_CELL_SIZE,
            });
        }
        if self.margin > MAX_MARGIN {
            return Err(ConfigError::OutOfRange {
                key: "margin",
                value: self.margin,
                min: 0,
                max: MAX_MARGIN,
            });
        }
        if let Some(&year) = self.years.iter().find(|&&y| DateRange::year(y).is_err()) {
            return Err(ConfigError::Year(year));
        }
        for (name, spec) in &self.themes {
            spec.parse(name)?;
        }
        Ok(())
    }

    /// Build the palette table for `shade`, with custom palettes layered
    /// over the built-in ones
    pub(crate) fn theme_table(&self, shade: Shade) -> Result<ThemeTable, ConfigError> {
        let mut table = ThemeTable::builtin(shade);
        for (name, spec) in &self.themes {
            if let Some(palette) = spec.parse(name)?.for_shade(shade) {
                table.insert(name, palette);
            }
        }
        if !table.contains(&self.theme) {
            tracing::warn!(theme = %self.theme, "Configured theme does not exist");
        }
        Ok(table)
    }

    /// The periods the user can switch between, "last year" first
    pub(crate) fn periods(&self, today: Date) -> Vec<Period> {
        let mut periods = vec![Period::LastYear];
        if self.years.is_empty() {
            let this_year = today.year();
            periods.extend((0..DEFAULT_YEAR_COUNT).map(|i| Period::Year(this_year - i)));
        } else {
            periods.extend(self.years.iter().copied().map(Period::Year));
        }
        periods
    }
}

/// A custom palette as written in the config file: five colors, lowest
/// level first, for either or both shades.  A palette given for only one
/// shade is used for both.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PaletteSpec {
    pub(crate) light: Option<[String; 5]>,
    pub(crate) dark: Option<[String; 5]>,
}

impl PaletteSpec {
    fn parse(&self, theme: &str) -> Result<ParsedPalette, ConfigError> {
        let parse_all = |colors: &Option<[String; 5]>| -> Result<Option<Palette>, ConfigError> {
            let Some(colors) = colors else {
                return Ok(None);
            };
            let mut parsed = [Color::Reset; 5];
            for (slot, value) in parsed.iter_mut().zip(colors) {
                *slot = value.parse::<Color>().map_err(|_| ConfigError::Color {
                    theme: theme.to_owned(),
                    value: value.clone(),
                })?;
            }
            Ok(Some(Palette::from_colors(parsed)))
        };
        Ok(ParsedPalette {
            light: parse_all(&self.light)?,
            dark: parse_all(&self.dark)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ParsedPalette {
    light: Option<Palette>,
    dark: Option<Palette>,
}

impl ParsedPalette {
    fn for_shade(self, shade: Shade) -> Option<Palette> {
        match shade {
            Shade::Light => self.light.or(self.dark),
            Shade::Dark => self.dark.or(self.light),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read configuration file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    #[error("year {0} is out of range")]
    Year(i32),
    #[error("invalid color {value:?} in theme {theme:?}")]
    Color { theme: String, value: String },
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::date;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_full() {
        let config = Config::from_toml(concat!(
            "week_start = \"monday\"\n",
            "years = [2022, 2020]\n",
            "color_scheme = \"light\"\n",
            "theme = \"mine\"\n",
            "cell_size = 1\n",
            "margin = 2\n",
            "month_labels = \"by-year-month\"\n",
            "hide_color_legend = true\n",
            "hide_weekday_labels = true\n",
            "\n",
            "[themes.mine]\n",
            "light = [\"#ffffff\", \"#dddddd\", \"#bbbbbb\", \"#999999\", \"#777777\"]\n",
        ))
        .unwrap();
        assert_eq!(config.week_start, WeekStart::Monday);
        assert_eq!(config.years, [2022, 2020]);
        assert_eq!(config.color_scheme, ColorScheme::Light);
        assert_eq!(config.cell_size, 1);
        assert_eq!(config.margin, 2);
        assert_eq!(config.month_labels, LabelDedup::ByYearMonth);
        assert!(config.hide_color_legend);
        assert!(!config.hide_month_labels);
        assert!(config.hide_weekday_labels);
        assert!(!config.hide_total_count);

        let light = config.theme_table(Shade::Light).unwrap();
        assert_eq!(light.get("mine").none, Color::Rgb(0xff, 0xff, 0xff));
        // Only a light palette was given, so it's used for dark too
        let dark = config.theme_table(Shade::Dark).unwrap();
        assert_eq!(dark.get("mine").very_high, Color::Rgb(0x77, 0x77, 0x77));
        assert_eq!(dark.get("classic").none, Color::Rgb(0x16, 0x1b, 0x22));
    }

    #[test]
    fn test_bad_color() {
        let e = Config::from_toml(concat!(
            "[themes.broken]\n",
            "dark = [\"#000000\", \"#111111\", \"not-a-color\", \"#333333\", \"#444444\"]\n",
        ))
        .unwrap_err();
        assert_eq!(
            e.to_string(),
            "invalid color \"not-a-color\" in theme \"broken\""
        );
    }

    #[test]
    fn test_out_of_range() {
        let e = Config::from_toml("cell_size = 4\n").unwrap_err();
        assert_eq!(e.to_string(), "cell_size must be between 1 and 3, got 4");
        let e = Config::from_toml("cell_size = 0\n").unwrap_err();
        assert!(matches!(e, ConfigError::OutOfRange { key: "cell_size", .. }));
        let e = Config::from_toml("margin = 3\n").unwrap_err();
        assert_eq!(e.to_string(), "margin must be between 0 and 2, got 3");
        let e = Config::from_toml("years = [2024, 20000]\n").unwrap_err();
        assert_eq!(e.to_string(), "year 20000 is out of range");
    }

    #[test]
    fn test_unknown_key() {
        let e = Config::from_toml("colour_scheme = \"dark\"\n").unwrap_err();
        assert!(matches!(e, ConfigError::Parse(_)));
        let e = Config::from_toml("week_start = \"friday\"\n").unwrap_err();
        assert!(matches!(e, ConfigError::Parse(_)));
    }

    #[test]
    fn test_periods() {
        let today = date!(2025 - 03 - 14);
        assert_eq!(
            Config::default().periods(today),
            [
                Period::LastYear,
                Period::Year(2025),
                Period::Year(2024),
                Period::Year(2023),
                Period::Year(2022),
            ]
        );
        let config = Config {
            years: vec![2019],
            ..Config::default()
        };
        assert_eq!(
            config.periods(today),
            [Period::LastYear, Period::Year(2019)]
        );
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "theme = \"winter\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.theme, "winter");
        let tmpdir = tempfile::tempdir().unwrap();
        let e = Config::load(&tmpdir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(e, ConfigError::Read { .. }));
    }
}
