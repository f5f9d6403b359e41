mod app;
mod calendar;
mod config;
mod contrib;
mod help;
mod level;
mod loader;
mod pacing;
mod selection;
mod source;
mod theme;
use crate::app::App;
use crate::calendar::{Period, WeekStart};
use crate::config::Config;
use crate::loader::Loader;
use crate::source::{DataSource, DemoSource, FileSource, GitHubSource};
use crate::theme::ColorScheme;
use anyhow::Context;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a GitHub access token
static TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable overriding the GraphQL endpoint
static ENDPOINT_VAR: &str = "GHCAL_GITHUB_URL";

/// Environment variable with a `tracing` filter for the log file
static LOG_VAR: &str = "GHCAL_LOG";

/// Subject shown by `--demo` when no username is given
static DEMO_SUBJECT: &str = "demo";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(RunOptions),
    Help,
    Version,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct RunOptions {
    username: Option<String>,
    config: Option<PathBuf>,
    year: Option<i32>,
    theme: Option<String>,
    scheme: Option<ColorScheme>,
    week_start: Option<WeekStart>,
    data: Option<PathBuf>,
    demo: bool,
    log_file: Option<PathBuf>,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = RunOptions::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("config") => {
                    opts.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('y') | Arg::Long("year") => {
                    opts.year = Some(parser.value()?.parse()?);
                }
                Arg::Short('t') | Arg::Long("theme") => {
                    opts.theme = Some(parser.value()?.string()?);
                }
                Arg::Short('s') | Arg::Long("scheme") => {
                    opts.scheme = Some(parser.value()?.parse()?);
                }
                Arg::Short('w') | Arg::Long("week-start") => {
                    opts.week_start = Some(parser.value()?.parse()?);
                }
                Arg::Long("data") => opts.data = Some(PathBuf::from(parser.value()?)),
                Arg::Long("demo") => opts.demo = true,
                Arg::Long("log-file") => opts.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Value(value) if opts.username.is_none() => {
                    opts.username = Some(value.string()?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        if opts.username.is_none() && !opts.demo {
            return Err(lexopt::Error::from("missing username"));
        }
        if opts.demo && opts.data.is_some() {
            return Err(lexopt::Error::from("--demo and --data are mutually exclusive"));
        }
        Ok(Command::Run(opts))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opts) => opts.run(),
            Command::Help => {
                println!("Usage: ghcal [<options>] <username>");
                println!();
                println!("Terminal contribution calendar with GitHub-style activity heatmaps");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>       Read configuration from the given TOML file");
                println!("  -y, --year <YEAR>         Start on the given year instead of the last");
                println!("                            year");
                println!("  -t, --theme <NAME>        Use the given color theme");
                println!("  -s, --scheme <SCHEME>     Color scheme: light, dark, or system");
                println!("  -w, --week-start <DAY>    First day of the week: sunday or monday");
                println!("      --data <DIR>          Read <DIR>/<username>.json instead of");
                println!("                            querying GitHub");
                println!("      --demo                Show generated sample data");
                println!("      --log-file <FILE>     Write logs to the given file");
                println!("  -h, --help                Display this help message and exit");
                println!("  -V, --version             Show the program version and exit");
                println!();
                println!("Set {TOKEN_VAR} to query GitHub with an access token.");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

impl RunOptions {
    fn run(self) -> anyhow::Result<()> {
        if let Some(path) = &self.log_file {
            init_logging(path)?;
        }
        // Must be queried before any threads are spawned
        let today = OffsetDateTime::now_local()
            .context("failed to determine local date")?
            .date();
        let config = self.config()?;
        let shade = config
            .color_scheme
            .resolve(std::env::var("COLORFGBG").ok().as_deref());
        let source = self.source()?;
        let subject = self
            .username
            .clone()
            .unwrap_or_else(|| String::from(DEMO_SUBJECT));
        tracing::info!(%subject, source = ?source, "Starting");
        let loader = Loader::new(source, subject);
        let app = App::new(&config, shade, today, loader, self.year.map(Period::Year))?;
        with_terminal(|mut terminal| {
            terminal.hide_cursor().context("failed to hide cursor")?;
            app.run(terminal)?;
            Ok(())
        })
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(theme) = &self.theme {
            config.theme.clone_from(theme);
        }
        if let Some(scheme) = self.scheme {
            config.color_scheme = scheme;
        }
        if let Some(week_start) = self.week_start {
            config.week_start = week_start;
        }
        config.validate()?;
        Ok(config)
    }

    fn source(&self) -> anyhow::Result<Arc<dyn DataSource>> {
        if self.demo {
            Ok(Arc::new(DemoSource))
        } else if let Some(dir) = &self.data {
            Ok(Arc::new(FileSource::new(dir.clone())))
        } else {
            let token = std::env::var(TOKEN_VAR).ok().filter(|t| !t.trim().is_empty());
            if token.is_none() {
                tracing::warn!("{TOKEN_VAR} not set; GitHub may refuse the query");
            }
            let mut github = GitHubSource::new(token).context("failed to build HTTP client")?;
            if let Ok(endpoint) = std::env::var(ENDPOINT_VAR) {
                github = github.with_endpoint(endpoint);
            }
            Ok(Arc::new(github))
        }
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("ghcal=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = crossterm::execute!(io::stdout(), EnableMouseCapture)
        .context("failed to enable mouse capture")
        .and_then(|()| func(terminal));
    if let Err(e) = crossterm::execute!(io::stdout(), DisableMouseCapture) {
        tracing::warn!(error = %e, "Failed to disable mouse capture");
    }
    ratatui::restore();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_iter(
            std::iter::once("ghcal").chain(args.iter().copied()),
        ))
    }

    #[test]
    fn test_username_only() {
        assert_eq!(
            parse(&["octocat"]).unwrap(),
            Command::Run(RunOptions {
                username: Some(String::from("octocat")),
                ..RunOptions::default()
            })
        );
    }

    #[test]
    fn test_all_options() {
        let cmd = parse(&[
            "-c",
            "ghcal.toml",
            "--year=2023",
            "--theme",
            "aurora",
            "-s",
            "light",
            "--week-start",
            "monday",
            "--data",
            "data",
            "--log-file",
            "ghcal.log",
            "octocat",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(RunOptions {
                username: Some(String::from("octocat")),
                config: Some(PathBuf::from("ghcal.toml")),
                year: Some(2023),
                theme: Some(String::from("aurora")),
                scheme: Some(ColorScheme::Light),
                week_start: Some(WeekStart::Monday),
                data: Some(PathBuf::from("data")),
                demo: false,
                log_file: Some(PathBuf::from("ghcal.log")),
            })
        );
    }

    #[test]
    fn test_demo_needs_no_username() {
        assert_eq!(
            parse(&["--demo"]).unwrap(),
            Command::Run(RunOptions {
                demo: true,
                ..RunOptions::default()
            })
        );
    }

    #[test]
    fn test_bad_args() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["octocat", "hubot"]).is_err());
        assert!(parse(&["-y", "soon", "octocat"]).is_err());
        assert!(parse(&["-w", "friday", "octocat"]).is_err());
        assert!(parse(&["--demo", "--data", "dir"]).is_err());
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["octocat", "--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_overrides() {
        let opts = RunOptions {
            theme: Some(String::from("aurora")),
            week_start: Some(WeekStart::Monday),
            ..RunOptions::default()
        };
        let config = opts.config().unwrap();
        assert_eq!(config.theme, "aurora");
        assert_eq!(config.week_start, WeekStart::Monday);
        assert_eq!(config.color_scheme, ColorScheme::System);
    }
}
