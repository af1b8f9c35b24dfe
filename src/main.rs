mod app;
mod config;
mod datemath;
mod help;
mod logging;
mod model;
mod store;
mod theme;
mod today;
mod weather;
mod widget;
use crate::app::App;
use crate::config::{resolve_data_dir, Config, DATA_DIR_ENV};
use crate::datemath::DateKey;
use crate::model::CalendarModel;
use crate::store::{EventStore, FileStorage};
use crate::weather::OpenMeteo;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

#[derive(Clone, Debug, PartialEq)]
enum Command {
    Run(Options),
    Help,
    Version,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Options {
    data_dir: Option<PathBuf>,
    location: Option<weather::Location>,
    verbosity: u8,
    date: Option<DateKey>,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = Options::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('d') | Arg::Long("data-dir") => {
                    opts.data_dir = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('l') | Arg::Long("location") => {
                    opts.location = Some(parser.value()?.parse()?);
                }
                Arg::Short('v') | Arg::Long("verbose") => {
                    opts.verbosity = opts.verbosity.saturating_add(1);
                }
                Arg::Value(value) if opts.date.is_none() => {
                    opts.date = Some(value.parse()?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(opts))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opts) => {
                // Must happen before any other thread exists
                let now = OffsetDateTime::now_local().context("failed to determine local date")?;
                let config = opts.into_config()?;
                std::fs::create_dir_all(&config.data_dir).with_context(|| {
                    format!(
                        "failed to create data directory {}",
                        config.data_dir.display()
                    )
                })?;
                logging::init(config.verbosity, &config.log_path())?;
                info!(data_dir = %config.data_dir.display(), "starting");
                let store = EventStore::new(FileStorage::new(&config.data_dir));
                let mut model = CalendarModel::new(now.date(), store);
                if let Some(date) = config.date {
                    model.select_day(date);
                }
                let app = App::new(model, now.offset(), OpenMeteo::new(), config.location);
                with_terminal(|terminal| {
                    app.run(terminal).context("terminal I/O failed")?;
                    Ok(())
                })
            }
            Command::Help => {
                println!("Usage: moncal [OPTIONS] [YYYY-MM-DD]");
                println!();
                println!("Terminal month calendar with ISO week numbers and per-day notes");
                println!();
                println!("Options:");
                println!("  -d, --data-dir DIR     Store events and settings in DIR");
                println!("                         [default: ${DATA_DIR_ENV} or the platform data directory]");
                println!("  -l, --location LAT,LON Look up the weather at this location");
                println!("  -v, --verbose          Log more to moncal.log; repeat for more detail");
                println!("  -h, --help             Display this help message and exit");
                println!("  -V, --version          Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

impl Options {
    fn into_config(self) -> anyhow::Result<Config> {
        let data_dir = resolve_data_dir(
            self.data_dir,
            std::env::var_os(DATA_DIR_ENV),
            dirs::data_local_dir(),
        )
        .context("could not determine data directory; pass --data-dir")?;
        Ok(Config {
            data_dir,
            location: self.location,
            verbosity: self.verbosity,
            date: self.date,
        })
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
