use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::RwLock,
};

use anyhow::{Result, anyhow};
use app::App;
use clap::Parser;
use config::Config;
use once_cell::sync::Lazy;
use outline::{
    export::{export_outline, to_json},
    extraction::{MupdfSource, OutlineSource},
    transform::transform_outline,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod config;
mod icons;
mod outline;
mod watch;

pub static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

#[derive(Parser, Debug)]
#[command(version, name = "miro-outline", about = "A pdf outline viewer")]
struct Args {
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Write the outline json into DIR and exit without opening a window
    #[arg(long, value_name = "DIR", requires = "path")]
    export: Option<PathBuf>,

    /// Print the outline json to stdout and exit
    #[arg(long, requires = "path", conflicts_with = "export")]
    print: bool,

    /// Read the configuration from FILE instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.clone());
    let options = config.transform_options();
    *CONFIG.write().map_err(|_| anyhow!("Config lock poisoned"))? = config;

    if let Some(path) = &args.path
        && (args.print || args.export.is_some())
    {
        return run_headless(path, &args);
    }

    iced::application(App::title, App::update, App::view)
        .antialiasing(true)
        .theme(App::theme)
        .subscription(App::subscription)
        .run_with(move || {
            let mut state = App::new(options);
            let task = match args.path {
                Some(p) => state.update(app::AppMessage::OpenFile(p)),
                None => iced::Task::none(),
            };
            (state, task)
        })?;
    Ok(())
}

/// Falls back to the defaults when no config file exists or it can't be parsed.
fn load_config(path: Option<PathBuf>) -> Config {
    let result = match path {
        Some(p) => Config::from_file(p),
        None => match Config::system_config_path() {
            Ok(p) if p.exists() => Config::from_file(p),
            Ok(_) => {
                info!("No config file found, using defaults");
                return Config::default();
            }
            Err(e) => Err(e),
        },
    };
    result.unwrap_or_else(|e| {
        error!("Could not load config: {e:#}");
        Config::default()
    })
}

fn run_headless(path: &Path, args: &Args) -> Result<()> {
    let options = CONFIG
        .read()
        .map_err(|_| anyhow!("Config lock poisoned"))?
        .transform_options();
    let raw = MupdfSource::new(path).fetch_outline()?;
    let outline = transform_outline(raw.as_deref(), options)?;

    if args.print {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", to_json(&outline)?)?;
    } else if let Some(dir) = &args.export {
        let export_name = CONFIG
            .read()
            .map_err(|_| anyhow!("Config lock poisoned"))?
            .export_name
            .clone();
        if let Some(written) = export_outline(Some(&outline), dir, &export_name)? {
            info!("Wrote {written:?}");
        }
    }
    Ok(())
}
