use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

mod catmaid;
mod nml;
mod terminal;

use anyhow::Context;
use catmaid::Catmaid;
use clap::ArgAction;
use nml::Nml;
use nml_catmaid::{Config, ConvertError, storage};
use terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let mut settings = Settings::load(self.config)?;
        self.command.run(&mut settings)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries converted documents
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Convert an NML tracing into a CATMAID JSON export
    Catmaid(Catmaid),

    /// Convert a CATMAID JSON export into an NML tracing
    Nml(Nml),
}

impl Command {
    fn run(self, settings: &mut Settings) -> anyhow::Result<()> {
        match self {
            Self::Catmaid(command) => command.run(settings)?,
            Self::Nml(command) => command.run()?,
        }
        Ok(())
    }
}

/// The loaded configuration and where it came from.
#[derive(Debug)]
pub struct Settings {
    path: Option<PathBuf>,
    config: Config,
}

impl Settings {
    /// Loads the configuration file, if one was named.
    ///
    /// A named file that does not exist yet yields the defaults, so that
    /// values entered interactively can be saved to it.
    fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = match &path {
            Some(path) if path.exists() => Config::load(path).map_err(|e| anyhow::anyhow!(e))?,
            _ => Config::default(),
        };
        Ok(Self { path, config })
    }

    /// Writes the configuration back to the file it was loaded from.
    fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.path {
            self.config.save(path).map_err(|e| anyhow::anyhow!(e))?;
            tracing::info!("saved configuration to {}", path.display());
        }
        Ok(())
    }
}

/// Reads the whole input document from a file, or stdin if none is given.
fn read_source(source: Option<&Path>) -> anyhow::Result<String> {
    match source {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            Ok(buffer)
        }
    }
}

/// Writes the converted document to a file, or stdout if none is given.
fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("failed to write standard output")?;
            stdout.flush().context("failed to write standard output")?;
        }
    }
    Ok(())
}

/// Prints an error and its causes to stderr.
pub fn report(error: &anyhow::Error) {
    eprintln!("{} {error}", "error:".error());
    for cause in error.chain().skip(1) {
        eprintln!("  {} {cause}", "caused by:".dim());
    }
}

/// Maps an error onto the process exit code.
///
/// `2` marks unreadable input documents and `3` marks tracings that could
/// not be converted.
pub fn exit_code(error: &anyhow::Error) -> ExitCode {
    ExitCode::from(status(error))
}

fn status(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<ConvertError>().is_some() {
        3
    } else if error.downcast_ref::<storage::nml::Error>().is_some()
        || error.downcast_ref::<storage::catmaid::Error>().is_some()
    {
        2
    } else {
        1
    }
}
