use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use nml_catmaid::{
    Boilerplate, Flavor,
    domain::Id,
    storage::{catmaid, nml},
    to_records,
};
use tracing::instrument;

use super::{Settings, read_source, terminal::Colorize, write_output};

#[derive(Debug, Parser)]
pub struct Catmaid {
    /// The NML file to convert (defaults to stdin)
    source: Option<PathBuf>,

    /// Where to write the CATMAID export (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// The operator id written to every record
    ///
    /// Falls back to the configuration file, then to an interactive prompt.
    #[arg(short, long)]
    user: Option<Id>,

    /// Creation time written to every record (RFC 3339, defaults to now)
    #[arg(long, value_name = "RFC3339")]
    timestamp: Option<DateTime<Utc>>,

    /// Read the PyKNOSSOS flavour of NML
    #[arg(long)]
    pyknossos: bool,
}

impl Catmaid {
    #[instrument(skip(settings))]
    pub fn run(self, settings: &mut Settings) -> anyhow::Result<()> {
        let user = self.user(settings)?;
        let flavor = if self.pyknossos {
            Flavor::PyKnossos
        } else {
            Flavor::Knossos
        };

        let input = read_source(self.source.as_deref())?;
        let tracing = nml::from_str(&input, flavor)?;
        let records = to_records(&tracing)?;

        let boilerplate = Boilerplate {
            radius: settings.config.radius(),
            confidence: settings.config.confidence(),
            ..Boilerplate::new(user, self.timestamp.unwrap_or_else(Utc::now))
        };
        let json = catmaid::to_string(&records, &boilerplate)?;
        write_output(self.output.as_deref(), &json)?;

        if let Some(output) = &self.output {
            let summary = format!(
                "wrote {} records for {} nodes to {}",
                records.len(),
                tracing.node_count(),
                output.display()
            );
            eprintln!("{}", summary.success());
        }
        Ok(())
    }

    /// Resolves the operator id, asking for it when neither the command line
    /// nor the configuration provides one.
    fn user(&self, settings: &mut Settings) -> anyhow::Result<Id> {
        if let Some(user) = self.user.or_else(|| settings.config.user()) {
            return Ok(user);
        }
        if self.source.is_none() {
            anyhow::bail!(
                "no operator id: pass --user or set `user` in the configuration file when \
                 reading from stdin"
            );
        }

        let user: Id = dialoguer::Input::new()
            .with_prompt("Specify user ID")
            .interact_text()
            .context("failed to read operator id")?;

        settings.config.set_user(user);
        settings.save()?;
        Ok(user)
    }
}
