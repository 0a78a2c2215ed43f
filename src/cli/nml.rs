use std::path::PathBuf;

use clap::Parser;
use nml_catmaid::{
    Flavor,
    storage::{catmaid, nml},
    to_tracing,
};
use tracing::instrument;

use super::{read_source, terminal::Colorize, write_output};

#[derive(Debug, Parser)]
pub struct Nml {
    /// The CATMAID export to convert (defaults to stdin)
    source: Option<PathBuf>,

    /// Where to write the NML document (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Write the PyKNOSSOS flavour of NML
    #[arg(long)]
    pyknossos: bool,
}

impl Nml {
    #[instrument]
    pub fn run(self) -> anyhow::Result<()> {
        let flavor = if self.pyknossos {
            Flavor::PyKnossos
        } else {
            Flavor::Knossos
        };

        let input = read_source(self.source.as_deref())?;
        let records = catmaid::from_str(&input)?;
        let tracing = to_tracing(&records)?;
        let xml = nml::to_string(&tracing, flavor)?;
        write_output(self.output.as_deref(), &xml)?;

        if let Some(output) = &self.output {
            let summary = format!(
                "wrote {} things with {} nodes to {}",
                tracing.things.len(),
                tracing.node_count(),
                output.display()
            );
            eprintln!("{}", summary.success());
        }
        Ok(())
    }
}
