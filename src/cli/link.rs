use std::path::PathBuf;

use tracelink::{
    Config, storage,
    trace::{TargetMode, linker},
};
use tracing::instrument;

use super::terminal::{Colorize, print_warnings};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The document receiving the grafted content
    destination: PathBuf,

    /// The document the content is taken from
    source: PathBuf,

    /// Links from destination keys to source keys
    #[arg(short, long)]
    links: PathBuf,

    /// Graft under terminal nodes, keyed by identifier, instead of under
    /// leaves keyed by label
    #[arg(long)]
    terminals: bool,

    /// Where to write the linked document; the destination is overwritten if
    /// omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut destination = storage::load_document(&self.destination, &config.system)?;
        let mut source = storage::load_document(&self.source, &config.system)?;
        let links = storage::load_links(&self.links)?;
        let mode = if self.terminals {
            TargetMode::Terminals
        } else {
            TargetMode::Leaves
        };

        let mut warnings = destination.duplicate_ids();
        let report = linker::link(
            &mut destination.root,
            &mut source.root,
            &links,
            mode,
            config.separator(),
        );
        warnings.extend(report.warnings);

        let output = self.output.unwrap_or(self.destination);
        storage::save_document(&output, &destination)?;

        println!(
            "Linked {} subtree(s) from {} into {}",
            report.grafted.to_string().success(),
            source.name,
            output.display()
        );
        if report.flagged > 0 {
            println!(
                "{} node(s) flagged as missing traceability",
                report.flagged.to_string().warning()
            );
        }
        print_warnings(&warnings);
        Ok(())
    }
}
