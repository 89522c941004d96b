use std::path::{Path, PathBuf};

mod coverage;
mod index;
mod init;
mod link;
mod plan;
mod prefix;
mod reverse;
mod terminal;

use clap::ArgAction;
use tracelink::{Config, storage, trace::index::TraceLinks};

/// The configuration file, looked up in the project root.
pub const CONFIG_FILE: &str = ".tracelink.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The project root, holding the configuration file
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.root)
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

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Write a default configuration file
    Init(init::Command),

    /// Add or remove dotted numbering on document labels
    #[command(subcommand)]
    Prefix(prefix::Command),

    /// List the design items of a design document and the requirements
    /// they trace to
    Index(index::Command),

    /// Invert a links file
    Reverse(reverse::Command),

    /// Graft traced source content into a destination document
    ///
    /// Destination nodes without traceability, or tracing to missing
    /// content, are flagged.
    Link(link::Command),

    /// Flag requirements no design item traces to
    Coverage(coverage::Command),

    /// Select the test cases of the current cycle from a test plan
    Plan(plan::Command),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(root)?,
            Self::Prefix(command) => command.run(&load_config(root))?,
            Self::Index(command) => command.run(&load_config(root))?,
            Self::Reverse(command) => command.run()?,
            Self::Link(command) => command.run(&load_config(root))?,
            Self::Coverage(command) => command.run(&load_config(root))?,
            Self::Plan(command) => command.run(&load_config(root))?,
        }
        Ok(())
    }
}

fn load_config(root: &Path) -> Config {
    Config::load_or_default(&root.join(CONFIG_FILE))
}

/// Writes `links` to `output`, or prints them as YAML.
fn emit_links(links: &TraceLinks, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            storage::save_links(path, links)?;
            println!("Wrote {} links to {}", links.len(), path.display());
        }
        None => print!("{}", serde_yaml::to_string(links)?),
    }
    Ok(())
}
