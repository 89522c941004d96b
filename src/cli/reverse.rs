use std::path::PathBuf;

use tracelink::storage;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The links file to invert (YAML or JSON)
    links: PathBuf,

    /// Where to write the inverted links; printed as YAML if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Command {
    #[instrument]
    pub fn run(self) -> anyhow::Result<()> {
        let forward = storage::load_links(&self.links)?;
        let reversed = forward.reversed();
        tracing::info!("{} sources reversed into {} targets", forward.len(), reversed.len());
        super::emit_links(&reversed, self.output.as_deref())
    }
}
