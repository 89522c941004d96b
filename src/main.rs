//! `tracelink`: maintain traceability between requirement, design and test
//! documents.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
