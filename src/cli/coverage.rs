use std::path::PathBuf;

use tracelink::{
    Config, storage,
    trace::{extract_ancestor_reference_index, flag_uncovered},
};
use tracing::instrument;

use super::terminal::{Colorize, print_warnings};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The requirements document to check
    requirements: PathBuf,

    /// The design document tracing to the requirements
    design: PathBuf,

    /// Only check requirements verified by these teams (defaults to the
    /// configured teams)
    #[arg(long, value_delimiter = ',')]
    team: Vec<String>,

    /// Where to write the flagged requirements; overwritten in place if
    /// omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut requirements = storage::load_document(&self.requirements, &config.system)?;
        let design = storage::load_document(&self.design, &config.system)?;
        let teams = if self.team.is_empty() {
            config.verification_teams.clone()
        } else {
            self.team
        };

        let forward = extract_ancestor_reference_index(&design.root, &config.system);
        let covered = forward.links.reversed();
        let mut warnings = forward.warnings;
        let uncovered = flag_uncovered(
            &mut requirements.root,
            &covered,
            &teams,
            &config.system,
            config.separator(),
        );

        let output = self.output.unwrap_or(self.requirements);
        storage::save_document(&output, &requirements)?;

        if uncovered.is_empty() {
            println!("{}", "Every requirement is covered".success());
        } else {
            println!(
                "{} requirement(s) without design coverage",
                uncovered.len().to_string().error()
            );
        }
        warnings.extend(uncovered);
        print_warnings(&warnings);
        Ok(())
    }
}
