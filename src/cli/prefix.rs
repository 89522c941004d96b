use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracelink::{Config, storage, trace::numbering};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Number every content node (`1`, `1.1`, ...), replacing old numbers
    Add {
        /// Outline files, or directories to search for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Strip the leading label segment from every content node
    Remove {
        /// Outline files, or directories to search for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (paths, add) = match self {
            Self::Add { paths } => (paths, true),
            Self::Remove { paths } => (paths, false),
        };
        let files = storage::collect_outline_paths(&paths);
        if files.is_empty() {
            anyhow::bail!("No outline files found");
        }

        let failures: Vec<(PathBuf, anyhow::Error)> = files
            .par_iter()
            .filter_map(|path| {
                renumber(path, config, add)
                    .err()
                    .map(|error| (path.clone(), error))
            })
            .collect();

        for path in files.iter().filter(|path| !failures.iter().any(|(failed, _)| failed == *path)) {
            println!("{} {}", "✓".success(), path.display());
        }
        for (path, error) in &failures {
            println!("{} {}: {error:#}", "✗".error(), path.display());
        }
        if !failures.is_empty() {
            anyhow::bail!("{} of {} file(s) could not be processed", failures.len(), files.len());
        }
        Ok(())
    }
}

fn renumber(path: &Path, config: &Config, add: bool) -> anyhow::Result<()> {
    let mut document = storage::load_document(path, &config.system)?;
    if add {
        numbering::add_prefix(&mut document.root, config.separator())?;
    } else {
        numbering::remove_prefix(&mut document.root, config.separator())?;
    }
    storage::save_document(path, &document)?;
    Ok(())
}
