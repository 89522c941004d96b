use std::path::PathBuf;

use tracelink::{
    Config, storage,
    trace::{design_items, extract_ancestor_reference_index, extract_terminal_index, linked_test_cases, walk},
};
use tracing::instrument;

use super::terminal::{Colorize, print_warnings};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The design document
    design: PathBuf,

    /// Write the design item → requirement links to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Qualify identifiers with the configured document prefixes
    #[arg(long)]
    qualified: bool,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let document = storage::load_document(&self.design, &config.system)?;
        let separator = config.separator();

        let mut warnings = document.duplicate_ids();
        let canonical = extract_terminal_index(&document.root, &config.prefixes.tds);
        let references = extract_ancestor_reference_index(&document.root, &config.system);
        warnings.extend(canonical.warnings);
        warnings.extend(references.warnings);

        let items = design_items(&document.root, separator);
        println!("{} design item(s) in {}", items.len().to_string().info(), document.name);
        for item in &items {
            let requirements = references.links.get(&item.id).unwrap_or_default();
            let test_cases = walk::find_by_id(&document.root, &item.id)
                .and_then(|path| document.root.get(&path))
                .map(|node| linked_test_cases(node, &config.system))
                .unwrap_or_default();
            let id = canonical
                .links
                .get(&item.id)
                .and_then(<[String]>::first)
                .map_or(item.id.as_str(), String::as_str);
            let status = if requirements.is_empty() {
                "no requirement".warning()
            } else {
                requirements.join(", ").success()
            };
            println!("  {} {} {}", id.dim(), item.title, status);
            if !test_cases.is_empty() {
                println!("      {} {}", "tested by".dim(), test_cases.join(", "));
            }
        }
        print_warnings(&warnings);

        let links = if self.qualified {
            let pfs = config.prefixes.pfs.first().map_or("", String::as_str);
            references.links.prefixed(&config.prefixes.tds, pfs)
        } else {
            references.links
        };
        if let Some(output) = self.output.as_deref() {
            super::emit_links(&links, Some(output))?;
        }
        Ok(())
    }
}
