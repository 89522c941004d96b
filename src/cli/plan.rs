use std::path::PathBuf;

use tracelink::{
    Config, storage,
    trace::{RegressionFilter, TestPlan},
};
use tracing::instrument;

use super::terminal::{Colorize, print_warnings};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The test plan document
    plan: PathBuf,

    /// The highest regression level to run (defaults to the configured
    /// ceiling)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    ceiling: Option<u8>,

    /// Only select test cases for these verification teams
    #[arg(long, value_delimiter = ',')]
    team: Vec<String>,

    /// A previous version of the plan; reports test cases dropped since
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Execution history to attach under each test case
    #[arg(long)]
    history: Option<PathBuf>,

    /// Drop branches holding no test case
    #[arg(long)]
    prune: bool,

    /// Where to write the annotated plan; overwritten in place if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the outcome as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut document = storage::load_document(&self.plan, &config.system)?;
        let plan = TestPlan::new(config.test_case_key().clone(), config.separator());
        let teams = if self.team.is_empty() {
            config.verification_teams.clone()
        } else {
            self.team
        };
        let filter = RegressionFilter::new(self.ceiling.unwrap_or_else(|| config.regression_ceiling()))
            .with_teams(teams);

        if self.prune {
            let dropped = plan.prune_without_entries(&mut document.root);
            tracing::info!("Dropped {dropped} branch(es) without test cases");
        }
        let outcome = plan.diff(&mut document.root, &filter);

        let removed_since = match &self.baseline {
            Some(baseline) => {
                let baseline = storage::load_document(baseline, &config.system)?;
                plan.removed_since(&baseline.root, &document.root)
            }
            None => Vec::new(),
        };
        if let Some(history) = &self.history {
            let history = storage::load_history(history)?;
            let attached = plan.attach_history(&mut document.root, &history);
            tracing::info!("Attached execution history to {attached} test case(s)");
        }

        let output = self.output.unwrap_or(self.plan);
        storage::save_document(&output, &document)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "outcome": outcome,
                    "removed_since_baseline": removed_since,
                }))?
            );
            return Ok(());
        }

        println!(
            "{} test case(s) selected at regression level {}",
            outcome.selected.len().to_string().success(),
            filter.ceiling
        );
        for id in &outcome.selected {
            println!("  {id}");
        }
        if !outcome.removed.is_empty() {
            println!("{} {}", "Removed:".dim(), outcome.removed.join(", "));
        }
        if !outcome.kept.is_empty() {
            println!("{} {}", "Kept:".dim(), outcome.kept.join(", "));
        }
        if !removed_since.is_empty() {
            println!(
                "{} {}",
                "Dropped since baseline:".warning(),
                removed_since.join(", ")
            );
        }
        print_warnings(&outcome.warnings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use tempfile::TempDir;
    use tracelink::Flag;

    use super::*;

    const PLAN: &str = "\
label: Plan
children:
  - label: Smoke
    markers: [regression-1]
    children:
      - label: HDVB-1::boots
  - label: Full
    markers: [regression-level-4]
    children:
      - label: HDVB-2::soaks
      - label: HDVB-3::flaky
        markers: [remove]
";

    #[test]
    fn low_ceiling_collapses_full_suite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.yaml");
        fs::write(&path, PLAN).unwrap();

        Command::try_parse_from(["plan", path.to_str().unwrap(), "--ceiling", "2"])
            .unwrap()
            .run(&Config::default())
            .unwrap();

        let document = storage::load_document(&path, &Config::default().system).unwrap();
        assert!(document.root.children[0].children[0].is_flagged(Flag::Included));
        assert!(document.root.children[1].is_flagged(Flag::Collapsed));
        assert!(document.root.children[1].children[1].is_flagged(Flag::Excluded));
    }

    #[test]
    fn ceiling_above_maximum_is_rejected() {
        assert!(Command::try_parse_from(["plan", "plan.yaml", "--ceiling", "6"]).is_err());
    }
}
