use std::path::Path;

use non_empty_string::NonEmptyString;
use tracelink::{Config, domain::OwningSystem};
use tracing::instrument;

use super::{CONFIG_FILE, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Test repository prefix; test cases are keyed `<REPOSITORY>-<n>`
    #[arg(long, value_name = "PREFIX")]
    repository: Option<String>,

    /// URL prefix of the requirement/test management service
    #[arg(long, value_name = "URL")]
    url_prefix: Option<String>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Project already initialized (found existing {CONFIG_FILE}); use --force to overwrite"
            );
        }

        let mut config = Config::default();
        if let Some(repository) = self.repository {
            if repository.trim().is_empty() {
                anyhow::bail!("Repository prefix must not be empty");
            }
            config.set_repository(repository);
        }
        if let Some(url_prefix) = self.url_prefix {
            let url_prefix = NonEmptyString::new(url_prefix)
                .map_err(|_| anyhow::anyhow!("URL prefix must not be empty"))?;
            config.system = OwningSystem::new(url_prefix);
        }

        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        println!("Initialized tracelink project in {}", root.display());
        println!("  Created: {}", CONFIG_FILE.success());
        println!(
            "  Test cases: {}",
            config.test_case_key().as_str().info()
        );
        Ok(())
    }
}
