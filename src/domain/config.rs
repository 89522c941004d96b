use std::path::Path;

use non_empty_string::NonEmptyString;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::label::DEFAULT_SEPARATOR;

/// The highest regression level. Entries without any level marker are
/// treated as having this level.
pub const MAX_REGRESSION_LEVEL: u8 = 5;

/// Errors raised while loading, validating or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
    /// The configuration file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
    /// A setting that must not be empty is empty.
    #[error("Invalid config: '{0}' must not be empty")]
    Empty(&'static str),
    /// The test-case key pattern is not a valid regular expression.
    #[error("Invalid test case pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// The system owning the link nodes: the requirement/test management service
/// whose URLs appear as node references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwningSystem {
    url_prefix: NonEmptyString,
    requirement_marker: String,
    test_case_marker: String,
    id_delimiter: char,
}

impl OwningSystem {
    /// Creates an owning system recognised by the given URL prefix, using the
    /// default reference markers.
    #[must_use]
    pub fn new(url_prefix: NonEmptyString) -> Self {
        Self {
            url_prefix,
            requirement_marker: default_requirement_marker(),
            test_case_marker: default_test_case_marker(),
            id_delimiter: default_id_delimiter(),
        }
    }

    /// The URL prefix identifying references into this system.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        self.url_prefix.as_str()
    }

    /// Whether `reference` points into this system.
    #[must_use]
    pub fn owns(&self, reference: &str) -> bool {
        reference.starts_with(self.url_prefix.as_str())
    }

    /// Whether `reference` points at a requirement in this system.
    #[must_use]
    pub fn is_requirement(&self, reference: &str) -> bool {
        self.owns(reference) && reference.contains(&self.requirement_marker)
    }

    /// Whether `reference` points at a test case in this system.
    #[must_use]
    pub fn is_test_case(&self, reference: &str) -> bool {
        self.owns(reference) && reference.contains(&self.test_case_marker)
    }

    /// The identifier a reference points at: the text after the last id
    /// delimiter, trimmed. `None` if there is no delimiter or nothing after
    /// it.
    #[must_use]
    pub fn target_id<'a>(&self, reference: &'a str) -> Option<&'a str> {
        reference
            .rsplit_once(self.id_delimiter)
            .map(|(_, id)| id.trim())
            .filter(|id| !id.is_empty())
    }
}

impl Default for OwningSystem {
    fn default() -> Self {
        Self::new(default_url_prefix())
    }
}

/// A compiled pattern recognising test-case identifiers (for example
/// `HDVB-10`) at the start of a test plan label.
#[derive(Debug, Clone)]
pub struct TestCaseKey(Regex);

impl TestCaseKey {
    /// Compiles a test-case key pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// The pattern matching `{repository}-{number}` identifiers.
    #[must_use]
    pub fn for_repository(repository: &str) -> Self {
        let pattern = format!(r"^{}-\d+$", regex::escape(repository));
        Self(Regex::new(&pattern).unwrap_or_else(|_| unreachable!("escaped pattern is valid")))
    }

    /// Whether `key` is a test-case identifier.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.0.is_match(key)
    }

    /// The source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for TestCaseKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TestCaseKey {}

/// The document prefixes used to qualify identifiers per document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPrefixes {
    /// Test repository prefix, as in `HDVB-10`.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Prefix of product marketing requirement identifiers.
    #[serde(default)]
    pub pmr: String,

    /// Prefixes of product functional specification identifiers. Several
    /// prefixes are allowed since requirements are reused across projects.
    #[serde(default)]
    pub pfs: Vec<String>,

    /// Prefix of test design specification identifiers.
    #[serde(default)]
    pub tds: String,
}

impl Default for DocumentPrefixes {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            pmr: String::new(),
            pfs: Vec::new(),
            tds: String::new(),
        }
    }
}

impl DocumentPrefixes {
    /// All requirement-like prefixes in matching order: PMR, TDS, then every
    /// PFS prefix. Empty prefixes are skipped.
    #[must_use]
    pub fn requirement_prefixes(&self) -> Vec<&str> {
        [self.pmr.as_str(), self.tds.as_str()]
            .into_iter()
            .chain(self.pfs.iter().map(String::as_str))
            .filter(|prefix| !prefix.is_empty())
            .collect()
    }
}

/// Configuration for traceability linking.
///
/// Every string the engine matches against (URL prefix, separator, key
/// pattern) is supplied here rather than hard-coded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// The system whose URLs mark link nodes.
    pub system: OwningSystem,

    /// The separator inside compound labels.
    separator: NonEmptyString,

    /// Document prefixes.
    pub prefixes: DocumentPrefixes,

    /// Pattern recognising test-case entries in a test plan.
    test_case_key: TestCaseKey,

    /// The regression ceiling used when none is given explicitly.
    regression_ceiling: u8,

    /// The verification teams a test cycle or coverage check is run for.
    /// Empty means every team.
    pub verification_teams: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let prefixes = DocumentPrefixes::default();
        Self {
            system: OwningSystem::default(),
            separator: default_separator(),
            test_case_key: TestCaseKey::for_repository(&prefixes.repository),
            prefixes,
            regression_ceiling: MAX_REGRESSION_LEVEL,
            verification_teams: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Loads the configuration, falling back to the defaults if it cannot be
    /// loaded.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// The separator inside compound labels.
    #[must_use]
    pub fn separator(&self) -> &str {
        self.separator.as_str()
    }

    /// The pattern recognising test-case entries.
    #[must_use]
    pub const fn test_case_key(&self) -> &TestCaseKey {
        &self.test_case_key
    }

    /// The default regression ceiling.
    #[must_use]
    pub const fn regression_ceiling(&self) -> u8 {
        self.regression_ceiling
    }

    /// Sets the test repository prefix, re-deriving the test-case pattern.
    pub fn set_repository(&mut self, repository: String) {
        self.test_case_key = TestCaseKey::for_repository(&repository);
        self.prefixes.repository = repository;
    }
}

fn default_url_prefix() -> NonEmptyString {
    NonEmptyString::new("http://testlink".to_string())
        .unwrap_or_else(|_| unreachable!("literal is not empty"))
}

fn default_separator() -> NonEmptyString {
    NonEmptyString::new(DEFAULT_SEPARATOR.to_string())
        .unwrap_or_else(|_| unreachable!("literal is not empty"))
}

fn default_url_prefix_string() -> String {
    default_url_prefix().as_str().to_string()
}

fn default_separator_string() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_requirement_marker() -> String {
    "req&id".to_string()
}

fn default_test_case_marker() -> String {
    "testcase&id".to_string()
}

const fn default_id_delimiter() -> char {
    '='
}

fn default_repository() -> String {
    "HDVB".to_string()
}

const fn default_ceiling() -> u8 {
    MAX_REGRESSION_LEVEL
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_url_prefix_string")]
        url_prefix: String,

        #[serde(default = "default_requirement_marker")]
        requirement_marker: String,

        #[serde(default = "default_test_case_marker")]
        test_case_marker: String,

        #[serde(default = "default_id_delimiter")]
        id_delimiter: char,

        /// The separator inside compound labels, `::` by default.
        #[serde(default = "default_separator_string")]
        separator: String,

        /// Overrides the `{repository}-{number}` test-case pattern.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        test_case_pattern: Option<String>,

        #[serde(default = "default_ceiling")]
        regression_ceiling: u8,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        verification_teams: Vec<String>,

        #[serde(default)]
        prefixes: DocumentPrefixes,
    },
}

impl TryFrom<Versions> for Config {
    type Error = ConfigError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                url_prefix,
                requirement_marker,
                test_case_marker,
                id_delimiter,
                separator,
                prefixes,
                test_case_pattern,
                regression_ceiling,
                verification_teams,
            } => {
                let url_prefix =
                    NonEmptyString::new(url_prefix).map_err(|_| ConfigError::Empty("url_prefix"))?;
                let separator =
                    NonEmptyString::new(separator).map_err(|_| ConfigError::Empty("separator"))?;
                let test_case_key = match test_case_pattern {
                    Some(pattern) => TestCaseKey::new(&pattern)?,
                    None => TestCaseKey::for_repository(&prefixes.repository),
                };
                Ok(Self {
                    system: OwningSystem {
                        url_prefix,
                        requirement_marker,
                        test_case_marker,
                        id_delimiter,
                    },
                    separator,
                    prefixes,
                    test_case_key,
                    regression_ceiling: regression_ceiling.min(MAX_REGRESSION_LEVEL),
                    verification_teams,
                })
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        let derived = TestCaseKey::for_repository(&config.prefixes.repository);
        let test_case_pattern =
            (config.test_case_key != derived).then(|| config.test_case_key.as_str().to_string());
        Self::V1 {
            url_prefix: config.system.url_prefix.as_str().to_string(),
            requirement_marker: config.system.requirement_marker,
            test_case_marker: config.system.test_case_marker,
            id_delimiter: config.system.id_delimiter,
            separator: config.separator.as_str().to_string(),
            prefixes: config.prefixes,
            test_case_pattern,
            regression_ceiling: config.regression_ceiling,
            verification_teams: config.verification_teams,
        }
    }
}
