use std::{
    ffi::OsStr,
    fs,
    io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{Document, Node, OwningSystem},
    trace::{index::TraceLinks, plan::ExecutionHistory},
};

/// Translates between an on-disk format and [`Node`] trees.
pub trait DocumentFormat {
    /// Parses a whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` is not a valid document in this format.
    fn parse(&self, input: &str) -> Result<Node, LoadError>;

    /// Renders a whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be represented in this format.
    fn serialize(&self, root: &Node) -> Result<String, SaveError>;
}

/// Plain outline files: a [`Node`] tree written as YAML or JSON.
///
/// Every node field, presentation attributes included, survives a round
/// trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl Outline {
    /// Picks the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str)? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn for_path(path: &Path) -> Result<Self, LoadError> {
        Self::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))
    }

    fn decode<T: DeserializeOwned>(self, input: &str) -> Result<T, LoadError> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(input)?,
            Self::Json => serde_json::from_str(input)?,
        })
    }

    fn encode<T: Serialize>(self, value: &T) -> Result<String, SaveError> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(value)?,
            Self::Json => {
                let mut json = serde_json::to_string_pretty(value)?;
                json.push('\n');
                json
            }
        })
    }
}

impl DocumentFormat for Outline {
    fn parse(&self, input: &str) -> Result<Node, LoadError> {
        self.decode(input)
    }

    fn serialize(&self, root: &Node) -> Result<String, SaveError> {
        self.encode(root)
    }
}

/// Errors that can occur when reading a document or a links file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file was not found.
    #[error("file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read file")]
    Io(#[from] io::Error),
    /// The YAML content could not be parsed.
    #[error("invalid YAML")]
    Yaml(#[from] serde_yaml::Error),
    /// The JSON content could not be parsed.
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    /// The file extension names no known format.
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Errors that can occur when writing a document or a links file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// An I/O error occurred.
    #[error("failed to write file")]
    Io(#[from] io::Error),
    /// The value could not be rendered as YAML.
    #[error("failed to render YAML")]
    Yaml(#[from] serde_yaml::Error),
    /// The value could not be rendered as JSON.
    #[error("failed to render JSON")]
    Json(#[from] serde_json::Error),
    /// The file extension names no known format.
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(io_error),
    })
}

/// Loads the outline document at `path`, classified against `system`.
///
/// The document is named after the file stem.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument(level = "debug", skip(system))]
pub fn load_document(path: &Path, system: &OwningSystem) -> Result<Document, LoadError> {
    let format = Outline::for_path(path)?;
    let root = format.parse(&read(path)?)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Document::new(name, root, system))
}

/// Writes `document` to `path` in the format named by its extension.
///
/// # Errors
///
/// Returns an error if the format is unknown or the file cannot be written.
#[instrument(level = "debug", skip(document), fields(document = %document.name))]
pub fn save_document(path: &Path, document: &Document) -> Result<(), SaveError> {
    let format = Outline::from_path(path).ok_or_else(|| SaveError::UnsupportedFormat(path.to_path_buf()))?;
    fs::write(path, format.serialize(&document.root)?)?;
    Ok(())
}

/// Loads a links file: a list of `{source, targets}` records.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument(level = "debug")]
pub fn load_links(path: &Path) -> Result<TraceLinks, LoadError> {
    Outline::for_path(path)?.decode(&read(path)?)
}

/// Writes a links file.
///
/// # Errors
///
/// Returns an error if the format is unknown or the file cannot be written.
#[instrument(level = "debug", skip(links))]
pub fn save_links(path: &Path, links: &TraceLinks) -> Result<(), SaveError> {
    let format = Outline::from_path(path).ok_or_else(|| SaveError::UnsupportedFormat(path.to_path_buf()))?;
    fs::write(path, format.encode(links)?)?;
    Ok(())
}

/// Loads an execution history file: test keys mapped to their
/// `{plan, status}` records.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument(level = "debug")]
pub fn load_history(path: &Path) -> Result<ExecutionHistory, LoadError> {
    Outline::for_path(path)?.decode(&read(path)?)
}

/// Expands `paths` into the outline files they name.
///
/// Files are kept as given; directories are walked recursively for files
/// with a known extension. Hidden directories are skipped.
#[must_use]
pub fn collect_outline_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                WalkDir::new(path)
                    .into_iter()
                    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .filter(|entry| Outline::from_path(entry.path()).is_some())
                    .map(walkdir::DirEntry::into_path)
                    .collect()
            } else {
                vec![path.clone()]
            }
        })
        .collect()
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{Flag, Marker, NodeKind},
        trace::{index::TraceLink, plan::ExecutionStatus},
    };

    fn sample() -> Node {
        let mut leaf = Node::new("3", "1.1::Cold")
            .with_marker(Marker::Regression(2))
            .with_marker(Marker::Other("idea".into()));
        leaf.flag(Flag::Collapsed);
        leaf.attributes.insert("color".into(), "#ff0000".into());
        Node::new("1", "Design").with_child(
            Node::new("2", "1::Boot")
                .with_child(leaf)
                .with_child(Node::new("4", "req").with_reference("http://testlink/linkto.php?item=req&id=5")),
        )
    }

    #[test]
    fn yaml_and_json_round_trip_every_field() {
        let root = sample();
        for format in [Outline::Yaml, Outline::Json] {
            let text = format.serialize(&root).unwrap();
            assert_eq!(format.parse(&text).unwrap(), root, "{format:?}");
        }
    }

    #[test]
    fn minimal_yaml_uses_defaults() {
        let root = Outline::Yaml
            .parse("label: Plan\nchildren:\n  - id: '7'\n    label: HDVB-1::x\n    markers: [keep]\n")
            .unwrap();

        assert_eq!(root.id, None);
        assert_eq!(root.children[0].kind, NodeKind::Content);
        assert!(root.children[0].has_marker(&Marker::Keep));
    }

    #[test]
    fn documents_are_classified_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("design.yaml");
        save_document(&path, &Document::new("design", sample(), &OwningSystem::default())).unwrap();

        let document = load_document(&path, &OwningSystem::default()).unwrap();

        assert_eq!(document.name, "design");
        assert!(document.root.children[0].children[1].is_link());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let error = load_document(&dir.path().join("absent.json"), &OwningSystem::default()).unwrap_err();
        assert!(matches!(error, LoadError::NotFound));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let error = load_links(Path::new("links.txt")).unwrap_err();
        assert!(matches!(error, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn links_files_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.json");
        let links: TraceLinks = vec![TraceLink::new("R1", ["P1", "P2"]), TraceLink::new("R2", ["P1"])].into();

        save_links(&path, &links).unwrap();

        assert_eq!(load_links(&path).unwrap(), links);
    }

    #[test]
    fn history_files_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.yaml");
        fs::write(&path, "HDVB-1:\n  - plan: Cycle 1\n    status: passed\n  - plan: Cycle 2\n    status: not-run\n").unwrap();

        let history = load_history(&path).unwrap();

        assert_eq!(history.get("HDVB-1").len(), 2);
        assert_eq!(history.get("HDVB-1")[1].status, ExecutionStatus::NotRun);
    }

    #[test]
    fn directories_are_walked_for_outlines() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        for name in ["a.yaml", "nested/b.json", "notes.txt", ".hidden/c.yaml"] {
            fs::write(dir.path().join(name), "label: x\n").unwrap();
        }

        let mut paths = collect_outline_paths(&[dir.path().to_path_buf()]);
        paths.sort();

        assert_eq!(
            paths,
            vec![dir.path().join("a.yaml"), dir.path().join("nested/b.json")]
        );
    }
}
