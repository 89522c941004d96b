//! Reading and writing documents and links files.
//!
//! The engine only sees [`Node`](crate::domain::Node) trees. Adapters
//! implementing [`DocumentFormat`] translate files into trees and back.

mod outline;

pub use outline::{
    DocumentFormat, LoadError, Outline, SaveError, collect_outline_paths, load_document,
    load_history, load_links, save_document, save_links,
};
