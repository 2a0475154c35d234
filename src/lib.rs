//! Sample library catalog - shared modules for the `sample-catalog` binary.
//!
//! Pipeline: discovery -> validation -> catalog -> completeness check ->
//! pattern query -> thumbnails. Each stage also works against a catalog
//! loaded from disk.

pub mod audio;
pub mod cancel;
pub mod completeness;
pub mod discovery;
pub mod error;
pub mod models;
pub mod persist;
pub mod progress;
pub mod query;
pub mod safety;
pub mod spectrogram;
pub mod thumbnail;
pub mod validate;

pub use error::ItemError;
pub use models::{ArtifactKind, Catalog, CatalogEntry};
