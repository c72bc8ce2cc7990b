//! Per-file analysis for foldscope.
//!
//! This crate looks at one file at a time, independent of how it was found:
//!
//! - **Media type detection** - magic bytes, then text sniffing, then extension
//! - **Content classification** - encoding, line counts, and a category-specific
//!   payload (dependencies, configuration purpose, documentation preview)
//! - **Dependency extraction** - an extension-indexed table of extractors
//!   (tree-sitter for Python, regular expressions for JavaScript/TypeScript)
//! - **Related-file grouping** - clusters files by overlapping filename stems
//!
//! ```rust,no_run
//! use std::path::Path;
//! use foldscope_analyze::{ContentClassifier, media};
//!
//! let path = Path::new("src/app.py");
//! let media_type = media::detect(path);
//! let analysis = ContentClassifier::new().classify(path, &media_type);
//!
//! println!("{media_type}: {:?}", analysis.dependencies());
//! ```

mod classify;
pub mod deps;
pub mod media;
mod related;

pub use classify::{
    ContentClassifier, ENCODING_SAMPLE_LEN, FileCategory, PREVIEW_CHARS, detect_encoding, preview,
};
pub use deps::{DependencyExtractor, DependencyExtractors, EcmaScriptImports, PythonImports};
pub use related::{DEFAULT_MIN_STEM_LEN, RelationGrouper};

// Re-export core types
pub use foldscope_core::{ConfigPurpose, ContentAnalysis, TextStats};
