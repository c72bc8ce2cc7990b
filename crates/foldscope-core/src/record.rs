//! Per-file analysis records.

use std::path::PathBuf;
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Format a byte count in binary units (KiB, MiB, ...).
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(modified: SystemTime, created: Option<SystemTime>) -> Self {
        Self { modified, created }
    }
}

/// Size, encoding and line figures for a decoded text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Encoding label used to decode the file.
    pub encoding: CompactString,
    /// Number of characters after decoding.
    pub chars: usize,
    /// Number of newline-delimited lines.
    pub lines: usize,
}

/// Why a configuration file exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigPurpose {
    /// Declares the project's dependencies (package.json, pyproject.toml, ...).
    DependencyManagement,
}

impl ConfigPurpose {
    /// Stable label used by presenters.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigPurpose::DependencyManagement => "dependency_management",
        }
    }
}

/// Result of classifying one file's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentAnalysis {
    /// Non-textual content; bytes were never read.
    Binary,
    /// Text with no recognized category.
    PlainText { text: TextStats },
    /// Source code and the modules it imports.
    Code {
        text: TextStats,
        dependencies: Vec<String>,
    },
    /// Structured configuration.
    Config {
        text: TextStats,
        purpose: Option<ConfigPurpose>,
    },
    /// Documentation with a short preview.
    Doc { text: TextStats, preview: String },
    /// Reading or decoding failed.
    Error { message: String },
}

impl ContentAnalysis {
    /// Text figures, if the file was decoded.
    pub fn text(&self) -> Option<&TextStats> {
        match self {
            ContentAnalysis::PlainText { text }
            | ContentAnalysis::Code { text, .. }
            | ContentAnalysis::Config { text, .. }
            | ContentAnalysis::Doc { text, .. } => Some(text),
            ContentAnalysis::Binary | ContentAnalysis::Error { .. } => None,
        }
    }

    /// Dependencies extracted from source code (empty for other kinds).
    pub fn dependencies(&self) -> &[String] {
        match self {
            ContentAnalysis::Code { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    /// Configuration purpose, if tagged.
    pub fn purpose(&self) -> Option<ConfigPurpose> {
        match self {
            ContentAnalysis::Config { purpose, .. } => *purpose,
            _ => None,
        }
    }

    /// Documentation preview, if any.
    pub fn preview(&self) -> Option<&str> {
        match self {
            ContentAnalysis::Doc { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Error message, if analysis failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            ContentAnalysis::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Short label for the variant.
    pub fn label(&self) -> &'static str {
        match self {
            ContentAnalysis::Binary => "binary",
            ContentAnalysis::PlainText { .. } => "text",
            ContentAnalysis::Code { .. } => "code",
            ContentAnalysis::Config { .. } => "configuration",
            ContentAnalysis::Doc { .. } => "documentation",
            ContentAnalysis::Error { .. } => "error",
        }
    }
}

/// Everything learned about one admitted file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root.
    pub path: String,
    /// Absolute path.
    pub absolute_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size.
    pub size_human: String,
    /// File timestamps.
    pub timestamps: Timestamps,
    /// Detected media type, e.g. `text/x-python`.
    pub media_type: CompactString,
    /// Content classification.
    pub analysis: ContentAnalysis,
}

impl FileRecord {
    /// Create a new record, deriving the human-readable size.
    pub fn new(
        path: impl Into<String>,
        absolute_path: impl Into<PathBuf>,
        size: u64,
        timestamps: Timestamps,
        media_type: impl Into<CompactString>,
        analysis: ContentAnalysis,
    ) -> Self {
        Self {
            path: path.into(),
            absolute_path: absolute_path.into(),
            size,
            size_human: format_size(size),
            timestamps,
            media_type: media_type.into(),
            analysis,
        }
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.timestamps.modified
    }

    /// Text encoding, if the file was decoded.
    pub fn encoding(&self) -> Option<&str> {
        self.analysis.text().map(|t| t.encoding.as_str())
    }

    /// Line count, if the file was decoded.
    pub fn line_count(&self) -> Option<usize> {
        self.analysis.text().map(|t| t.lines)
    }
}
