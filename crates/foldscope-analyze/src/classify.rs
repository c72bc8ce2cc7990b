//! Content classification.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use compact_str::CompactString;
use encoding_rs::{Encoding, UTF_8};

use foldscope_core::{ConfigPurpose, ContentAnalysis, TextStats};

use crate::deps::DependencyExtractors;
use crate::media;

/// Bytes read for encoding detection (1 MiB).
pub const ENCODING_SAMPLE_LEN: usize = 1024 * 1024;

/// Characters kept in a documentation preview.
pub const PREVIEW_CHARS: usize = 200;

/// Extensions treated as source code.
const CODE_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "cpp"];

/// Extensions treated as structured configuration.
const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Extensions treated as documentation.
const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt"];

/// Configuration files that declare dependencies.
const DEPENDENCY_MANIFESTS: &[&str] = &["package.json", "pyproject.toml", "Cargo.toml", "composer.json"];

/// Category a file falls into by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Code,
    Config,
    Doc,
    Other,
}

impl FileCategory {
    /// Categorize a lowercase extension.
    pub fn from_extension(extension: &str) -> Self {
        if CODE_EXTENSIONS.contains(&extension) {
            FileCategory::Code
        } else if CONFIG_EXTENSIONS.contains(&extension) {
            FileCategory::Config
        } else if DOC_EXTENSIONS.contains(&extension) {
            FileCategory::Doc
        } else {
            FileCategory::Other
        }
    }
}

/// Classifies file content into a [`ContentAnalysis`].
///
/// Classification is a pure function of the file's bytes, extension and
/// media type; running it twice on an unchanged file gives the same result.
#[derive(Debug, Clone, Default)]
pub struct ContentClassifier {
    extractors: DependencyExtractors,
}

impl ContentClassifier {
    /// Create a classifier with the default dependency extractors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with a custom extractor table.
    pub fn with_extractors(extractors: DependencyExtractors) -> Self {
        Self { extractors }
    }

    /// Classify the file at `path` whose media type is `media_type`.
    pub fn classify(&self, path: &Path, media_type: &str) -> ContentAnalysis {
        if !media::is_textual(media_type) {
            return ContentAnalysis::Binary;
        }

        let (encoding, content) = match read_text(path) {
            Ok(decoded) => decoded,
            Err(message) => return ContentAnalysis::Error { message },
        };

        let text = TextStats {
            encoding: CompactString::new(encoding.name()),
            chars: content.chars().count(),
            lines: content.lines().count(),
        };

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match FileCategory::from_extension(&extension) {
            FileCategory::Code => ContentAnalysis::Code {
                dependencies: self
                    .extractors
                    .extract(&extension, &content)
                    .into_iter()
                    .collect(),
                text,
            },
            FileCategory::Config => {
                let is_manifest = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| DEPENDENCY_MANIFESTS.contains(&name));
                ContentAnalysis::Config {
                    text,
                    purpose: is_manifest.then_some(ConfigPurpose::DependencyManagement),
                }
            }
            FileCategory::Doc => ContentAnalysis::Doc {
                preview: preview(&content),
                text,
            },
            FileCategory::Other => ContentAnalysis::PlainText { text },
        }
    }
}

/// Read and decode a whole file, detecting its encoding from the first MiB.
fn read_text(path: &Path) -> Result<(&'static Encoding, String), String> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| e.to_string())?;

    let sample = &bytes[..bytes.len().min(ENCODING_SAMPLE_LEN)];
    let encoding = detect_encoding(sample);

    let (content, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(format!("'{}' codec can't decode {}", encoding.name(), path.display()));
    }
    Ok((encoding, content.into_owned()))
}

/// Guess the encoding of a byte sample, falling back to UTF-8.
pub fn detect_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }
    if sample.is_empty() || utf8_prefix_valid(sample) {
        return UTF_8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(sample, true);
    detector.guess(None, true)
}

/// Valid UTF-8, allowing the sample to cut a multi-byte sequence at its end.
fn utf8_prefix_valid(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none() && sample.len() == ENCODING_SAMPLE_LEN,
    }
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended when truncated.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
