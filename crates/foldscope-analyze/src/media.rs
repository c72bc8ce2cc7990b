//! Media type detection.
//!
//! Content wins over extension: magic bytes are checked first, then the head
//! of the file is sniffed for text versus binary, and only then is the
//! extension consulted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use compact_str::CompactString;

/// Bytes inspected when sniffing for text.
const SNIFF_LEN: usize = 8 * 1024;

/// Media type reported for empty files without a recognized extension.
pub const EMPTY_MEDIA_TYPE: &str = "inode/x-empty";

/// Media type reported for binary content of unknown format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media type reported when the file cannot be read and the extension is unknown.
pub const UNKNOWN_MEDIA_TYPE: &str = "unknown";

/// `application/*` subtypes whose content is text.
const TEXTUAL_APPLICATION_SUBTYPES: &[&str] = &[
    "json",
    "ld+json",
    "javascript",
    "x-javascript",
    "ecmascript",
    "typescript",
    "xml",
    "xhtml+xml",
    "toml",
    "yaml",
    "x-yaml",
    "x-sh",
    "x-shellscript",
    "x-python",
    "x-python-code",
    "x-httpd-php",
    "x-perl",
    "x-ruby",
    "sql",
    "graphql",
    "x-tex",
    "x-latex",
    "rtf",
    "x-ndjson",
];

/// Check if a media type denotes readable text.
pub fn is_textual(media_type: &str) -> bool {
    if media_type.starts_with("text/") {
        return true;
    }
    match media_type.strip_prefix("application/") {
        Some(subtype) => {
            TEXTUAL_APPLICATION_SUBTYPES.contains(&subtype)
                || subtype.ends_with("+json")
                || subtype.ends_with("+xml")
        }
        None => false,
    }
}

/// Detect the media type of a file.
pub fn detect(path: &Path) -> CompactString {
    let guess = mime_guess::from_path(path).first_raw();

    let head = match read_head(path) {
        Ok(head) => head,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "media sniffing failed");
            return guess.unwrap_or(UNKNOWN_MEDIA_TYPE).into();
        }
    };

    if let Some(kind) = infer::get(&head) {
        return kind.mime_type().into();
    }

    if head.is_empty() {
        return guess.unwrap_or(EMPTY_MEDIA_TYPE).into();
    }

    if head.contains(&0) {
        return guess
            .filter(|g| !is_textual(g))
            .unwrap_or(OCTET_STREAM)
            .into();
    }

    // Text content: keep the extension guess only when it agrees.
    guess.filter(|g| is_textual(g)).unwrap_or("text/plain").into()
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}
