// src/services/namer.rs

//! Storage namer: safe on-disk file names from untrusted metadata.
//!
//! Names produced here are always a single normal path component, so joining
//! them to the storage root can never leave it.

use std::fmt;
use std::path::{Component, Path};

use unicode_segmentation::UnicodeSegmentation;

use crate::models::MediaMetadata;

/// Longest stem kept from a title, in bytes.
pub const MAX_STEM_BYTES: usize = 120;

/// Longest extension kept, in characters.
pub const MAX_EXTENSION_CHARS: usize = 10;

/// Length of the collision disambiguator.
pub const DISAMBIGUATOR_LEN: usize = 8;

const FALLBACK_STEM: &str = "media";
const FALLBACK_EXTENSION: &str = "bin";

/// A file name that is safe to join to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFilename {
    stem: String,
    extension: String,
    disambiguator: Option<String>,
}

impl SafeFilename {
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn disambiguator(&self) -> Option<&str> {
        self.disambiguator.as_deref()
    }

    /// Same name with a disambiguating suffix on the stem.
    pub fn with_disambiguator(&self, token: &str) -> Self {
        let token: String = token
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(DISAMBIGUATOR_LEN)
            .collect();
        Self {
            disambiguator: (!token.is_empty()).then_some(token),
            ..self.clone()
        }
    }

    /// Full file name: `<stem>[-<disambiguator>].<ext>`.
    pub fn file_name(&self) -> String {
        match &self.disambiguator {
            Some(token) => format!("{}-{}.{}", self.stem, token, self.extension),
            None => format!("{}.{}", self.stem, self.extension),
        }
    }
}

impl fmt::Display for SafeFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Derive the candidate file name for extracted media.
pub fn resolve_name(metadata: &MediaMetadata) -> SafeFilename {
    SafeFilename {
        stem: sanitize_title(&metadata.title),
        extension: sanitize_extension(&metadata.extension),
        disambiguator: None,
    }
}

/// Fresh random disambiguator.
pub fn new_disambiguator() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..DISAMBIGUATOR_LEN].to_string()
}

/// Make a title usable as a file stem.
///
/// Separators, control characters and characters reserved on common
/// filesystems become `_`; whitespace runs collapse; leading dots go.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => ' ',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_start_matches(['.', ' ']);
    let truncated = truncate_graphemes(trimmed, MAX_STEM_BYTES);
    let cleaned = truncated.trim_end_matches(['.', ' ']);

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Make an extension safe: ASCII alphanumerics only, lowercase.
pub fn sanitize_extension(extension: &str) -> String {
    let cleaned: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_CHARS)
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        cleaned
    }
}

/// Whether a client-supplied artifact name is a plain file name that stays
/// inside the storage root.
///
/// Rejects separators, NUL and control characters, absolute paths, `..`,
/// and anything starting with `.` (hidden files and the scratch area).
pub fn is_safe_reference(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 || name.starts_with('.') {
        return false;
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

fn truncate_graphemes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = 0;
    for (idx, grapheme) in s.grapheme_indices(true) {
        if idx + grapheme.len() > max_bytes {
            break;
        }
        end = idx + grapheme.len();
    }
    &s[..end]
}
