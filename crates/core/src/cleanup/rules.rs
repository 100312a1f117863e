//! File classification rules for the junk pass.

use serde::Serialize;

use crate::catalog_code::normalize_code;
use crate::config::CleanupConfig;

/// Why a file was marked as junk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JunkReason {
    Extension,
    Keyword,
    Domain,
}

/// Classification of one file by the junk pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVerdict {
    /// Main media file of the release; never deleted.
    Keep,
    Delete(JunkReason),
    /// Matches neither rule and is left alone.
    Untouched,
}

/// Keyword, domain and extension lists used to spot junk files.
#[derive(Debug, Clone)]
pub struct CleanupRules {
    ad_keywords: Vec<String>,
    ad_domains: Vec<String>,
    ad_extensions: Vec<String>,
    media_extensions: Vec<String>,
}

impl CleanupRules {
    pub fn new(
        ad_keywords: Vec<String>,
        ad_domains: Vec<String>,
        ad_extensions: Vec<String>,
        media_extensions: Vec<String>,
    ) -> Self {
        Self {
            ad_keywords: ad_keywords.into_iter().filter(|k| !k.is_empty()).collect(),
            ad_domains: ad_domains
                .into_iter()
                .filter(|d| !d.is_empty())
                .map(|d| d.to_lowercase())
                .collect(),
            ad_extensions: ad_extensions.iter().map(|e| normalize_extension(e)).collect(),
            media_extensions: media_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
        }
    }

    /// Classify `file_name` for a directory belonging to `code`.
    ///
    /// The keep rule is checked first: a media file whose normalized base
    /// name contains the normalized code is kept whatever else it matches.
    pub fn classify(&self, file_name: &str, code: &str) -> FileVerdict {
        let (base, extension) = split_extension(file_name);

        let normalized = normalize_code(code);
        if !normalized.is_empty()
            && self.media_extensions.contains(&extension)
            && normalize_code(base).contains(&normalized)
        {
            return FileVerdict::Keep;
        }

        if self.ad_extensions.contains(&extension) {
            return FileVerdict::Delete(JunkReason::Extension);
        }
        if self.ad_keywords.iter().any(|k| file_name.contains(k.as_str())) {
            return FileVerdict::Delete(JunkReason::Keyword);
        }
        let lower = file_name.to_lowercase();
        if self.ad_domains.iter().any(|d| lower.contains(d.as_str())) {
            return FileVerdict::Delete(JunkReason::Domain);
        }

        FileVerdict::Untouched
    }
}

impl From<&CleanupConfig> for CleanupRules {
    fn from(config: &CleanupConfig) -> Self {
        Self::new(
            config.ad_keywords.clone(),
            config.ad_domains.clone(),
            config.ad_extensions.clone(),
            config.media_extensions.clone(),
        )
    }
}

impl Default for CleanupRules {
    fn default() -> Self {
        Self::from(&CleanupConfig::default())
    }
}

/// Lowercase with a leading dot.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Split into base name and lowercased extension (with dot). A leading dot
/// alone does not start an extension.
fn split_extension(file_name: &str) -> (&str, String) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], file_name[idx..].to_lowercase()),
        _ => (file_name, String::new()),
    }
}
