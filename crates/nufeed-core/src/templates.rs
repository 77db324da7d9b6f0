//! Feed document templates.
//!
//! Templates are plain text with `@Name` placeholders. Built-in copies are compiled in; a
//! template directory may override any of them by file name.

use std::path::Path;

use tracing::{debug, info};

use crate::{error::ErrorContext, NufeedResult};

pub const FEED_HEADER_FILE: &str = "feed_header.xml";
pub const FEED_ENTRY_FILE: &str = "feed_entry.xml";
pub const FEED_FOOTER_FILE: &str = "feed_footer.xml";
pub const NOT_FOUND_FILE: &str = "not_found.xml";
pub const SERVICE_FILE: &str = "service.xml";
pub const METADATA_FILE: &str = "metadata.xml";

/// The text blobs feed documents are assembled from. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTemplates {
    /// Opens a multi-entry feed. Placeholders: `@baseUrl`, `@date`.
    pub header: String,
    /// One package entry. Placeholders: `@baseUrl` and every record field.
    pub entry: String,
    pub footer: String,
    /// Complete document returned for a single-entry lookup that found nothing.
    pub not_found: String,
    /// Service document. Placeholder: `@baseUrl`.
    pub service: String,
    /// `$metadata` document, served verbatim.
    pub metadata: String,
}

impl Default for FeedTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeedTemplates {
    pub fn builtin() -> Self {
        Self {
            header: include_str!("../templates/feed_header.xml").to_string(),
            entry: include_str!("../templates/feed_entry.xml").to_string(),
            footer: include_str!("../templates/feed_footer.xml").to_string(),
            not_found: include_str!("../templates/not_found.xml").to_string(),
            service: include_str!("../templates/service.xml").to_string(),
            metadata: include_str!("../templates/metadata.xml").to_string(),
        }
    }

    /// Loads templates, preferring files found in `dir` over the built-in copies.
    pub fn load(dir: Option<&Path>) -> NufeedResult<Self> {
        let mut templates = Self::builtin();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        let slots: [(&str, &mut String); 6] = [
            (FEED_HEADER_FILE, &mut templates.header),
            (FEED_ENTRY_FILE, &mut templates.entry),
            (FEED_FOOTER_FILE, &mut templates.footer),
            (NOT_FOUND_FILE, &mut templates.not_found),
            (SERVICE_FILE, &mut templates.service),
            (METADATA_FILE, &mut templates.metadata),
        ];

        let mut overridden = 0;
        for (file_name, slot) in slots {
            let path = dir.join(file_name);
            if !path.is_file() {
                continue;
            }
            *slot = std::fs::read_to_string(&path)
                .with_context(|| format!("reading template {}", path.display()))?;
            debug!(template = file_name, "loaded template override");
            overridden += 1;
        }

        info!(
            dir = %dir.display(),
            overridden, "loaded feed templates"
        );
        Ok(templates)
    }
}
