use std::fs;

use nu_ansi_term::Color::{Blue, Cyan, LightRed};
use nufeed_core::{
    error::{ErrorContext, NufeedError},
    gallery::Gallery,
    NufeedResult,
};
use nufeed_utils::{bytes::format_bytes, path::resolve_path};
use tracing::{debug, error, info};

use crate::utils::Colored;

fn push_archive(gallery: &Gallery, archive: &str) -> NufeedResult<()> {
    let path = resolve_path(archive)?;
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    debug!(path = %path.display(), size = bytes.len(), "publishing archive");

    let record = gallery.publish(&bytes)?;
    info!(
        id = %record.id,
        version = %record.version,
        hash = %record.package_hash,
        size = record.package_size,
        "Published {}:{} ({})",
        Colored(Blue, &record.id),
        Colored(LightRed, &record.version),
        Colored(Cyan, format_bytes(record.package_size, 2))
    );
    Ok(())
}

/// Publishes every archive, continuing past failures.
pub fn push_archives(gallery: &Gallery, archives: &[String]) -> NufeedResult<()> {
    let mut failed = 0;
    for archive in archives {
        if let Err(err) = push_archive(gallery, archive) {
            error!("Failed to publish {archive}: {err}");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(NufeedError::Custom(format!(
            "{failed} of {} archives failed to publish",
            archives.len()
        )));
    }
    Ok(())
}
