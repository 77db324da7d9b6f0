use std::{fs::File, io, path::PathBuf};

use nu_ansi_term::Color::{Blue, Cyan, LightRed};
use nufeed_core::{
    error::{ErrorContext, NufeedError},
    gallery::Gallery,
    NufeedResult,
};
use nufeed_utils::{bytes::format_bytes, path::resolve_path};
use tracing::info;

use crate::utils::Colored;

/// Copies an archive out of the feed. `output` may name a file or an existing directory;
/// without it the archive lands in the current directory under its canonical name.
pub fn fetch_package(
    gallery: &Gallery,
    id: &str,
    version: &str,
    output: Option<&str>,
) -> NufeedResult<()> {
    let Some(mut download) = gallery.download(id, version)? else {
        return Err(NufeedError::Custom(format!(
            "package {id}:{version} is not in the feed"
        )));
    };

    let target = match output {
        Some(output) => {
            let path = resolve_path(output)?;
            if path.is_dir() {
                path.join(&download.file_name)
            } else {
                path
            }
        }
        None => PathBuf::from(&download.file_name),
    };

    let mut file =
        File::create(&target).with_context(|| format!("creating {}", target.display()))?;
    let copied = io::copy(&mut download.reader, &mut file)
        .with_context(|| format!("writing {}", target.display()))?;

    info!(
        id = %download.record.id,
        version = %download.record.version,
        path = %target.display(),
        "Fetched {}:{} to {} ({})",
        Colored(Blue, &download.record.id),
        Colored(LightRed, &download.record.version),
        target.display(),
        Colored(Cyan, format_bytes(copied, 2))
    );
    Ok(())
}
