use nu_ansi_term::Color::{Blue, LightRed};
use nufeed_core::{gallery::Gallery, NufeedResult};
use tracing::{info, warn};

use crate::utils::Colored;

pub fn delete_package(gallery: &Gallery, id: &str, version: &str) -> NufeedResult<()> {
    match gallery.delete(id, version)? {
        Some(removed) => {
            info!(
                id = %removed.id,
                version = %removed.version,
                "Deleted {}:{}",
                Colored(Blue, &removed.id),
                Colored(LightRed, &removed.version)
            );
        }
        None => warn!("Package {id}:{version} is not in the feed"),
    }
    Ok(())
}
