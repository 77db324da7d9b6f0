use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Yellow};
use nufeed_core::{
    filter::{ExtraFlags, QueryOptions},
    gallery::{Gallery, SearchRequest},
    models::{iso_timestamp, PackageRecord},
    NufeedResult,
};
use nufeed_utils::bytes::format_bytes;
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};
use tracing::{debug, info};

use crate::{
    cli::QueryArgs,
    utils::{feed_format, term_width, Colored},
};

fn search_request(query: &QueryArgs) -> NufeedResult<SearchRequest> {
    Ok(SearchRequest {
        filter: query.filter.clone(),
        extra: ExtraFlags {
            latest_version: query.latest,
            absolute_latest_version: query.absolute_latest,
        },
        options: QueryOptions::from_params(
            query.search.as_deref(),
            query.skip.as_deref(),
            query.top.as_deref(),
        )?,
    })
}

fn latest_label(record: &PackageRecord) -> String {
    match (record.is_latest_version, record.is_absolute_latest_version) {
        (true, true) => Colored(Green, "latest").to_string(),
        (true, false) => Colored(Green, "stable").to_string(),
        (false, true) => Colored(Yellow, "prerelease").to_string(),
        (false, false) => String::new(),
    }
}

pub fn list_packages(gallery: &Gallery, query: &QueryArgs) -> NufeedResult<()> {
    debug!(filter = ?query.filter, search = ?query.search, "listing packages");

    let request = search_request(query)?;
    let records = gallery.query(request.filter.as_deref(), request.extra)?;
    let records = request.options.apply(records);

    if records.is_empty() {
        info!("No packages found");
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(["Id", "Version", "Latest", "Downloads", "Size", "Published"]);
    for record in &records {
        builder.push_record([
            Colored(Blue, &record.id).to_string(),
            Colored(LightRed, &record.version).to_string(),
            latest_label(record),
            record.download_count.to_string(),
            format_bytes(record.package_size, 2),
            iso_timestamp(&record.published),
        ]);
    }

    let table = builder
        .build()
        .with(Panel::header(format!(
            "{} packages in {}",
            records.len(),
            Colored(Cyan, gallery.base_url())
        )))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string();

    info!(count = records.len(), "\n{table}");
    Ok(())
}

/// Prints a `Packages()` listing, or a `FindPackagesById()` listing when `id` is set.
pub fn query_feed(
    gallery: &Gallery,
    query: &QueryArgs,
    id: Option<&str>,
    atom: bool,
) -> NufeedResult<()> {
    let format = feed_format(atom);
    let response = match id {
        Some(id) => gallery.find_packages_by_id(id, format)?,
        None => gallery.search(&search_request(query)?, format)?,
    };

    println!("{}", response.body);
    Ok(())
}

pub fn show_entry(
    gallery: &Gallery,
    key: &str,
    version: Option<&str>,
    atom: bool,
) -> NufeedResult<()> {
    let format = feed_format(atom);
    let response = match version {
        Some(version) => gallery.entry(key, version, format)?,
        None => gallery.entry_by_key(key, format)?,
    };

    println!("{}", response.body);
    Ok(())
}
