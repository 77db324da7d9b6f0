use std::fs;

use clap::Parser;
use cli::{Args, Commands};
use fetch::fetch_package;
use list::{list_packages, query_feed, show_entry};
use logging::setup_logging;
use nufeed_config::config::{generate_default_config, Config, CONFIG_PATH};
use nufeed_core::{error::NufeedError, gallery::Gallery, NufeedResult};
use nufeed_utils::path::resolve_path;
use push::push_archives;
use remove::delete_package;
use tracing::{debug, info, warn};
use utils::COLOR;

mod cli;
mod fetch;
mod list;
mod logging;
mod push;
mod remove;
mod utils;

fn print_config() -> NufeedResult<()> {
    let config_path = CONFIG_PATH.read()?.clone();
    let content = match fs::read_to_string(&config_path) {
        Ok(v) => v,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found", config_path.display());
            Config::default_config().to_annotated_document()?.to_string()
        }
        Err(err) => {
            return Err(NufeedError::IoError {
                action: "reading config".to_string(),
                source: err,
            });
        }
    };
    info!("{}", content);
    Ok(())
}

fn handle_cli() -> NufeedResult<()> {
    let args = Args::parse();

    setup_logging(&args)?;

    if args.no_color {
        let mut color = COLOR.write()?;
        *color = false;
    }

    if let Some(ref c) = args.config {
        *CONFIG_PATH.write()? = resolve_path(c)?;
    }

    match args.command {
        Commands::DefConfig => {
            generate_default_config()?;
        }
        Commands::Config => print_config()?,
        command => {
            let config = Config::new()?;
            let gallery = Gallery::open(&config)?;
            debug!(
                base_url = gallery.base_url(),
                packages = gallery.store().len()?,
                "opened feed"
            );

            match command {
                Commands::Push {
                    archives,
                } => push_archives(&gallery, &archives)?,
                Commands::Delete {
                    id,
                    version,
                } => delete_package(&gallery, &id, &version)?,
                Commands::List {
                    query,
                } => list_packages(&gallery, &query)?,
                Commands::Query {
                    query,
                    id,
                    atom,
                } => query_feed(&gallery, &query, id.as_deref(), atom)?,
                Commands::Entry {
                    key,
                    version,
                    atom,
                } => show_entry(&gallery, &key, version.as_deref(), atom)?,
                Commands::Fetch {
                    id,
                    version,
                    output,
                } => fetch_package(&gallery, &id, &version, output.as_deref())?,
                Commands::Service => println!("{}", gallery.service_document()),
                Commands::Metadata => println!("{}", gallery.metadata_document()),
                Commands::DefConfig | Commands::Config => unreachable!(),
            }
        }
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
