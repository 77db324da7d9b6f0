use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use documented::{Documented, DocumentedFields};
use nufeed_utils::path::{resolve_path, xdg_config_home, xdg_data_home};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};
use url::Url;

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/nuget";

/// nufeed configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Directory holding the package archives, stored as `<Id>.<Version>.nupkg`.
    /// Default: $XDG_DATA_HOME/nufeed/packages
    pub root_dir: Option<String>,

    /// Public base URL of the feed, used to build entry, edit and download links.
    /// Default: http://localhost:5000/nuget
    pub base_url: Option<String>,

    /// Directory with feed template overrides. Files that are missing there fall back to
    /// the built-in templates.
    pub templates_dir: Option<String>,

    /// Ingest archives found in `root_dir` that the feed does not know yet when it opens.
    /// Default: true
    pub inventory_on_start: Option<bool>,

    /// Drop records whose archive is missing from `root_dir` when the feed opens.
    /// Default: true
    pub reconcile_on_start: Option<bool>,
}

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("NUFEED_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("nufeed").join("config.toml"),
    })
});

fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .map(|path| path.to_path_buf())
        .unwrap_or_else(|poisoned| poisoned.into_inner().to_path_buf())
}

/// Checks that `raw` is an absolute http(s) URL and returns it without a trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let invalid = |reason: String| {
        ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason,
        }
    };

    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".into()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl Config {
    pub fn default_config() -> Self {
        let nufeed_root = std::env::var("NUFEED_HOME")
            .unwrap_or_else(|_| format!("{}/nufeed", xdg_data_home().display()));

        Self {
            root_dir: Some(format!("{nufeed_root}/packages")),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            templates_dir: None,
            inventory_on_start: Some(true),
            reconcile_on_start: Some(true),
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Loads the configuration stored at `path`, falling back to the defaults when the file
    /// does not exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("config file {} not found, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        let defaults = Self::default_config();

        if self.root_dir.is_none() {
            self.root_dir = defaults.root_dir;
        }

        let base_url = match self.base_url.as_deref() {
            Some(url) => normalize_base_url(url)?,
            None => DEFAULT_BASE_URL.to_string(),
        };
        self.base_url = Some(base_url);

        self.inventory_on_start.get_or_insert(true);
        self.reconcile_on_start.get_or_insert(true);

        Ok(())
    }

    pub fn get_root_dir(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("NUFEED_ROOT") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.root_dir {
            Some(root_dir) => Ok(resolve_path(root_dir)?),
            None => Ok(resolve_path(&Self::default_config().root_dir.unwrap_or_default())?),
        }
    }

    pub fn get_base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var("NUFEED_BASE_URL") {
            return normalize_base_url(&env_url);
        }
        normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
    }

    pub fn get_templates_dir(&self) -> Result<Option<PathBuf>> {
        if let Ok(env_path) = std::env::var("NUFEED_TEMPLATES") {
            return Ok(Some(resolve_path(&env_path)?));
        }
        self.templates_dir
            .as_deref()
            .map(resolve_path)
            .transpose()
            .map_err(ConfigError::from)
    }

    pub fn inventory_on_start(&self) -> bool {
        self.inventory_on_start.unwrap_or(true)
    }

    pub fn reconcile_on_start(&self) -> bool {
        self.reconcile_on_start.unwrap_or(true)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = config_path();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, serialized)?;
        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut())?;

        Ok(doc)
    }
}

pub fn generate_default_config() -> Result<PathBuf> {
    let config_path = config_path();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(config_path)
}
