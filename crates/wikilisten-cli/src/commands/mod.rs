//! Command implementations.
//!
//! Network commands share one [`Session`]: a page store and the resolver and
//! template query derived from the loaded configuration.

mod discover;
mod dump_listens;
mod links;
mod listens;
mod resolve;
mod seek;

pub use discover::discover;
pub use dump_listens::dump_listens;
pub use links::links;
pub use listens::listens;
pub use resolve::resolve;
pub use seek::seek;

use anyhow::{Context, Result};
use std::path::Path;
use wikilisten_core::{ApiClient, AssetResolver, Config, PageStore, TemplateQuery};

/// Load the configuration file, or the default location when none is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    tracing::debug!(api = %config.api.url, template = %config.discovery.template, "Loaded config");
    Ok(config)
}

/// Shared state for commands that talk to the wiki.
pub struct Session {
    pub config: Config,
    pub store: PageStore,
    pub resolver: AssetResolver,
    pub query: TemplateQuery,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        let client = ApiClient::from_config(&config.api)
            .with_context(|| format!("Invalid API endpoint '{}'", config.api.url))?;
        Ok(Self {
            store: PageStore::new(client),
            resolver: AssetResolver::new(config.assets.base_url.as_str()),
            query: TemplateQuery::from_config(&config.discovery),
            config,
        })
    }
}
