//! Client configuration.

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, without the `/api` prefix.
    pub base_url: String,
    /// Page size used when aggregating paginated collections.
    pub page_size: u32,
    /// Upper bound on pages fetched for one collection.
    pub max_pages: u32,
    /// Patch cached book counters after loan mutations instead of only
    /// marking the book list stale.
    pub patch_availability: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 100,
            max_pages: 50,
            patch_availability: false,
        }
    }
}

impl ClientConfig {
    /// Defaults, then an optional `library-client.{toml,json,yaml}` in the
    /// working directory, then `LIBRARY_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::layered(
            File::with_name("library-client").required(false),
            Environment::with_prefix("LIBRARY").try_parsing(true),
        )
    }

    fn layered(
        file: impl Source + Send + Sync + 'static,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("page_size", i64::from(defaults.page_size))?
            .set_default("max_pages", i64::from(defaults.max_pages))?
            .set_default("patch_availability", defaults.patch_availability)?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
