//! Configuration management.
//!
//! Every setting has a default, so a config file is optional. Values are read
//! from a TOML file (when given or found) and then from environment variables
//! prefixed with `CITATION_FALLBACK_`, using `__` between section and key:
//!
//! ```toml
//! [similarity]
//! threshold = 0.7
//!
//! [arxiv]
//! enabled = true
//! base_url = "http://export.arxiv.org/api/query"
//! max_results = 1
//! timeout_secs = 30
//!
//! [scholar]
//! enabled = false
//! base_url = "https://scholar.google.com/scholar"
//! delay_ms = 1000
//! ```
//!
//! ```bash
//! export CITATION_FALLBACK_SIMILARITY__THRESHOLD=0.8
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TIMEOUT_SECS};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CITATION_FALLBACK";

/// Environment variable that enables Google Scholar scraping
pub const GOOGLE_SCHOLAR_ENABLED_VAR: &str = "GOOGLE_SCHOLAR_ENABLED";

/// File name searched for in the working directory
const LOCAL_CONFIG_FILE: &str = "citation-fallback.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Title similarity settings
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// arXiv settings
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Google Scholar settings
    #[serde(default)]
    pub scholar: ScholarConfig,
}

/// Title similarity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Minimum Jaccard index of title word sets for a hit to be accepted
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

/// arXiv configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Whether the fallback tries arXiv by default
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Query API endpoint
    #[serde(default = "default_arxiv_url")]
    pub base_url: String,

    /// Number of results requested; only the first one is considered
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_arxiv_url(),
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ArxivConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_arxiv_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_max_results() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Google Scholar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholarConfig {
    /// Whether the scraping backend is built at all
    #[serde(default = "default_scholar_enabled")]
    pub enabled: bool,

    /// Search page endpoint
    #[serde(default = "default_scholar_url")]
    pub base_url: String,

    /// Pause before querying Scholar after arXiv missed, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            enabled: default_scholar_enabled(),
            base_url: default_scholar_url(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl ScholarConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_scholar_enabled() -> bool {
    std::env::var(GOOGLE_SCHOLAR_ENABLED_VAR).unwrap_or_default() == "true"
}

fn default_scholar_url() -> String {
    "https://scholar.google.com/scholar".to_string()
}

fn default_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check value ranges that deserialization alone cannot enforce
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let threshold = self.similarity.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(config::ConfigError::Message(format!(
                "similarity.threshold must be between 0 and 1, got {}",
                threshold
            )));
        }
        Ok(())
    }
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("citation-fallback").join("config.toml"))
        .filter(|path| path.is_file())
}
