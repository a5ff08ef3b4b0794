//! # Settings
//!
//! Process settings, loaded once at startup.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `GRAPHLENS_*` environment variables
//!
//! ```toml
//! neo4j_uri = "http://localhost:7474"
//! neo4j_user = "neo4j"
//! neo4j_password = "secret"
//! neo4j_database = "neo4j"
//! queries_file_path = "queries.yaml"
//! default_limit = 10
//! request_timeout_secs = 30
//! ```

use graphlens_core::GraphLensError;
use graphlens_core::primitives::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "GRAPHLENS_";

const DEFAULT_DATABASE: &str = "neo4j";
const DEFAULT_QUERIES_FILE: &str = "queries.yaml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: String,
    pub queries_file_path: PathBuf,
    pub default_limit: i64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            neo4j_uri: String::new(),
            neo4j_user: String::new(),
            neo4j_password: String::new(),
            neo4j_database: DEFAULT_DATABASE.to_string(),
            queries_file_path: PathBuf::from(DEFAULT_QUERIES_FILE),
            default_limit: DEFAULT_LIMIT,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// The password never reaches logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("neo4j_uri", &self.neo4j_uri)
            .field("neo4j_user", &self.neo4j_user)
            .field("neo4j_password", &"<redacted>")
            .field("neo4j_database", &self.neo4j_database)
            .field("queries_file_path", &self.queries_file_path)
            .field("default_limit", &self.default_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GraphLensError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse settings from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, GraphLensError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphLensError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, GraphLensError> {
        toml::from_str(content)
            .map_err(|e| GraphLensError::Config(format!("Invalid config: {}", e)))
    }

    /// Override fields from `GRAPHLENS_<FIELD>` variables, as resolved by `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), GraphLensError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("NEO4J_URI") {
            self.neo4j_uri = v;
        }
        if let Some(v) = var("NEO4J_USER") {
            self.neo4j_user = v;
        }
        if let Some(v) = var("NEO4J_PASSWORD") {
            self.neo4j_password = v;
        }
        if let Some(v) = var("NEO4J_DATABASE") {
            self.neo4j_database = v;
        }
        if let Some(v) = var("QUERIES_FILE_PATH") {
            self.queries_file_path = PathBuf::from(v);
        }
        if let Some(v) = var("DEFAULT_LIMIT") {
            self.default_limit = parse_env("DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    /// Check the settings needed to reach the store.
    pub fn validate(&self) -> Result<(), GraphLensError> {
        let missing: Vec<&str> = [
            ("neo4j_uri", &self.neo4j_uri),
            ("neo4j_user", &self.neo4j_user),
            ("neo4j_password", &self.neo4j_password),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(GraphLensError::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }
        if self.default_limit <= 0 {
            return Err(GraphLensError::Config(
                "default_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, GraphLensError> {
    value.trim().parse().map_err(|_| {
        GraphLensError::Config(format!("Invalid value for {ENV_PREFIX}{name}: '{value}'"))
    })
}

// =============================================================================
// TESTS
// =============================================================================
