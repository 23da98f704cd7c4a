//! Listing configuration: limits, default sort and field strictness.
//!
//! Precedence: explicit path > `CAMPQUERY_CONFIG` > `./campquery.toml` > defaults, then
//! environment overrides (`CAMPQUERY_DEFAULT_LIMIT`, `CAMPQUERY_MAX_LIMIT`,
//! `CAMPQUERY_DEFAULT_SORT`, `CAMPQUERY_STRICT_FIELDS`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::QueryError;
use crate::resources::Resource;

pub const CONFIG_ENV: &str = "CAMPQUERY_CONFIG";
pub const CONFIG_FILE: &str = "campquery.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Overrides every resource's own default page size when set.
    pub default_limit: Option<u64>,
    pub max_limit: u64,
    /// Same syntax as the `sort` query parameter.
    pub default_sort: String,
    /// Reject `select`/`sort` fields the resource does not declare.
    pub strict_fields: bool,
    /// Per-collection default page size, e.g. `courses = 50`.
    pub limits: BTreeMap<String, u64>,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            default_limit: None,
            max_limit: 1000,
            default_sort: "-createdAt".to_string(),
            strict_fields: false,
            limits: BTreeMap::new(),
        }
    }
}

impl ResultsConfig {
    /// # Errors
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml_str(s: &str) -> Result<Self, QueryError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, QueryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Loads the first config file found, then applies environment overrides.
    ///
    /// # Errors
    /// Returns an error if an existing config file cannot be read or parsed, or an
    /// override variable holds an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, QueryError> {
        let found = match explicit {
            Some(p) if !p.exists() => {
                return Err(QueryError::Config(format!("config file not found: {}", p.display())));
            }
            Some(p) => Some(p.to_path_buf()),
            None => {
                let mut candidates: Vec<PathBuf> = Vec::new();
                if let Ok(p) = std::env::var(CONFIG_ENV) {
                    candidates.push(PathBuf::from(p));
                }
                if let Ok(cur) = std::env::current_dir() {
                    candidates.push(cur.join(CONFIG_FILE));
                }
                candidates.into_iter().find(|p| p.exists())
            }
        };
        let mut cfg = match found {
            Some(p) => {
                log::info!("loading listing config from {}", p.display());
                Self::from_path(&p)?
            }
            None => Self::default(),
        };
        cfg.apply_env_from(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns `QueryError::Config` when a numeric or boolean override does not parse.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), QueryError> {
        if let Some(v) = lookup("CAMPQUERY_DEFAULT_LIMIT") {
            self.default_limit = Some(parse_env_u64("CAMPQUERY_DEFAULT_LIMIT", &v)?);
        }
        if let Some(v) = lookup("CAMPQUERY_MAX_LIMIT") {
            self.max_limit = parse_env_u64("CAMPQUERY_MAX_LIMIT", &v)?;
        }
        if let Some(v) = lookup("CAMPQUERY_DEFAULT_SORT") {
            self.default_sort = v;
        }
        if let Some(v) = lookup("CAMPQUERY_STRICT_FIELDS") {
            self.strict_fields = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(QueryError::Config(format!(
                        "CAMPQUERY_STRICT_FIELDS: expected a boolean, got `{v}`"
                    )));
                }
            };
        }
        Ok(())
    }

    /// Default page size for `resource`: per-collection entry, then the global
    /// override, then the resource's own default.
    #[must_use]
    pub fn limit_for(&self, resource: Resource) -> u64 {
        self.limits
            .get(resource.collection())
            .copied()
            .or(self.default_limit)
            .unwrap_or_else(|| resource.default_limit())
    }
}

fn parse_env_u64(key: &str, v: &str) -> Result<u64, QueryError> {
    v.trim()
        .parse::<u64>()
        .map_err(|_| QueryError::Config(format!("{key}: expected a positive integer, got `{v}`")))
}
