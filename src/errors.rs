use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Malformed shaping parameter `{param}`: {reason}")]
    MalformedShapingParameter { param: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    pub(crate) fn shaping(param: &str, reason: impl Into<String>) -> Self {
        Self::MalformedShapingParameter { param: param.to_string(), reason: reason.into() }
    }
}
