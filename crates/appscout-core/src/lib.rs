use thiserror::Error;

mod app_config;
mod config;

pub mod candidate;
pub mod keywords;
pub mod platform;

pub use app_config::{AppConfig, Environment};
pub use candidate::{
    Candidate, CountryEntry, CountryMetadata, Criterion, GateVerdict, ReviewRecord,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keyword_pool, sample_keywords, KeywordPool};
pub use platform::{Platform, PlatformCapabilities};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keyword pool file {path}: {source}")]
    KeywordFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keyword pool file: {0}")]
    KeywordFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
