//! Error types and utilities for dmviz.

use thiserror::Error;

/// Result type alias for dmviz operations.
pub type Result<T> = std::result::Result<T, DmVizError>;

/// Boxed source error carried by most variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for dmviz operations.
#[derive(Error, Debug)]
pub enum DmVizError {
    /// A snapshot dataset could not be fetched or parsed.
    #[error("Data load error ({dataset}): {message}")]
    DataLoad {
        /// Dataset that failed, e.g. `message_stats_monthly.csv`.
        dataset: String,
        /// Generator script that produces the dataset.
        generator: String,
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration related errors.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for control values or labels.
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong.
        message: String,
        /// Offending field, when known.
        field: Option<String>,
    },

    /// Tabular or JSON content that cannot be read at all.
    #[error("Parse error: {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Network related errors.
    #[error("Network error: {message}")]
    Network {
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DmVizError {
    /// Create a data load error for a dataset.
    pub fn data_load(
        dataset: impl Into<String>,
        generator: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::DataLoad {
            dataset: dataset.into(),
            generator: generator.into(),
            message: msg.into(),
            source: None,
        }
    }

    /// Create a data load error wrapping the underlying cause.
    pub fn data_load_with_source(
        dataset: impl Into<String>,
        generator: impl Into<String>,
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataLoad {
            dataset: dataset.into(),
            generator: generator.into(),
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name.
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new parse error with source.
    pub fn parse_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error with source.
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this is the data-load failure users are expected to see.
    pub const fn is_data_load(&self) -> bool {
        matches!(self, Self::DataLoad { .. })
    }

    /// Static message shown in place of a chart.
    ///
    /// Data load failures name the generator script to re-run; anything else
    /// falls back to the error's display text.
    pub fn user_message(&self) -> String {
        match self {
            Self::DataLoad { generator, .. } => {
                format!("Failed to load data. Run python3 {generator} first.")
            }
            other => other.to_string(),
        }
    }
}

// Error conversion implementations for external types

/// Convert from `reqwest::Error` to `DmVizError`
impl From<reqwest::Error> for DmVizError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map_or(0, |s| s.as_u16());
            Self::network_with_source(format!("HTTP error: {status_code}"), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from `csv::Error` to `DmVizError`
impl From<csv::Error> for DmVizError {
    fn from(err: csv::Error) -> Self {
        let message = err.position().map_or_else(
            || "CSV parsing error".to_string(),
            |pos| format!("CSV parsing error at line {}", pos.line()),
        );
        Self::parse_with_source(message, err)
    }
}

/// Convert from `toml::de::Error` to `DmVizError`
impl From<toml::de::Error> for DmVizError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML parsing error", err)
    }
}

/// Convert from `serde_yaml::Error` to `DmVizError`
impl From<serde_yaml::Error> for DmVizError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}
