//! Application-wide error types using thiserror.

use dmviz_common::DmVizError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Configuration, loading or control error from the library crates.
    #[error(transparent)]
    Core(#[from] DmVizError),

    /// The derived view could not be written as JSON.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Whether a snapshot file failed to load.
    pub const fn is_data_load(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_data_load())
    }

    /// Message shown to the user. Load failures name the generator script
    /// to run.
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(e) => e.user_message(),
            Self::Output(_) => self.to_string(),
        }
    }
}

/// Result type for the command line application.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_load_message() {
        let err = CliError::from(DmVizError::data_load(
            "message_stats_monthly.csv",
            "query_messages_monthly.py",
            "No such file or directory",
        ));
        assert!(err.is_data_load());
        assert_eq!(
            err.user_message(),
            "Failed to load data. Run python3 query_messages_monthly.py first."
        );
    }

    #[test]
    fn test_other_errors_keep_their_message() {
        let err = CliError::from(DmVizError::validation("top_n must be at least 1"));
        assert!(!err.is_data_load());
        assert_eq!(err.user_message(), "Validation error: top_n must be at least 1");
    }
}
