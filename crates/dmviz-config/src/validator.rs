//! Runtime validation of a loaded configuration.

use crate::schema::Config;
use dmviz_common::{DmVizError, Result};

/// Largest accepted top-N value.
pub const MAX_TOP_N: usize = 100;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting every problem at once.
    pub fn validate(config: &Config) -> Result<()> {
        let issues = Self::issues(config);
        if issues.is_empty() {
            return Ok(());
        }
        let fields: Vec<&str> = issues.iter().map(|(field, _)| *field).collect();
        let messages: Vec<&str> = issues.iter().map(|(_, message)| message.as_str()).collect();
        Err(DmVizError::validation_field(
            messages.join("; "),
            fields.join(", "),
        ))
    }

    /// Every `(field, message)` problem found in the configuration.
    pub fn issues(config: &Config) -> Vec<(&'static str, String)> {
        let mut issues = Vec::new();

        if config.view.top_n == 0 || config.view.top_n > MAX_TOP_N {
            issues.push((
                "view.top_n",
                format!("top_n must be between 1 and {MAX_TOP_N}, got {}", config.view.top_n),
            ));
        }

        if let Err(e) = config.view.range() {
            issues.push(("view.start", e.to_string()));
        }

        if let Some(base_url) = &config.data.base_url {
            if let Err(e) = url::Url::parse(base_url) {
                issues.push(("data.base_url", format!("'{base_url}' is not a valid URL: {e}")));
            }
        }

        let files = [
            ("data.monthly_file", &config.data.monthly_file),
            ("data.quarterly_file", &config.data.quarterly_file),
            ("data.sent_recv_file", &config.data.sent_recv_file),
            ("data.response_times_file", &config.data.response_times_file),
            ("data.day_hour_file", &config.data.day_hour_file),
        ];
        for (field, file) in files {
            if file.trim().is_empty() {
                issues.push((field, "file name cannot be empty".to_string()));
            }
        }

        let pools = [
            ("ranking.bump_pool_min", config.ranking.bump_pool_min),
            ("ranking.race_pool", config.ranking.race_pool),
            ("ranking.race_bars", config.ranking.race_bars),
            ("ranking.response_top_n", config.ranking.response_top_n),
        ];
        for (field, value) in pools {
            if value == 0 {
                issues.push((field, "must be greater than zero".to_string()));
            }
        }

        issues
    }
}
