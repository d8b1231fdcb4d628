//! Configuration schema definitions using serde.

use dmviz_common::{
    DateRange, DmVizError, Granularity, HeatmapScale, LoggingConfig, RankMode, ResponseSort,
    StackOffset, TieBreak,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for dmviz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the snapshot files live.
    pub data: DataConfig,
    /// Default control values for derived views.
    pub view: ViewConfig,
    /// Ranking policies and pool sizes.
    pub ranking: RankingConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Snapshot location configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the snapshot files.
    pub base_dir: PathBuf,
    /// Fetch snapshot files from this URL instead of `base_dir`.
    pub base_url: Option<String>,
    /// Append a timestamp query to URLs so caches never serve stale files.
    pub cache_bust: bool,
    /// Monthly per-contact counts.
    pub monthly_file: String,
    /// Quarterly per-contact counts.
    pub quarterly_file: String,
    /// Monthly sent/received counts.
    pub sent_recv_file: String,
    /// Monthly median reply times.
    pub response_times_file: String,
    /// Day-of-week by hour-of-day grids.
    pub day_hour_file: String,
}

/// Default control values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Bucket width for charts that support both.
    pub granularity: Granularity,
    /// Number of contacts to show.
    pub top_n: usize,
    /// First month of the date range, `YYYY-MM`.
    pub start: String,
    /// Last month of the date range, `YYYY-MM`.
    pub end: String,
    /// Ranking mode for the bump chart.
    pub rank_mode: RankMode,
    /// Baseline policy for the stream graph.
    pub stack_offset: StackOffset,
    /// Colour scaling for the heatmap.
    pub heatmap_scale: HeatmapScale,
    /// Sort key for the response time chart.
    pub response_sort: ResponseSort,
}

impl ViewConfig {
    /// The configured month range.
    pub fn range(&self) -> Result<DateRange, DmVizError> {
        let range = DateRange::parse(&self.start, &self.end)?;
        if range.granularity() != Granularity::Monthly {
            return Err(DmVizError::validation_field(
                "View range must be given in months (YYYY-MM)",
                "view.start",
            ));
        }
        Ok(range)
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// How equal values are ordered.
    pub tie_break: TieBreak,
    /// Minimum number of contacts ranked by the bump chart.
    pub bump_pool_min: usize,
    /// Number of contacts considered by the bar race.
    pub race_pool: usize,
    /// Bars shown per bar race frame.
    pub race_bars: usize,
    /// Default number of rows in the response time chart.
    pub response_top_n: usize,
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), DmVizError> {
        crate::validator::ConfigValidator::validate(self)
    }
}
