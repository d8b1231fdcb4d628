//! Default values matching the files the generator scripts write.

use crate::schema::*;
use dmviz_common::{
    Granularity, HeatmapScale, LoggingConfig, RankMode, ResponseSort, StackOffset, TieBreak,
};
use std::path::PathBuf;

/// Default monthly counts file.
pub const MONTHLY_FILE: &str = "message_stats_monthly.csv";
/// Default quarterly counts file.
pub const QUARTERLY_FILE: &str = "message_stats_quarterly.csv";
/// Default sent/received file.
pub const SENT_RECV_FILE: &str = "message_stats_sent_recv.csv";
/// Default response time file.
pub const RESPONSE_TIMES_FILE: &str = "message_response_times.csv";
/// Default day/hour grid file.
pub const DAY_HOUR_FILE: &str = "message_day_hour.json";

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            view: ViewConfig::default(),
            ranking: RankingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(".."),
            base_url: None,
            cache_bust: true,
            monthly_file: MONTHLY_FILE.to_string(),
            quarterly_file: QUARTERLY_FILE.to_string(),
            sent_recv_file: SENT_RECV_FILE.to_string(),
            response_times_file: RESPONSE_TIMES_FILE.to_string(),
            day_hour_file: DAY_HOUR_FILE.to_string(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            top_n: 10,
            start: "2019-08".to_string(),
            end: "2025-12".to_string(),
            rank_mode: RankMode::Cumulative,
            stack_offset: StackOffset::Silhouette,
            heatmap_scale: HeatmapScale::Global,
            response_sort: ResponseSort::Difference,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::InsertionOrder,
            bump_pool_min: 30,
            race_pool: 50,
            race_bars: 12,
            response_top_n: 20,
        }
    }
}
