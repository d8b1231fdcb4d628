//! Command line arguments.

use clap::{Args as ClapArgs, CommandFactory, FromArgMatches, Parser};
use dmviz_common::{
    DateRange, DmVizError, Granularity, HeatmapScale, Period, RankMode, ResponseSort, StackOffset,
};
use dmviz_graphs::{ChartKind, ControlChange, GraphManager};
use std::path::PathBuf;
use std::str::FromStr;

/// Derive one chart view from the message statistics snapshot and print it
/// as JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "dmviz", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the snapshot files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fetch snapshot files from this URL instead of disk
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Log level filter
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Chart to derive: line, bump, heatmap, stream, race, scatter, response or day-hour
    #[arg(value_parser = parse_control::<ChartKind>)]
    pub chart: ChartKind,

    /// Control values overriding the configured defaults
    #[command(flatten)]
    pub controls: ControlArgs,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Control flags. Unset flags keep the configured view defaults.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ControlArgs {
    /// monthly or quarterly
    #[arg(long, value_parser = parse_control::<Granularity>)]
    pub granularity: Option<Granularity>,

    /// Number of contacts shown
    #[arg(long)]
    pub top_n: Option<usize>,

    /// First month, YYYY-MM (a quarter label starts at its first month)
    #[arg(long, value_parser = parse_control::<Period>)]
    pub start: Option<Period>,

    /// Last month, YYYY-MM (a quarter label ends at its last month)
    #[arg(long, value_parser = parse_control::<Period>)]
    pub end: Option<Period>,

    /// period or cumulative
    #[arg(long, value_parser = parse_control::<RankMode>)]
    pub rank_mode: Option<RankMode>,

    /// Stream baseline: none, silhouette, wiggle or expand
    #[arg(long, value_parser = parse_control::<StackOffset>)]
    pub offset: Option<StackOffset>,

    /// Heatmap scaling: global or row
    #[arg(long, value_parser = parse_control::<HeatmapScale>)]
    pub scale: Option<HeatmapScale>,

    /// Response sort: my-response, their-response or difference
    #[arg(long, value_parser = parse_control::<ResponseSort>)]
    pub sort: Option<ResponseSort>,

    /// Hide a contact (repeatable)
    #[arg(long, value_name = "NAME")]
    pub hide: Vec<String>,

    /// Highlight a contact
    #[arg(long, value_name = "NAME")]
    pub select: Option<String>,

    /// Day/hour contact; all contacts when omitted
    #[arg(long, value_name = "NAME")]
    pub contact: Option<String>,

    /// First day/hour year
    #[arg(long)]
    pub start_year: Option<u16>,

    /// Last day/hour year
    #[arg(long)]
    pub end_year: Option<u16>,
}

impl Args {
    /// Parses the process arguments. `--help` ends with the chart catalog.
    pub fn parse_with_catalog() -> Self {
        let matches = Self::command().after_long_help(chart_catalog()).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

/// One line per chart: its name and what it shows.
pub fn chart_catalog() -> String {
    let lines: Vec<String> = GraphManager::default()
        .catalog()
        .into_iter()
        .map(|(name, description)| format!("  {name:<10} {description}"))
        .collect();
    format!("Charts:\n{}", lines.join("\n"))
}

fn parse_control<T>(value: &str) -> Result<T, String>
where
    T: FromStr<Err = DmVizError>,
{
    value.parse().map_err(|e: DmVizError| e.to_string())
}

impl ControlArgs {
    /// The control changes these flags describe, relative to `current`.
    /// Missing range ends keep the current bound.
    pub fn changes(&self, current: &DateRange) -> Result<Vec<ControlChange>, DmVizError> {
        let mut changes = Vec::new();

        if let Some(granularity) = self.granularity {
            changes.push(ControlChange::Granularity(granularity));
        }
        if let Some(top_n) = self.top_n {
            changes.push(ControlChange::TopN(top_n));
        }
        if self.start.is_some() || self.end.is_some() {
            let start = self.start.map_or(current.start(), |p| p.first_month());
            let end = self.end.map_or(current.end(), |p| p.last_month());
            changes.push(ControlChange::Range(DateRange::new(start, end)?));
        }
        if let Some(mode) = self.rank_mode {
            changes.push(ControlChange::RankMode(mode));
        }
        if let Some(offset) = self.offset {
            changes.push(ControlChange::StackOffset(offset));
        }
        if let Some(scale) = self.scale {
            changes.push(ControlChange::HeatmapScale(scale));
        }
        if let Some(sort) = self.sort {
            changes.push(ControlChange::ResponseSort(sort));
        }
        if self.contact.is_some() {
            changes.push(ControlChange::Contact(self.contact.clone()));
        }
        if self.start_year.is_some() || self.end_year.is_some() {
            changes.push(ControlChange::Years(self.start_year, self.end_year));
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_chart_catalog_lists_every_chart() {
        let catalog = chart_catalog();
        for kind in ChartKind::ALL {
            assert!(catalog.contains(kind.as_str()), "{kind} missing from catalog");
        }
        assert!(catalog.contains("Messages sent versus received per contact"));
    }

    #[test]
    fn test_parse_chart_and_flags() {
        let args = Args::try_parse_from([
            "dmviz",
            "day-hour",
            "--contact",
            "Alice",
            "--start-year",
            "2020",
            "--hide",
            "Bob",
            "--hide",
            "Carol",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(args.chart, ChartKind::DayHour);
        assert_eq!(args.controls.contact.as_deref(), Some("Alice"));
        assert_eq!(args.controls.start_year, Some(2020));
        assert_eq!(args.controls.hide, vec!["Bob", "Carol"]);
        assert!(args.pretty);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Args::try_parse_from(["dmviz", "pie"]).is_err());
        assert!(Args::try_parse_from(["dmviz", "stream", "--offset", "zigzag"]).is_err());
        assert!(Args::try_parse_from(["dmviz", "line", "--start", "2020-13"]).is_err());
    }

    #[test]
    fn test_range_changes_keep_missing_bound() {
        let current = DateRange::parse("2019-08", "2025-12").unwrap();
        let args = Args::try_parse_from(["dmviz", "line", "--start", "2020-Q2"]).unwrap();

        let changes = args.controls.changes(&current).unwrap();
        assert_eq!(
            changes,
            vec![ControlChange::Range(DateRange::parse("2020-04", "2025-12").unwrap())]
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let current = DateRange::parse("2019-08", "2025-12").unwrap();
        let args =
            Args::try_parse_from(["dmviz", "line", "--start", "2021-01", "--end", "2020-01"]).unwrap();
        assert!(args.controls.changes(&current).is_err());
    }

    #[test]
    fn test_no_flags_no_changes() {
        let current = DateRange::parse("2019-08", "2025-12").unwrap();
        assert!(ControlArgs::default().changes(&current).unwrap().is_empty());
    }
}
