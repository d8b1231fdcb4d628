//! Graph manager: the single entry point from loaded data and controls to a
//! derived chart view.

use crate::aggregator::RangeAggregator;
use crate::bar_race::{BarRace, BarRaceData};
use crate::bump_chart::{BumpChart, BumpChartData};
use crate::data_fetcher::{DatasetKind, Snapshot};
use crate::day_hour::{DayHourChart, DayHourView};
use crate::heatmap::{Heatmap, HeatmapData};
use crate::line_chart::{LineChart, LineChartData};
use crate::response_times::{ResponseTimesChart, ResponseTimesData};
use crate::sent_received::{SentRecvData, SentReceivedScatter};
use crate::stream_graph::{StreamData, StreamGraph};
use crate::traits::{ChartView, CountTables};
use crate::view_state::{Controls, ViewState};
use dmviz_common::{DmVizError, Granularity, Result};
use dmviz_config::Config;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// The charts the manager can derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Monthly message lines.
    Line,
    /// Rank over time.
    Bump,
    /// Contact by period heatmap.
    Heatmap,
    /// Stacked streamgraph.
    Stream,
    /// Monthly bar race.
    Race,
    /// Sent versus received scatter.
    Scatter,
    /// Reply time comparison.
    Response,
    /// Weekday by hour grid.
    DayHour,
}

impl ChartKind {
    /// Every chart, in menu order.
    pub const ALL: &'static [Self] = &[
        Self::Line,
        Self::Bump,
        Self::Heatmap,
        Self::Stream,
        Self::Race,
        Self::Scatter,
        Self::Response,
        Self::DayHour,
    ];

    /// Command line name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bump => "bump",
            Self::Heatmap => "heatmap",
            Self::Stream => "stream",
            Self::Race => "race",
            Self::Scatter => "scatter",
            Self::Response => "response",
            Self::DayHour => "day-hour",
        }
    }

    /// Datasets this chart reads at the given granularity.
    pub fn required_datasets(self, granularity: Granularity) -> Vec<DatasetKind> {
        match self {
            Self::Line | Self::Race => vec![DatasetKind::Monthly],
            Self::Bump | Self::Heatmap | Self::Stream => {
                let mut kinds = vec![DatasetKind::Monthly];
                if granularity == Granularity::Quarterly {
                    kinds.push(DatasetKind::Quarterly);
                }
                kinds
            }
            Self::Scatter => vec![DatasetKind::SentReceived],
            Self::Response => vec![DatasetKind::ResponseTimes],
            Self::DayHour => vec![DatasetKind::DayHour],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = DmVizError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                DmVizError::validation_field(
                    format!("Unknown chart '{s}', expected one of {}", known.join(", ")),
                    "chart",
                )
            })
    }
}

/// A derived view of any chart, tagged with the chart name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", content = "view", rename_all = "kebab-case")]
pub enum DerivedView {
    /// Line chart.
    Line(LineChartData),
    /// Bump chart.
    Bump(BumpChartData),
    /// Heatmap.
    Heatmap(HeatmapData),
    /// Streamgraph.
    Stream(StreamData),
    /// Bar race.
    Race(BarRaceData),
    /// Sent versus received scatter.
    Scatter(SentRecvData),
    /// Response times.
    Response(ResponseTimesData),
    /// Day/hour grid; `None` when the contact has no data.
    DayHour(Option<DayHourView>),
}

impl DerivedView {
    /// The chart this view belongs to.
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Line(_) => ChartKind::Line,
            Self::Bump(_) => ChartKind::Bump,
            Self::Heatmap(_) => ChartKind::Heatmap,
            Self::Stream(_) => ChartKind::Stream,
            Self::Race(_) => ChartKind::Race,
            Self::Scatter(_) => ChartKind::Scatter,
            Self::Response(_) => ChartKind::Response,
            Self::DayHour(_) => ChartKind::DayHour,
        }
    }
}

/// Holds one configured instance of every chart view.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphManager {
    line: LineChart,
    bump: BumpChart,
    heatmap: Heatmap,
    stream: StreamGraph,
    race: BarRace,
    scatter: SentReceivedScatter,
    response: ResponseTimesChart,
    day_hour: DayHourChart,
}

impl GraphManager {
    /// Creates a manager whose views share the configured ranking policy.
    pub const fn from_config(config: &Config) -> Self {
        let aggregator = RangeAggregator::new(config.ranking.tie_break);
        Self {
            line: LineChart::new(aggregator),
            bump: BumpChart::new(aggregator, config.ranking.bump_pool_min),
            heatmap: Heatmap::new(aggregator),
            stream: StreamGraph::new(aggregator),
            race: BarRace::new(aggregator, config.ranking.race_pool, config.ranking.race_bars),
            scatter: SentReceivedScatter,
            response: ResponseTimesChart,
            day_hour: DayHourChart,
        }
    }

    /// Name and description of every chart.
    pub fn catalog(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            (self.line.name(), self.line.description()),
            (self.bump.name(), self.bump.description()),
            (self.heatmap.name(), self.heatmap.description()),
            (self.stream.name(), self.stream.description()),
            (self.race.name(), self.race.description()),
            (self.scatter.name(), self.scatter.description()),
            (self.response.name(), self.response.description()),
            (self.day_hour.name(), self.day_hour.description()),
        ]
    }

    /// Derives `chart` from the snapshot. Fails only when the snapshot lacks
    /// a dataset the chart needs.
    #[instrument(skip(self, snapshot, controls, state), fields(granularity = %controls.granularity))]
    pub fn derive(
        &self,
        chart: ChartKind,
        snapshot: &Snapshot,
        controls: &Controls,
        state: &ViewState,
    ) -> Result<DerivedView> {
        let view = match chart {
            ChartKind::Line => {
                DerivedView::Line(self.line.derive(snapshot.require_monthly()?, controls, state))
            }
            ChartKind::Bump => {
                DerivedView::Bump(self.bump.derive(count_tables(snapshot, controls)?, controls, state))
            }
            ChartKind::Heatmap => DerivedView::Heatmap(self.heatmap.derive(
                count_tables(snapshot, controls)?,
                controls,
                state,
            )),
            ChartKind::Stream => DerivedView::Stream(self.stream.derive(
                count_tables(snapshot, controls)?,
                controls,
                state,
            )),
            ChartKind::Race => {
                DerivedView::Race(self.race.derive(snapshot.require_monthly()?, controls, state))
            }
            ChartKind::Scatter => DerivedView::Scatter(self.scatter.derive(
                snapshot.require_sent_recv()?,
                controls,
                state,
            )),
            ChartKind::Response => DerivedView::Response(self.response.derive(
                snapshot.require_response_times()?,
                controls,
                state,
            )),
            ChartKind::DayHour => DerivedView::DayHour(self.day_hour.derive(
                snapshot.require_day_hour()?,
                controls,
                state,
            )),
        };

        debug!(chart = %chart, "Derived view");
        Ok(view)
    }
}

fn count_tables<'a>(snapshot: &'a Snapshot, controls: &Controls) -> Result<CountTables<'a>> {
    Ok(CountTables {
        monthly: snapshot.require_monthly()?,
        plotted: snapshot.require_table(controls.granularity)?,
    })
}
