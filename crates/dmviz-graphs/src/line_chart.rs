//! Line chart of monthly counts for the top contacts in a range.

use crate::aggregator::RangeAggregator;
use crate::table::Table;
use crate::traits::ChartView;
use crate::view_state::{Controls, ViewState};
use dmviz_common::Period;
use serde::Serialize;

/// One contact's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSeries {
    /// Contact name.
    pub name: String,
    /// Total over the plotted months.
    pub total: u64,
    /// Count per plotted month.
    pub values: Vec<u64>,
    /// Hidden lines are drawn transparent and ignored by the y scale.
    pub hidden: bool,
    /// Whether this is the selected contact.
    pub highlighted: bool,
}

/// Derived line chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineChartData {
    /// Plotted months.
    pub periods: Vec<Period>,
    /// Lines, largest total first.
    pub series: Vec<LineSeries>,
    /// Largest value among visible lines.
    pub y_max: u64,
}

/// Line chart view.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineChart {
    aggregator: RangeAggregator,
}

impl LineChart {
    /// Creates the view.
    pub const fn new(aggregator: RangeAggregator) -> Self {
        Self { aggregator }
    }
}

impl ChartView for LineChart {
    type Input<'a> = &'a Table;
    type Output = LineChartData;

    fn derive(&self, table: &Table, controls: &Controls, state: &ViewState) -> LineChartData {
        let periods = self.aggregator.periods_in_range(table, &controls.range);
        if periods.is_empty() {
            return LineChartData::default();
        }

        let mut ranked = self
            .aggregator
            .rank_totals(&self.aggregator.totals_over(table, &periods));
        ranked.truncate(controls.top_n);

        let series: Vec<LineSeries> = ranked
            .into_iter()
            .map(|entity| LineSeries {
                values: periods.iter().map(|p| table.value(&entity.name, p)).collect(),
                hidden: state.is_hidden(&entity.name),
                highlighted: state.is_selected(&entity.name),
                total: entity.total,
                name: entity.name,
            })
            .collect();

        let y_max = series
            .iter()
            .filter(|s| !s.hidden)
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0);

        LineChartData {
            periods,
            series,
            y_max,
        }
    }

    fn name(&self) -> &'static str {
        "line"
    }

    fn description(&self) -> &'static str {
        "Monthly message counts for the top contacts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::snapshot_fixtures;
    use dmviz_common::DateRange;
    use dmviz_config::Config;

    fn controls(start: &str, end: &str, top_n: usize) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.range = DateRange::parse(start, end).unwrap();
        controls.top_n = top_n;
        controls
    }

    #[test]
    fn test_top_contacts_in_range() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let view = LineChart::default();

        let data = view.derive(&table, &controls("2020-01", "2020-04", 2), &ViewState::default());
        assert_eq!(data.periods.len(), 4);
        let names: Vec<&str> = data.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);
        assert_eq!(data.series[0].total, 90);
        assert_eq!(data.y_max, 30);
    }

    #[test]
    fn test_hidden_series_excluded_from_scale() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let mut state = ViewState::default();
        state.toggle_hidden("Bob");
        state.select("Alice");

        let data = LineChart::default().derive(&table, &controls("2019-11", "2019-12", 2), &state);
        let bob = data.series.iter().find(|s| s.name == "Bob").unwrap();
        assert!(bob.hidden);
        assert_eq!(data.series[0].name, "Bob");
        assert!(data.series[1].highlighted);
        assert_eq!(data.y_max, 20);
    }

    #[test]
    fn test_empty_range() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let data = LineChart::default().derive(&table, &controls("2024-01", "2024-02", 5), &ViewState::default());
        assert_eq!(data, LineChartData::default());
    }
}
