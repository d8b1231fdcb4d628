//! Bump chart: how contacts' ranks move from period to period.

use crate::aggregator::{RangeAggregator, RankedPoint};
use crate::traits::{ChartView, CountTables};
use crate::view_state::{Controls, ViewState};
use dmviz_common::{Period, RankMode};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// One contact's rank over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumpSeries {
    /// Contact name.
    pub name: String,
    /// Rank in every plotted period. Points ranked below the cut-off are
    /// kept so a line can leave and re-enter the chart.
    pub points: Vec<RankedPoint>,
    /// Hidden by the user.
    pub hidden: bool,
    /// Whether this is the selected contact.
    pub highlighted: bool,
}

/// A label drawn at the right edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndLabel {
    /// Contact name.
    pub name: String,
    /// Rank in the last period.
    pub rank: usize,
}

/// Derived bump chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BumpChartData {
    /// Plotted periods.
    pub periods: Vec<Period>,
    /// Ranks above this are off the chart.
    pub top_n: usize,
    /// Raw or cumulative ranking.
    pub mode: RankMode,
    /// Contacts ranked within `top_n` in at least one period.
    pub series: Vec<BumpSeries>,
    /// Contacts within `top_n` in the last period, best first.
    pub end_labels: Vec<EndLabel>,
}

/// Bump chart view.
#[derive(Debug, Clone, Copy)]
pub struct BumpChart {
    aggregator: RangeAggregator,
    pool_min: usize,
}

impl Default for BumpChart {
    fn default() -> Self {
        Self::new(RangeAggregator::default(), 30)
    }
}

impl BumpChart {
    /// Creates the view. At least `pool_min` contacts are ranked so that
    /// contacts just outside the top N can still climb into it.
    pub const fn new(aggregator: RangeAggregator, pool_min: usize) -> Self {
        Self {
            aggregator,
            pool_min,
        }
    }

    /// Number of contacts ranked for a given cut-off.
    pub fn pool_size(&self, top_n: usize) -> usize {
        top_n.saturating_mul(2).max(self.pool_min)
    }
}

impl ChartView for BumpChart {
    type Input<'a> = CountTables<'a>;
    type Output = BumpChartData;

    fn derive(&self, tables: CountTables<'_>, controls: &Controls, state: &ViewState) -> BumpChartData {
        let periods = self.aggregator.periods_in_range(tables.plotted, &controls.range);
        if periods.is_empty() {
            return BumpChartData::default();
        }

        let months = self.aggregator.periods_in_range(tables.monthly, &controls.range);
        let totals = self.aggregator.totals_over(tables.monthly, &months);
        let pool: HashSet<String> = self
            .aggregator
            .top_n(&totals, self.pool_size(controls.top_n))
            .into_iter()
            .collect();

        let entities: Vec<String> = tables
            .plotted
            .entities()
            .filter(|name| pool.contains(*name))
            .map(str::to_string)
            .collect();

        let rankings = self.aggregator.rank_entities_per_period(
            tables.plotted,
            &entities,
            &periods,
            controls.rank_mode,
        );

        // first entry into the top N, period by period, best rank first
        let mut seen = HashSet::new();
        let series: Vec<BumpSeries> = periods
            .iter()
            .flat_map(|period| rankings.entries(period))
            .filter(|entry| entry.rank <= controls.top_n && seen.insert(entry.name.as_str()))
            .map(|entry| BumpSeries {
                points: rankings.series(&entry.name),
                hidden: state.is_hidden(&entry.name),
                highlighted: state.is_selected(&entry.name),
                name: entry.name.clone(),
            })
            .collect();

        let last = periods[periods.len() - 1];
        let end_labels = rankings
            .entries(&last)
            .iter()
            .take_while(|e| e.rank <= controls.top_n)
            .map(|e| EndLabel {
                name: e.name.clone(),
                rank: e.rank,
            })
            .collect();

        debug!(
            pool = entities.len(),
            series = series.len(),
            periods = periods.len(),
            "Derived bump chart"
        );

        BumpChartData {
            periods,
            top_n: controls.top_n,
            mode: controls.rank_mode,
            series,
            end_labels,
        }
    }

    fn name(&self) -> &'static str {
        "bump"
    }

    fn description(&self) -> &'static str {
        "Contact ranking changes over time"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use dmviz_common::test_utils::snapshot_fixtures;
    use dmviz_common::{DateRange, Granularity};
    use dmviz_config::Config;

    fn controls(top_n: usize, mode: RankMode) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.range = DateRange::parse("2019-11", "2020-04").unwrap();
        controls.top_n = top_n;
        controls.rank_mode = mode;
        controls
    }

    #[test]
    fn test_cumulative_bump() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let view = BumpChart::new(RangeAggregator::default(), 0);

        let data = view.derive(
            CountTables::monthly(&table),
            &controls(1, RankMode::Cumulative),
            &ViewState::default(),
        );

        // pool is the top 2 by range total: Alice (120) and Bob (96).
        // Bob leads until Alice overtakes in 2020-02 (80 vs 76), so Bob
        // enters the chart first.
        let names: Vec<&str> = data.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
        let alice = &data.series[1].points;
        assert_eq!(alice.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![2, 2, 2, 1, 1, 1]);
        assert_eq!(data.end_labels, vec![EndLabel { name: "Alice".into(), rank: 1 }]);
    }

    #[test]
    fn test_period_mode_on_quarters() {
        let monthly = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let quarterly = Table::from_csv_str(snapshot_fixtures::quarterly_csv()).unwrap();
        assert_eq!(quarterly.granularity(), Granularity::Quarterly);

        let tables = CountTables {
            monthly: &monthly,
            plotted: &quarterly,
        };
        let data = BumpChart::default().derive(tables, &controls(2, RankMode::Period), &ViewState::default());

        assert_eq!(data.periods.len(), 3);
        assert_eq!(data.end_labels.len(), 2);
        assert_eq!(data.end_labels[0].name, "Carol");
        // 2019-Q4 ranks Bob over Alice; Carol first reaches the top 2 in 2020-Q1
        let names: Vec<&str> = data.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Carol"]);
    }

    #[test]
    fn test_pool_size() {
        let view = BumpChart::default();
        assert_eq!(view.pool_size(10), 30);
        assert_eq!(view.pool_size(20), 40);
    }
}
