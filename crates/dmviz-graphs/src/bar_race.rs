//! Bar chart race: one frame of ranked bars per month.

use crate::aggregator::RangeAggregator;
use crate::table::Table;
use crate::traits::ChartView;
use crate::view_state::{Controls, ViewState};
use dmviz_common::{period_label, Period, RankMode};
use serde::Serialize;

/// One bar in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceBar {
    /// Contact name.
    pub name: String,
    /// 1-based position in the frame.
    pub rank: usize,
    /// Messages that month.
    pub value: u64,
}

/// One animation frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceFrame {
    /// The month shown.
    pub period: Period,
    /// Display label such as `Jan 2020`.
    pub label: String,
    /// The leading bars, best first.
    pub bars: Vec<RaceBar>,
}

/// Derived bar race.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarRaceData {
    /// Frames in month order.
    pub frames: Vec<RaceFrame>,
    /// Largest bar over every frame, for a fixed axis.
    pub max_value: u64,
}

/// Bar race view.
#[derive(Debug, Clone, Copy)]
pub struct BarRace {
    aggregator: RangeAggregator,
    pool: usize,
    bars: usize,
}

impl Default for BarRace {
    fn default() -> Self {
        Self::new(RangeAggregator::default(), 50, 12)
    }
}

impl BarRace {
    /// Creates the view. Frames rank the `pool` contacts with the largest
    /// range totals and keep `bars` of them.
    pub const fn new(aggregator: RangeAggregator, pool: usize, bars: usize) -> Self {
        Self {
            aggregator,
            pool,
            bars,
        }
    }
}

impl ChartView for BarRace {
    type Input<'a> = &'a Table;
    type Output = BarRaceData;

    fn derive(&self, table: &Table, controls: &Controls, _state: &ViewState) -> BarRaceData {
        let months = self.aggregator.periods_in_range(table, &controls.range);
        if months.is_empty() {
            return BarRaceData::default();
        }

        let pool = self
            .aggregator
            .top_n(&self.aggregator.totals_over(table, &months), self.pool);
        let entities: Vec<String> = table
            .entities()
            .filter(|name| pool.iter().any(|p| p == name))
            .map(str::to_string)
            .collect();

        let rankings =
            self.aggregator
                .rank_entities_per_period(table, &entities, &months, RankMode::Period);

        let frames: Vec<RaceFrame> = rankings
            .iter()
            .map(|(period, entries)| RaceFrame {
                period: *period,
                label: period_label(period),
                bars: entries
                    .iter()
                    .take(self.bars)
                    .map(|e| RaceBar {
                        name: e.name.clone(),
                        rank: e.rank,
                        value: e.value,
                    })
                    .collect(),
            })
            .collect();

        let max_value = frames
            .iter()
            .flat_map(|f| f.bars.iter().map(|b| b.value))
            .max()
            .unwrap_or(0);

        BarRaceData { frames, max_value }
    }

    fn name(&self) -> &'static str {
        "race"
    }

    fn description(&self) -> &'static str {
        "Monthly leaderboard of contacts"
    }
}
