//! Streamgraph of the top contacts' volume over time.

use crate::aggregator::RangeAggregator;
use crate::stack::StackedSeries;
use crate::traits::{ChartView, CountTables};
use crate::view_state::{Controls, ViewState};
use dmviz_common::{Period, StackOffset, StackOrder};
use serde::Serialize;

/// Legend entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamKey {
    /// Contact name.
    pub name: String,
    /// Hidden contacts are stacked with zero height.
    pub hidden: bool,
}

/// Derived streamgraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamData {
    /// Column periods.
    pub periods: Vec<Period>,
    /// Legend, largest monthly total first.
    pub keys: Vec<StreamKey>,
    /// Baseline policy used.
    pub offset: StackOffset,
    /// Bands in key order.
    pub stacked: StackedSeries,
    /// Lowest and highest band boundary.
    pub extent: (f64, f64),
}

impl Default for StreamData {
    fn default() -> Self {
        Self {
            periods: Vec::new(),
            keys: Vec::new(),
            offset: StackOffset::default(),
            stacked: StackedSeries {
                order: Vec::new(),
                bands: Vec::new(),
            },
            extent: (0.0, 0.0),
        }
    }
}

/// Streamgraph view.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamGraph {
    aggregator: RangeAggregator,
}

impl StreamGraph {
    /// Creates the view.
    pub const fn new(aggregator: RangeAggregator) -> Self {
        Self { aggregator }
    }
}

impl ChartView for StreamGraph {
    type Input<'a> = CountTables<'a>;
    type Output = StreamData;

    fn derive(&self, tables: CountTables<'_>, controls: &Controls, state: &ViewState) -> StreamData {
        let periods = self.aggregator.periods_in_range(tables.plotted, &controls.range);
        if periods.is_empty() {
            return StreamData {
                offset: controls.stack_offset,
                ..StreamData::default()
            };
        }

        let months = self.aggregator.periods_in_range(tables.monthly, &controls.range);
        let names = self
            .aggregator
            .top_n(&self.aggregator.totals_over(tables.monthly, &months), controls.top_n);

        let stacked = self.aggregator.stack_series(
            tables.plotted,
            &names,
            &periods,
            controls.stack_offset,
            StackOrder::InsideOut,
            |name| state.is_hidden(name),
        );
        let extent = stacked.extent();
        let keys = names
            .into_iter()
            .map(|name| StreamKey {
                hidden: state.is_hidden(&name),
                name,
            })
            .collect();

        StreamData {
            periods,
            keys,
            offset: controls.stack_offset,
            stacked,
            extent,
        }
    }

    fn name(&self) -> &'static str {
        "stream"
    }

    fn description(&self) -> &'static str {
        "Stacked message volume of the top contacts"
    }
}
