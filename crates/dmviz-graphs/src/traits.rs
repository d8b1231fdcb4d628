//! Chart view trait definitions for polymorphic chart types.

use crate::table::Table;
use crate::view_state::{Controls, ViewState};
use serde::Serialize;

/// Trait for charts that derive a render-ready view from loaded data.
///
/// Derivation is a pure function of the input, the controls and the view
/// state, so re-deriving after any control change always starts fresh.
pub trait ChartView: Send + Sync {
    /// The data this view reads.
    type Input<'a>;

    /// The derived, serializable view.
    type Output: Serialize;

    /// Derives the view. An empty period selection yields an empty output.
    fn derive(&self, input: Self::Input<'_>, controls: &Controls, state: &ViewState) -> Self::Output;

    /// Gets the name of this chart type.
    fn name(&self) -> &'static str;

    /// Gets the description of this chart type.
    fn description(&self) -> &'static str;
}

/// Count tables for views that pick entities by monthly totals but plot
/// them at the chosen granularity.
#[derive(Debug, Clone, Copy)]
pub struct CountTables<'a> {
    /// Monthly counts, used to choose entities.
    pub monthly: &'a Table,
    /// Counts at the chosen granularity, used for the plotted periods.
    pub plotted: &'a Table,
}

impl<'a> CountTables<'a> {
    /// Monthly counts plotted monthly.
    pub const fn monthly(table: &'a Table) -> Self {
        Self {
            monthly: table,
            plotted: table,
        }
    }
}
