//! Control values and per-session UI state threaded through view derivation.

use dmviz_common::{
    DateRange, DmVizError, Granularity, HeatmapScale, RankMode, ResponseSort, Result, StackOffset,
};
use dmviz_config::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Entities the user has hidden and the one they have selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Entities excluded from scales and stacks.
    pub hidden: BTreeSet<String>,
    /// Entity highlighted or expanded into a detail series.
    pub selected: Option<String>,
}

impl ViewState {
    /// Hide a visible entity or show a hidden one. Returns whether it is now
    /// hidden.
    pub fn toggle_hidden(&mut self, name: &str) -> bool {
        if self.hidden.remove(name) {
            false
        } else {
            self.hidden.insert(name.to_string());
            true
        }
    }

    /// Whether `name` is hidden.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    /// Select `name`; selecting the current selection clears it.
    pub fn select(&mut self, name: &str) {
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        } else {
            self.selected = Some(name.to_string());
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Whether `name` is the selected entity.
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.as_deref() == Some(name)
    }
}

/// Every control value a view can depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Bucket width for charts that support both.
    pub granularity: Granularity,
    /// Number of entities to show.
    pub top_n: usize,
    /// Month range.
    pub range: DateRange,
    /// Ranking mode for the bump chart.
    pub rank_mode: RankMode,
    /// Stream graph baseline.
    pub stack_offset: StackOffset,
    /// Heatmap colour scaling.
    pub heatmap_scale: HeatmapScale,
    /// Response time sort key.
    pub response_sort: ResponseSort,
    /// Day/hour contact; `None` sums every contact.
    pub contact: Option<String>,
    /// First year summed by the day/hour view.
    pub start_year: Option<u16>,
    /// Last year summed by the day/hour view.
    pub end_year: Option<u16>,
}

/// A single control edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlChange {
    /// Switch months and quarters.
    Granularity(Granularity),
    /// Change how many entities are shown.
    TopN(usize),
    /// Change the month range.
    Range(DateRange),
    /// Switch between raw and cumulative ranking.
    RankMode(RankMode),
    /// Change the stream baseline.
    StackOffset(StackOffset),
    /// Change heatmap scaling.
    HeatmapScale(HeatmapScale),
    /// Change the response sort key.
    ResponseSort(ResponseSort),
    /// Change the day/hour contact.
    Contact(Option<String>),
    /// Change the day/hour year span.
    Years(Option<u16>, Option<u16>),
}

impl ControlChange {
    /// Whether this change alters which entities are shown, invalidating
    /// hidden entities.
    pub const fn resets_hidden(&self) -> bool {
        matches!(self, Self::Granularity(_) | Self::TopN(_) | Self::Range(_))
    }
}

impl Controls {
    /// Controls initialised from the configured view defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            granularity: config.view.granularity,
            top_n: config.view.top_n,
            range: config.view.range()?,
            rank_mode: config.view.rank_mode,
            stack_offset: config.view.stack_offset,
            heatmap_scale: config.view.heatmap_scale,
            response_sort: config.view.response_sort,
            contact: None,
            start_year: None,
            end_year: None,
        })
    }

    /// Apply one change. Changes to granularity, top-N or range clear hidden
    /// entities; every other change keeps them.
    pub fn apply(&mut self, change: ControlChange, state: &mut ViewState) -> Result<()> {
        if change.resets_hidden() && !state.hidden.is_empty() {
            debug!(cleared = state.hidden.len(), "Clearing hidden entities");
            state.hidden.clear();
        }

        match change {
            ControlChange::Granularity(granularity) => self.granularity = granularity,
            ControlChange::TopN(0) => {
                return Err(DmVizError::validation_field("top_n must be at least 1", "top_n"));
            }
            ControlChange::TopN(n) => self.top_n = n,
            ControlChange::Range(range) => {
                self.range = range.to_granularity(Granularity::Monthly);
            }
            ControlChange::RankMode(mode) => self.rank_mode = mode,
            ControlChange::StackOffset(offset) => self.stack_offset = offset,
            ControlChange::HeatmapScale(scale) => self.heatmap_scale = scale,
            ControlChange::ResponseSort(sort) => self.response_sort = sort,
            ControlChange::Contact(contact) => self.contact = contact,
            ControlChange::Years(start, end) => {
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err(DmVizError::validation_field(
                            format!("Start year {start} is after end year {end}"),
                            "years",
                        ));
                    }
                }
                self.start_year = start;
                self.end_year = end;
            }
        }
        Ok(())
    }
}
