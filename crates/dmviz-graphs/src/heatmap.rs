//! Contact by period heatmap on a log colour scale.

use crate::aggregator::RangeAggregator;
use crate::traits::{ChartView, CountTables};
use crate::view_state::{Controls, ViewState};
use dmviz_common::{HeatmapScale, Period};
use serde::Serialize;

/// Colour intensity in `[0, 1]` of `value` on a log scale topping out at
/// `max`. Zero cells are 0; the scale never tops out below 2.
#[allow(clippy::cast_precision_loss)]
pub fn log_intensity(value: u64, max: u64) -> f64 {
    if value == 0 {
        return 0.0;
    }
    let top = (max.max(2) as f64).ln();
    ((value.max(1) as f64).ln() / top).clamp(0.0, 1.0)
}

/// One heatmap row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    /// Contact name.
    pub name: String,
    /// Count per period.
    pub values: Vec<u64>,
    /// Colour intensity per period.
    pub intensities: Vec<f64>,
    /// Largest value in the row.
    pub row_max: u64,
}

/// Derived heatmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapData {
    /// Column periods.
    pub periods: Vec<Period>,
    /// Rows, largest monthly total first.
    pub rows: Vec<HeatmapRow>,
    /// Largest value over every cell.
    pub global_max: u64,
    /// Which maximum intensities were scaled against.
    pub scale: HeatmapScale,
    /// Column index where each year starts.
    pub year_starts: Vec<usize>,
}

/// Heatmap view.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heatmap {
    aggregator: RangeAggregator,
}

impl Heatmap {
    /// Creates the view.
    pub const fn new(aggregator: RangeAggregator) -> Self {
        Self { aggregator }
    }
}

impl ChartView for Heatmap {
    type Input<'a> = CountTables<'a>;
    type Output = HeatmapData;

    fn derive(&self, tables: CountTables<'_>, controls: &Controls, _state: &ViewState) -> HeatmapData {
        let periods = self.aggregator.periods_in_range(tables.plotted, &controls.range);
        if periods.is_empty() {
            return HeatmapData::default();
        }

        let months = self.aggregator.periods_in_range(tables.monthly, &controls.range);
        let top = self
            .aggregator
            .top_n(&self.aggregator.totals_over(tables.monthly, &months), controls.top_n);

        // contacts missing from the plotted table get no row
        let mut rows: Vec<HeatmapRow> = top
            .into_iter()
            .filter(|name| tables.plotted.contains(name))
            .map(|name| {
                let values: Vec<u64> = periods.iter().map(|p| tables.plotted.value(&name, p)).collect();
                HeatmapRow {
                    row_max: values.iter().copied().max().unwrap_or(0),
                    intensities: Vec::new(),
                    values,
                    name,
                }
            })
            .collect();

        let global_max = rows.iter().map(|r| r.row_max).max().unwrap_or(0);
        for row in &mut rows {
            let max = match controls.heatmap_scale {
                HeatmapScale::Global => global_max,
                HeatmapScale::Row => row.row_max,
            };
            row.intensities = row.values.iter().map(|&v| log_intensity(v, max)).collect();
        }

        let year_starts = periods
            .iter()
            .enumerate()
            .filter(|(i, p)| *i == 0 || periods[i - 1].year() != p.year())
            .map(|(i, _)| i)
            .collect();

        HeatmapData {
            periods,
            rows,
            global_max,
            scale: controls.heatmap_scale,
            year_starts,
        }
    }

    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn description(&self) -> &'static str {
        "Message volume per contact and period"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use dmviz_common::test_utils::{assert_approx_eq, snapshot_fixtures};
    use dmviz_common::DateRange;
    use dmviz_config::Config;

    fn controls(scale: HeatmapScale) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.range = DateRange::parse("2019-11", "2020-04").unwrap();
        controls.top_n = 3;
        controls.heatmap_scale = scale;
        controls
    }

    #[test]
    fn test_log_intensity() {
        assert_eq!(log_intensity(0, 100), 0.0);
        assert_eq!(log_intensity(1, 100), 0.0);
        assert_approx_eq(log_intensity(10, 100), 0.5, 1e-9);
        assert_eq!(log_intensity(100, 100), 1.0);
        // max below 2 is raised to 2
        assert_eq!(log_intensity(1, 0), 0.0);
        assert_eq!(log_intensity(5, 1), 1.0);
    }

    #[test]
    fn test_global_and_row_scaling() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let tables = CountTables::monthly(&table);

        let global = Heatmap::default().derive(tables, &controls(HeatmapScale::Global), &ViewState::default());
        let names: Vec<&str> = global.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(global.global_max, 40);
        assert_eq!(global.year_starts, vec![0, 2]);
        // Bob's 40 is the global maximum
        assert_eq!(global.rows[1].intensities[0], 1.0);
        assert!(global.rows[0].intensities[2] < 1.0);

        let row = Heatmap::default().derive(tables, &controls(HeatmapScale::Row), &ViewState::default());
        // Alice's 30 is her own row maximum
        assert_eq!(row.rows[0].intensities[2], 1.0);
        assert_eq!(row.rows[2].intensities[0], 0.0);
    }

    #[test]
    fn test_rows_missing_from_quarter_table_skipped() {
        let monthly = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        let quarterly = Table::from_csv_str("name,2019-Q4,2020-Q1\nBob,70,16\n").unwrap();
        let tables = CountTables {
            monthly: &monthly,
            plotted: &quarterly,
        };

        let data = Heatmap::default().derive(tables, &controls(HeatmapScale::Global), &ViewState::default());
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].name, "Bob");
        assert_eq!(data.periods.len(), 2);
    }
}
