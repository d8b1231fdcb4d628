//! Weekly activity pattern: day of week by hour of day.

use crate::datasets::{DayHourData, DayHourGrid, DAYS_PER_WEEK, HOURS_PER_DAY};
use crate::heatmap::log_intensity;
use crate::traits::ChartView;
use crate::view_state::{Controls, ViewState};
use serde::Serialize;
use tracing::debug;

/// Row labels, Monday first.
pub const DAY_LABELS: [&str; DAYS_PER_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Derived day/hour grid for one contact, or every contact combined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHourView {
    /// Contact shown; `None` sums every contact.
    pub contact: Option<String>,
    /// First year summed.
    pub start_year: u16,
    /// Last year summed.
    pub end_year: u16,
    /// Summed counts, `grid[day][hour]`.
    pub grid: DayHourGrid,
    /// Log colour intensity per cell.
    pub intensities: Vec<Vec<f64>>,
    /// Largest cell.
    pub max_value: u64,
    /// Every contact in the data, ascending.
    pub contacts: Vec<String>,
    /// Every year in the data, ascending.
    pub years: Vec<u16>,
}

/// Day/hour view. Yields nothing for an unknown contact or empty data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayHourChart;

fn add_grid(total: &mut DayHourGrid, grid: &DayHourGrid) {
    for (total_row, row) in total.iter_mut().zip(grid) {
        for (cell, value) in total_row.iter_mut().zip(row) {
            *cell = cell.saturating_add(*value);
        }
    }
}

impl ChartView for DayHourChart {
    type Input<'a> = &'a DayHourData;
    type Output = Option<DayHourView>;

    fn derive(&self, data: &DayHourData, controls: &Controls, _state: &ViewState) -> Option<DayHourView> {
        let years = data.years();
        let start_year = controls.start_year.or_else(|| years.first().copied())?;
        let end_year = controls.end_year.or_else(|| years.last().copied())?;

        let mut grid = [[0; HOURS_PER_DAY]; DAYS_PER_WEEK];
        let contacts: Vec<&str> = match controls.contact.as_deref() {
            Some(name) if !data.contains(name) => {
                debug!(contact = name, "No day/hour data for contact");
                return None;
            }
            Some(name) => vec![name],
            None => data.contacts().collect(),
        };

        // an inverted span sums nothing
        if start_year <= end_year {
            for by_year in contacts.into_iter().filter_map(|name| data.years_for(name)) {
                for year_grid in by_year.range(start_year..=end_year).map(|(_, grid)| grid) {
                    add_grid(&mut grid, year_grid);
                }
            }
        }

        let max_value = grid.iter().flatten().copied().max().unwrap_or(0);
        let intensities = grid
            .iter()
            .map(|row| row.iter().map(|&v| log_intensity(v, max_value)).collect())
            .collect();

        Some(DayHourView {
            contact: controls.contact.clone(),
            start_year,
            end_year,
            grid,
            intensities,
            max_value,
            contacts: data.contacts().map(str::to_string).collect(),
            years,
        })
    }

    fn name(&self) -> &'static str {
        "day-hour"
    }

    fn description(&self) -> &'static str {
        "Messages by weekday and hour"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::snapshot_fixtures;
    use dmviz_config::Config;

    fn data() -> DayHourData {
        DayHourData::from_json_str(&snapshot_fixtures::day_hour_json()).unwrap()
    }

    fn controls(contact: Option<&str>, start: Option<u16>, end: Option<u16>) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.contact = contact.map(str::to_string);
        controls.start_year = start;
        controls.end_year = end;
        controls
    }

    #[test]
    fn test_contact_sums_selected_years() {
        let view = DayHourChart
            .derive(&data(), &controls(Some("Alice"), Some(2020), Some(2021)), &ViewState::default())
            .unwrap();
        assert_eq!(view.grid[0][9], 10);
        assert_eq!(view.grid[6][23], 1);
        assert_eq!(view.max_value, 10);
        assert_eq!(view.intensities[0][9], 1.0);
        assert_eq!(view.intensities[1][0], 0.0);

        let one_year = DayHourChart
            .derive(&data(), &controls(Some("Alice"), Some(2021), Some(2021)), &ViewState::default())
            .unwrap();
        assert_eq!(one_year.grid[0][9], 6);
        assert_eq!(one_year.grid[6][23], 0);
    }

    #[test]
    fn test_all_contacts_default_years() {
        let view = DayHourChart
            .derive(&data(), &controls(None, None, None), &ViewState::default())
            .unwrap();
        assert_eq!((view.start_year, view.end_year), (2020, 2022));
        assert_eq!(view.years, vec![2020, 2021, 2022]);
        assert_eq!(view.contacts, vec!["Alice", "Bob"]);
        assert_eq!(view.grid[0][9], 10);
        assert_eq!(view.grid[2][12], 3);
        // Bob's short 2022 grid is padded with zeros
        assert_eq!(view.grid[0][1], 2);
    }

    #[test]
    fn test_unknown_contact_yields_nothing() {
        let view = DayHourChart.derive(&data(), &controls(Some("Zed"), None, None), &ViewState::default());
        assert!(view.is_none());
        let empty = DayHourChart.derive(&DayHourData::default(), &controls(None, None, None), &ViewState::default());
        assert!(empty.is_none());
    }

    #[test]
    fn test_years_outside_data_give_empty_grid() {
        let view = DayHourChart
            .derive(&data(), &controls(Some("Bob"), Some(2010), Some(2011)), &ViewState::default())
            .unwrap();
        assert_eq!(view.max_value, 0);
        assert!(view.intensities.iter().flatten().all(|&i| i == 0.0));
    }
}
