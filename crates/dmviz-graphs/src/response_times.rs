//! Reply speed comparison: how fast I answer each contact versus how fast
//! they answer me.

use crate::datasets::ResponseTimeTable;
use crate::traits::ChartView;
use crate::view_state::{Controls, ViewState};
use dmviz_common::{median, truncate_name, Granularity, Period, ResponseSort};
use serde::Serialize;
use std::cmp::Ordering;

/// Sort key used for contacts without a median in the sorted direction.
pub const MISSING_SORT_MINUTES: f64 = 999.0;

/// Upper bound of the bar axis, in minutes.
pub const AXIS_CAP_MINUTES: f64 = 120.0;

/// Upper bound of the detail chart axis, in minutes.
pub const DETAIL_CAP_MINUTES: f64 = 60.0;

/// Longest label drawn beside a bar.
pub const LABEL_CHARS: usize = 18;

/// One contact's summary bar pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    /// Contact name.
    pub name: String,
    /// Name shortened for the axis.
    pub label: String,
    /// Median of my monthly medians, in minutes.
    pub my_response: Option<f64>,
    /// Median of their monthly medians, in minutes.
    pub their_response: Option<f64>,
    /// `my_response - their_response`, missing sides counting 0.
    pub difference: f64,
    /// Whether this is the selected contact.
    pub highlighted: bool,
}

/// One month of the selected contact's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetailPoint {
    /// Month.
    pub month: Period,
    /// My median that month.
    pub my_response: Option<f64>,
    /// Their median that month.
    pub their_response: Option<f64>,
}

/// Full history of one contact, regardless of the selected range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetail {
    /// Contact name.
    pub name: String,
    /// Months in file order.
    pub points: Vec<ResponseDetailPoint>,
    /// Top of the detail axis.
    pub axis_max: f64,
}

/// Derived response time chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseTimesData {
    /// Sort key used.
    pub sort: ResponseSort,
    /// Summaries in sort order, at most `top_n`.
    pub rows: Vec<ResponseSummary>,
    /// Top of the bar axis.
    pub axis_max: f64,
    /// Detail series for the selected contact.
    pub detail: Option<ResponseDetail>,
}

/// Response time view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTimesChart;

impl ResponseTimesChart {
    fn summaries(table: &ResponseTimeTable, controls: &Controls, state: &ViewState) -> Vec<ResponseSummary> {
        let range = controls.range.to_granularity(Granularity::Monthly);

        // contacts in order of first appearance
        let mut grouped: Vec<(&str, Vec<f64>, Vec<f64>)> = Vec::new();
        for row in table.rows().iter().filter(|r| range.contains(&r.month)) {
            let index = match grouped.iter().position(|(name, _, _)| *name == row.name) {
                Some(index) => index,
                None => {
                    grouped.push((row.name.as_str(), Vec::new(), Vec::new()));
                    grouped.len() - 1
                }
            };
            let (_, mine, theirs) = &mut grouped[index];
            mine.extend(row.my_median_mins);
            theirs.extend(row.their_median_mins);
        }

        grouped
            .into_iter()
            .filter_map(|(name, mine, theirs)| {
                let my_response = median(&mine);
                let their_response = median(&theirs);
                if my_response.is_none() && their_response.is_none() {
                    return None;
                }
                Some(ResponseSummary {
                    name: name.to_string(),
                    label: truncate_name(name, LABEL_CHARS),
                    my_response,
                    their_response,
                    difference: my_response.unwrap_or(0.0) - their_response.unwrap_or(0.0),
                    highlighted: state.is_selected(name),
                })
            })
            .collect()
    }

    fn detail(table: &ResponseTimeTable, name: &str) -> Option<ResponseDetail> {
        let points: Vec<ResponseDetailPoint> = table
            .rows_for(name)
            .map(|row| ResponseDetailPoint {
                month: row.month,
                my_response: row.my_median_mins,
                their_response: row.their_median_mins,
            })
            .collect();
        if points.is_empty() {
            return None;
        }

        let max = points
            .iter()
            .map(|p| p.my_response.unwrap_or(0.0).max(p.their_response.unwrap_or(0.0)))
            .fold(0.0, f64::max);

        Some(ResponseDetail {
            name: name.to_string(),
            points,
            axis_max: (max * 1.1).min(DETAIL_CAP_MINUTES),
        })
    }
}

fn sort_key(summary: &ResponseSummary, sort: ResponseSort) -> f64 {
    match sort {
        ResponseSort::MyResponse => summary.my_response.unwrap_or(MISSING_SORT_MINUTES),
        ResponseSort::TheirResponse => summary.their_response.unwrap_or(MISSING_SORT_MINUTES),
        ResponseSort::Difference => summary.difference,
    }
}

impl ChartView for ResponseTimesChart {
    type Input<'a> = &'a ResponseTimeTable;
    type Output = ResponseTimesData;

    fn derive(&self, table: &ResponseTimeTable, controls: &Controls, state: &ViewState) -> ResponseTimesData {
        let sort = controls.response_sort;
        let mut rows = Self::summaries(table, controls, state);
        rows.sort_by(|a, b| {
            sort_key(a, sort)
                .partial_cmp(&sort_key(b, sort))
                .unwrap_or(Ordering::Equal)
        });
        rows.truncate(controls.top_n);

        let max = rows
            .iter()
            .map(|r| r.my_response.unwrap_or(0.0).max(r.their_response.unwrap_or(0.0)))
            .fold(0.0, f64::max);

        ResponseTimesData {
            sort,
            rows,
            axis_max: (max * 1.1).min(AXIS_CAP_MINUTES),
            detail: state
                .selected
                .as_deref()
                .and_then(|name| Self::detail(table, name)),
        }
    }

    fn name(&self) -> &'static str {
        "response"
    }

    fn description(&self) -> &'static str {
        "Median reply times in each direction per contact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::{assert_approx_eq, snapshot_fixtures};
    use dmviz_common::DateRange;
    use dmviz_config::Config;

    fn controls(sort: ResponseSort) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.range = DateRange::parse("2020-01", "2020-02").unwrap();
        controls.response_sort = sort;
        controls
    }

    fn table() -> ResponseTimeTable {
        ResponseTimeTable::from_csv_str(snapshot_fixtures::response_times_csv()).unwrap()
    }

    fn derive_sorted(sort: ResponseSort) -> ResponseTimesData {
        ResponseTimesChart.derive(&table(), &controls(sort), &ViewState::default())
    }

    #[test]
    fn test_medians_within_range() {
        let data = derive_sorted(ResponseSort::Difference);

        // Carol has no medians at all and is dropped
        assert_eq!(data.rows.len(), 2);
        let alice = data.rows.iter().find(|r| r.name == "Alice").unwrap();
        // 2020-03 lies outside the range
        assert_eq!(alice.my_response, Some(6.0));
        assert_eq!(alice.their_response, Some(10.0));
        assert_approx_eq(alice.difference, -4.0, 1e-9);

        let bob = data.rows.iter().find(|r| r.name == "Bob").unwrap();
        assert_eq!(bob.my_response, None);
        assert_eq!(bob.their_response, Some(4.0));
        assert_approx_eq(bob.difference, -4.0, 1e-9);
    }

    #[test]
    fn test_sort_modes() {
        // difference ties keep first appearance order
        let names = |data: &ResponseTimesData| -> Vec<String> {
            data.rows.iter().map(|r| r.name.clone()).collect()
        };
        assert_eq!(names(&derive_sorted(ResponseSort::Difference)), vec!["Alice", "Bob"]);
        // Bob has no own replies and sorts as 999 minutes
        assert_eq!(names(&derive_sorted(ResponseSort::MyResponse)), vec!["Alice", "Bob"]);
        assert_eq!(names(&derive_sorted(ResponseSort::TheirResponse)), vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_top_n_and_axis() {
        let mut controls = controls(ResponseSort::TheirResponse);
        controls.top_n = 1;
        let data = ResponseTimesChart.derive(&table(), &controls, &ViewState::default());
        assert_eq!(data.rows.len(), 1);
        assert_approx_eq(data.axis_max, 4.4, 1e-9);
        assert!(data.detail.is_none());
    }

    #[test]
    fn test_detail_ignores_range() {
        let mut state = ViewState::default();
        state.select("Alice");
        let data = ResponseTimesChart.derive(&table(), &controls(ResponseSort::Difference), &state);

        let detail = data.detail.unwrap();
        assert_eq!(detail.points.len(), 3);
        assert_eq!(detail.points[2].their_response, Some(20.0));
        assert_approx_eq(detail.axis_max, 22.0, 1e-9);
        assert!(data.rows.iter().any(|r| r.highlighted));
    }
}
