//! Sent versus received scatter plot.

use crate::datasets::SentRecvTable;
use crate::traits::ChartView;
use crate::view_state::{Controls, ViewState};
use dmviz_common::{safe_ratio, Period};
use serde::Serialize;

/// One contact's point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentRecvPoint {
    /// Contact name.
    pub name: String,
    /// Messages sent in the range.
    pub sent: u64,
    /// Messages received in the range.
    pub recv: u64,
    /// `sent + recv`.
    pub total: u64,
    /// `sent / recv`, dividing by 1 when nothing was received.
    pub ratio: f64,
    /// Whether this is the selected contact.
    pub highlighted: bool,
}

/// One active month of the selected contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentRecvDetailPoint {
    /// Month.
    pub month: Period,
    /// Messages sent that month.
    pub sent: u64,
    /// Messages received that month.
    pub recv: u64,
}

/// Monthly history of one contact over every month in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentRecvDetail {
    /// Contact name.
    pub name: String,
    /// Months with any traffic, ascending.
    pub points: Vec<SentRecvDetailPoint>,
    /// Largest monthly sent or received count.
    pub axis_max: u64,
}

/// Derived scatter plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentRecvData {
    /// Points, largest total first. Contacts with no messages are omitted.
    pub points: Vec<SentRecvPoint>,
    /// Largest of any point's sent or received count, for a square domain.
    pub max_value: u64,
    /// History of the selected contact, when one is selected and known.
    pub detail: Option<SentRecvDetail>,
}

/// Sent versus received view.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentReceivedScatter;

impl SentReceivedScatter {
    fn detail(table: &SentRecvTable, name: &str) -> Option<SentRecvDetail> {
        let row = table.rows().iter().find(|row| row.name == name)?;
        let points: Vec<SentRecvDetailPoint> = table
            .months()
            .iter()
            .enumerate()
            .map(|(i, month)| SentRecvDetailPoint {
                month: *month,
                sent: row.sent[i],
                recv: row.recv[i],
            })
            .filter(|p| p.sent > 0 || p.recv > 0)
            .collect();
        let axis_max = points.iter().map(|p| p.sent.max(p.recv)).max().unwrap_or(0);

        Some(SentRecvDetail {
            name: row.name.clone(),
            points,
            axis_max,
        })
    }
}

impl ChartView for SentReceivedScatter {
    type Input<'a> = &'a SentRecvTable;
    type Output = SentRecvData;

    fn derive(&self, table: &SentRecvTable, controls: &Controls, state: &ViewState) -> SentRecvData {
        let mut points: Vec<SentRecvPoint> = table
            .rows()
            .iter()
            .map(|row| {
                let totals = table.totals_in_range(row, &controls.range);
                SentRecvPoint {
                    name: row.name.clone(),
                    sent: totals.sent,
                    recv: totals.recv,
                    total: totals.sent.saturating_add(totals.recv),
                    ratio: safe_ratio(totals.sent, totals.recv),
                    highlighted: state.is_selected(&row.name),
                }
            })
            .filter(|p| p.total > 0)
            .collect();

        points.sort_by(|a, b| b.total.cmp(&a.total));
        let max_value = points.iter().map(|p| p.sent.max(p.recv)).max().unwrap_or(0);

        SentRecvData {
            points,
            max_value,
            detail: state
                .selected
                .as_deref()
                .and_then(|name| Self::detail(table, name)),
        }
    }

    fn name(&self) -> &'static str {
        "scatter"
    }

    fn description(&self) -> &'static str {
        "Messages sent versus received per contact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::snapshot_fixtures;
    use dmviz_common::DateRange;
    use dmviz_config::Config;

    fn controls(start: &str, end: &str) -> Controls {
        let mut controls = Controls::from_config(&Config::default()).unwrap();
        controls.range = DateRange::parse(start, end).unwrap();
        controls
    }

    #[test]
    fn test_points_and_ratio_guard() {
        let table = SentRecvTable::from_csv_str(snapshot_fixtures::sent_recv_csv()).unwrap();
        let data = SentReceivedScatter.derive(&table, &controls("2020-01", "2020-02"), &ViewState::default());

        // Bob never messaged and is dropped
        let names: Vec<&str> = data.points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);

        let alice = &data.points[0];
        assert_eq!((alice.sent, alice.recv, alice.total), (15, 25, 40));
        assert!((alice.ratio - 0.6).abs() < 1e-9);

        // nothing received: divide by 1
        let carol = &data.points[1];
        assert_eq!(carol.ratio, 10.0);
        assert_eq!(data.max_value, 25);
    }

    #[test]
    fn test_detail_skips_silent_months() {
        let table = SentRecvTable::from_csv_str(concat!(
            "name,2020-01_sent,2020-01_recv,2020-02_sent,2020-02_recv,2020-03_sent,2020-03_recv\n",
            "Dora,4,1,0,0,2,9\n",
        ))
        .unwrap();
        let mut state = ViewState::default();
        state.select("Dora");

        // the detail spans every month, not just the selected range
        let data = SentReceivedScatter.derive(&table, &controls("2020-01", "2020-01"), &state);
        let detail = data.detail.unwrap();
        let months: Vec<String> = detail.points.iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months, vec!["2020-01", "2020-03"]);
        assert_eq!((detail.points[1].sent, detail.points[1].recv), (2, 9));
        assert_eq!(detail.axis_max, 9);
        assert!(data.points[0].highlighted);
    }

    #[test]
    fn test_no_detail_without_known_selection() {
        let table = SentRecvTable::from_csv_str(snapshot_fixtures::sent_recv_csv()).unwrap();
        let controls = controls("2020-01", "2020-02");
        assert!(SentReceivedScatter.derive(&table, &controls, &ViewState::default()).detail.is_none());

        let mut state = ViewState::default();
        state.select("Zed");
        assert!(SentReceivedScatter.derive(&table, &controls, &state).detail.is_none());
    }

    #[test]
    fn test_totals_saturate() {
        let table = SentRecvTable::from_csv_str(concat!(
            "name,2020-01_sent,2020-01_recv,2020-02_sent,2020-02_recv\n",
            "Max,18446744073709551615,18446744073709551615,1,1\n",
        ))
        .unwrap();
        let data = SentReceivedScatter.derive(&table, &controls("2020-01", "2020-02"), &ViewState::default());
        assert_eq!(data.points[0].sent, u64::MAX);
        assert_eq!(data.points[0].total, u64::MAX);
    }

    #[test]
    fn test_zero_zero_ratio_is_zero() {
        assert_eq!(safe_ratio(0, 0), 0.0);
    }
}
