//! Detailed snapshot datasets: sent/received counts, reply times and
//! day-of-week by hour-of-day grids.

use crate::table::NAME_COLUMN;
use csv::ReaderBuilder;
use dmviz_common::{DateRange, DmVizError, Granularity, Period, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use tracing::{debug, warn};

/// Days in a day/hour grid, Monday first.
pub const DAYS_PER_WEEK: usize = 7;

/// Hours in a day/hour grid.
pub const HOURS_PER_DAY: usize = 24;

/// A dense 7x24 count grid.
pub type DayHourGrid = [[u64; HOURS_PER_DAY]; DAYS_PER_WEEK];

static SENT_RECV_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2})_(sent|recv)$").expect("valid column regex"));

/// Direction of a sent/received column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Sent,
    Received,
}

/// One entity's monthly sent and received counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentRecvRow {
    /// Display name.
    pub name: String,
    /// Messages sent per month, aligned with [`SentRecvTable::months`].
    pub sent: Vec<u64>,
    /// Messages received per month, aligned with [`SentRecvTable::months`].
    pub recv: Vec<u64>,
}

/// Sent and received totals over a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentRecvTotals {
    /// Messages sent.
    pub sent: u64,
    /// Messages received.
    pub recv: u64,
}

/// Monthly sent/received table, parsed from `{month}_sent` and
/// `{month}_recv` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentRecvTable {
    months: Vec<Period>,
    rows: Vec<SentRecvRow>,
}

impl SentRecvTable {
    /// Parse from CSV text.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    /// Parse from any CSV reader. Unmatched columns such as `total_sent`
    /// are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let name_column = headers
            .iter()
            .position(|h| h == NAME_COLUMN)
            .ok_or_else(|| DmVizError::parse(format!("Missing '{NAME_COLUMN}' column")))?;

        let mut columns: Vec<(usize, Period, Direction)> = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            let Some(caps) = SENT_RECV_COLUMN.captures(header) else {
                continue;
            };
            let Ok(month) = caps[1].parse::<Period>() else {
                warn!(column = header, "Dropping column with an invalid month");
                continue;
            };
            let direction = if &caps[2] == "sent" {
                Direction::Sent
            } else {
                Direction::Received
            };
            columns.push((i, month, direction));
        }

        let months: Vec<Period> = columns
            .iter()
            .map(|(_, m, _)| *m)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position: HashMap<Period, usize> =
            months.iter().enumerate().map(|(i, m)| (*m, i)).collect();

        let mut rows = Vec::new();
        let mut seen = BTreeSet::new();
        for record in reader.records() {
            let record = record?;
            let Some(name) = record.get(name_column).filter(|n| !n.is_empty()) else {
                continue;
            };
            if !seen.insert(name.to_string()) {
                warn!(entity = name, "Duplicate entity, keeping the first row");
                continue;
            }

            let mut row = SentRecvRow {
                name: name.to_string(),
                sent: vec![0; months.len()],
                recv: vec![0; months.len()],
            };
            for (column, month, direction) in &columns {
                let value = record
                    .get(*column)
                    .and_then(|c| c.parse::<u64>().ok())
                    .unwrap_or(0);
                let slot = position[month];
                match direction {
                    Direction::Sent => row.sent[slot] = value,
                    Direction::Received => row.recv[slot] = value,
                }
            }
            rows.push(row);
        }

        debug!(entities = rows.len(), months = months.len(), "Parsed sent/received table");
        Ok(Self { months, rows })
    }

    /// Months with at least one column, ascending.
    pub fn months(&self) -> &[Period] {
        &self.months
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[SentRecvRow] {
        &self.rows
    }

    /// Sent and received sums over the months in `range`.
    pub fn totals_in_range(&self, row: &SentRecvRow, range: &DateRange) -> SentRecvTotals {
        let range = range.to_granularity(Granularity::Monthly);
        self.months
            .iter()
            .enumerate()
            .filter(|(_, m)| range.contains(m))
            .fold(SentRecvTotals { sent: 0, recv: 0 }, |acc, (i, _)| SentRecvTotals {
                sent: acc.sent.saturating_add(row.sent[i]),
                recv: acc.recv.saturating_add(row.recv[i]),
            })
    }
}

/// One `(entity, month)` row of median reply times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeRow {
    /// Display name.
    pub name: String,
    /// Month the replies fall in.
    pub month: Period,
    /// Median minutes before I replied.
    pub my_median_mins: Option<f64>,
    /// Median minutes before they replied.
    pub their_median_mins: Option<f64>,
    /// Replies I sent.
    pub my_count: u64,
    /// Replies they sent.
    pub their_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawResponseTimeRow {
    name: String,
    month: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    my_median_mins: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    their_median_mins: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    my_count: Option<u64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    their_count: Option<u64>,
}

/// Median reply times keyed by `(entity, month)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResponseTimeTable {
    rows: Vec<ResponseTimeRow>,
}

impl ResponseTimeTable {
    /// Parse from CSV text.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    /// Parse from any CSV reader. Rows whose month is not a `YYYY-MM` label
    /// are skipped; blank or non-numeric medians become `None`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for raw in reader.deserialize::<RawResponseTimeRow>() {
            let raw = raw?;
            let month = match raw.month.parse::<Period>() {
                Ok(month) if month.granularity() == Granularity::Monthly => month,
                _ => {
                    warn!(entity = %raw.name, month = %raw.month, "Skipping row with an invalid month");
                    continue;
                }
            };
            rows.push(ResponseTimeRow {
                name: raw.name,
                month,
                my_median_mins: raw.my_median_mins.filter(|v| v.is_finite()),
                their_median_mins: raw.their_median_mins.filter(|v| v.is_finite()),
                my_count: raw.my_count.unwrap_or(0),
                their_count: raw.their_count.unwrap_or(0),
            });
        }

        debug!(rows = rows.len(), "Parsed response time table");
        Ok(Self { rows })
    }

    /// Build from rows directly.
    pub fn from_rows(rows: Vec<ResponseTimeRow>) -> Self {
        Self { rows }
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[ResponseTimeRow] {
        &self.rows
    }

    /// Rows for one entity, in file order.
    pub fn rows_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResponseTimeRow> {
        self.rows.iter().filter(move |row| row.name == name)
    }
}

#[derive(Debug, Deserialize)]
struct RawDayHourEntry {
    #[serde(default)]
    by_year: BTreeMap<String, Vec<Vec<serde_json::Value>>>,
}

/// Day-of-week by hour-of-day grids per entity and year.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DayHourData {
    contacts: BTreeMap<String, BTreeMap<u16, DayHourGrid>>,
}

impl DayHourData {
    /// Parse the nested JSON snapshot. Short or missing rows and cells count
    /// as 0; non-year keys are skipped.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawDayHourEntry> = serde_json::from_str(content)
            .map_err(|e| DmVizError::parse_with_source("Invalid day/hour JSON", e))?;

        let mut contacts = BTreeMap::new();
        for (name, entry) in raw {
            let mut years = BTreeMap::new();
            for (year, rows) in entry.by_year {
                let Ok(year) = year.parse::<u16>() else {
                    warn!(entity = %name, year = %year, "Skipping non-numeric year");
                    continue;
                };
                years.insert(year, dense_grid(&rows));
            }
            contacts.insert(name, years);
        }

        debug!(contacts = contacts.len(), "Parsed day/hour data");
        Ok(Self { contacts })
    }

    /// Insert one grid, replacing any existing grid for that year.
    pub fn insert(&mut self, name: impl Into<String>, year: u16, grid: DayHourGrid) {
        self.contacts.entry(name.into()).or_default().insert(year, grid);
    }

    /// Contact names, ascending.
    pub fn contacts(&self) -> impl Iterator<Item = &str> {
        self.contacts.keys().map(String::as_str)
    }

    /// Whether `name` has any grid.
    pub fn contains(&self, name: &str) -> bool {
        self.contacts.contains_key(name)
    }

    /// Grids for one contact, by year.
    pub fn years_for(&self, name: &str) -> Option<&BTreeMap<u16, DayHourGrid>> {
        self.contacts.get(name)
    }

    /// Every year present for any contact, ascending.
    pub fn years(&self) -> Vec<u16> {
        self.contacts
            .values()
            .flat_map(BTreeMap::keys)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn dense_grid(rows: &[Vec<serde_json::Value>]) -> DayHourGrid {
    let mut grid = [[0; HOURS_PER_DAY]; DAYS_PER_WEEK];
    for (day, row) in rows.iter().take(DAYS_PER_WEEK).enumerate() {
        for (hour, cell) in row.iter().take(HOURS_PER_DAY).enumerate() {
            grid[day][hour] = cell.as_u64().unwrap_or(0);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::snapshot_fixtures;

    #[test]
    fn test_sent_recv_columns() {
        let table = SentRecvTable::from_csv_str(snapshot_fixtures::sent_recv_csv()).unwrap();
        assert_eq!(table.months().len(), 2);
        let alice = &table.rows()[0];
        assert_eq!(alice.sent, vec![10, 5]);
        assert_eq!(alice.recv, vec![20, 5]);

        let range = DateRange::parse("2020-02", "2020-02").unwrap();
        assert_eq!(
            table.totals_in_range(alice, &range),
            SentRecvTotals { sent: 5, recv: 5 }
        );
    }

    #[test]
    fn test_sent_recv_ignores_totals_columns() {
        let csv = "name,total_sent,total_recv,2021-03_sent,2021-03_recv,2021-13_sent\nA,9,9,4,,7\n";
        let table = SentRecvTable::from_csv_str(csv).unwrap();
        assert_eq!(table.months(), &["2021-03".parse::<Period>().unwrap()]);
        assert_eq!(table.rows()[0].sent, vec![4]);
        assert_eq!(table.rows()[0].recv, vec![0]);
    }

    #[test]
    fn test_response_times_blank_medians() {
        let table =
            ResponseTimeTable::from_csv_str(snapshot_fixtures::response_times_csv()).unwrap();
        assert_eq!(table.rows().len(), 6);

        let alice: Vec<_> = table.rows_for("Alice").collect();
        assert_eq!(alice[1].their_median_mins, None);
        assert_eq!(alice[1].my_median_mins, Some(7.0));

        let carol: Vec<_> = table.rows_for("Carol").collect();
        assert_eq!(carol[0].my_median_mins, None);
        assert_eq!(carol[0].their_count, 0);
    }

    #[test]
    fn test_response_times_skip_bad_month() {
        let csv = "name,month,my_median_mins,their_median_mins,my_count,their_count\nA,2020-Q1,1,1,1,1\nA,2020-01,n/a,2.5,1,x\n";
        let table = ResponseTimeTable::from_csv_str(csv).unwrap();
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].my_median_mins, None);
        assert_eq!(table.rows()[0].their_median_mins, Some(2.5));
        assert_eq!(table.rows()[0].their_count, 0);
    }

    #[test]
    fn test_day_hour_grids() {
        let data = DayHourData::from_json_str(&snapshot_fixtures::day_hour_json()).unwrap();
        assert_eq!(data.contacts().collect::<Vec<_>>(), vec!["Alice", "Bob"]);
        assert_eq!(data.years(), vec![2020, 2021, 2022]);

        let bob = data.years_for("Bob").unwrap();
        assert_eq!(bob[&2020][2][12], 3);
        // short grid padded with zeros
        assert_eq!(bob[&2022][0][1], 2);
        assert_eq!(bob[&2022][6][23], 0);
    }

    #[test]
    fn test_day_hour_invalid_json() {
        let err = DayHourData::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, DmVizError::Parse { .. }));
    }
}
