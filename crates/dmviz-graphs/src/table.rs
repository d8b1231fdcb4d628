//! Entity by period count tables with a declared schema.
//!
//! A [`Table`] is built once from a snapshot file and never mutated. Its
//! columns are validated [`Period`]s of a single granularity, sorted
//! ascending; its rows keep the order in which entities appear in the file,
//! which is the order stable rankings fall back to.

use csv::{ReaderBuilder, StringRecord};
use dmviz_common::{DmVizError, Granularity, Period, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use tracing::{debug, warn};

/// Column holding the entity name.
pub const NAME_COLUMN: &str = "name";

/// Column holding the all-time message total.
pub const TOTAL_COLUMN: &str = "total_dm";

/// One entity's counts, aligned with the table's periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRow {
    /// Display name, unique within the table.
    pub name: String,
    /// Count per period, same length and order as [`Table::periods`].
    pub values: Vec<u64>,
    /// All-time total as written by the generator, when present.
    pub total_dm: Option<u64>,
}

/// Entity by period count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    granularity: Granularity,
    periods: Vec<Period>,
    rows: Vec<EntityRow>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Table {
    /// An empty table of the given granularity.
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            periods: Vec::new(),
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Parse a snapshot table from CSV text.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    /// Parse a snapshot table from any CSV reader.
    ///
    /// The granularity is taken from the first period-shaped column. Columns
    /// that are not `name`, `total_dm` or a period of that granularity are
    /// dropped, and cells that do not hold a non-negative integer count as 0.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let schema = CsvSchema::from_headers(&headers)?;

        let mut builder = TableBuilder::new(schema.granularity);
        for (_, period) in &schema.period_columns {
            builder.declare(*period)?;
        }

        for record in reader.records() {
            let record = record?;
            let Some(name) = record.get(schema.name_column).filter(|n| !n.is_empty()) else {
                debug!(line = ?record.position().map(csv::Position::line), "Skipping row without a name");
                continue;
            };

            let values = schema
                .period_columns
                .iter()
                .map(|(column, period)| (*period, parse_count(record.get(*column))));
            let total = schema
                .total_column
                .map(|column| parse_count(record.get(column)));

            builder.insert(name, values, total)?;
        }

        Ok(builder.build())
    }

    /// Granularity of every period column.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Period columns, ascending.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    /// Entity names in file order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.name.as_str())
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no entities.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row for `name`, if present.
    pub fn row(&self, name: &str) -> Option<&EntityRow> {
        self.index.get(name).map(|&i| &self.rows[i])
    }

    /// Whether the table has a row for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column index of `period`.
    pub fn period_index(&self, period: &Period) -> Option<usize> {
        self.periods.binary_search(period).ok()
    }

    /// Count for `name` in `period`; unknown entities and periods are 0.
    pub fn value(&self, name: &str, period: &Period) -> u64 {
        match (self.row(name), self.period_index(period)) {
            (Some(row), Some(column)) => row.values[column],
            _ => 0,
        }
    }
}

fn parse_count(cell: Option<&str>) -> u64 {
    cell.and_then(|c| c.trim().parse::<u64>().ok()).unwrap_or(0)
}

/// Column layout resolved from a CSV header row.
struct CsvSchema {
    granularity: Granularity,
    name_column: usize,
    total_column: Option<usize>,
    period_columns: Vec<(usize, Period)>,
}

impl CsvSchema {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let name_column = headers
            .iter()
            .position(|h| h == NAME_COLUMN)
            .ok_or_else(|| DmVizError::parse(format!("Missing '{NAME_COLUMN}' column")))?;
        let total_column = headers.iter().position(|h| h == TOTAL_COLUMN);

        let candidates: Vec<(usize, &str, Option<Period>)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != name_column && Some(*i) != total_column)
            .map(|(i, h)| (i, h, h.parse::<Period>().ok()))
            .collect();

        let granularity = candidates
            .iter()
            .find_map(|(_, _, p)| p.map(|p| p.granularity()))
            .unwrap_or_default();

        let mut seen = BTreeSet::new();
        let mut period_columns = Vec::new();
        for (column, header, period) in candidates {
            match period {
                Some(period) if period.granularity() == granularity => {
                    if seen.insert(period) {
                        period_columns.push((column, period));
                    } else {
                        warn!(column = header, "Dropping duplicate period column");
                    }
                }
                _ => warn!(column = header, %granularity, "Dropping non-conforming column"),
            }
        }

        Ok(Self {
            granularity,
            name_column,
            total_column,
            period_columns,
        })
    }
}

/// Incremental [`Table`] construction.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    granularity: Granularity,
    periods: BTreeSet<Period>,
    rows: Vec<(String, BTreeMap<Period, u64>, Option<u64>)>,
    names: HashMap<String, usize>,
}

impl TableBuilder {
    /// Start a table of the given granularity.
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            periods: BTreeSet::new(),
            rows: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Add a period column even if no row has a value for it.
    pub fn period(mut self, period: Period) -> Result<Self> {
        self.declare(period)?;
        Ok(self)
    }

    /// Add a row. Later rows with an existing name are ignored.
    pub fn row<I>(mut self, name: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Period, u64)>,
    {
        self.insert(&name.into(), values, None)?;
        Ok(self)
    }

    /// Finish the table.
    pub fn build(self) -> Table {
        let periods: Vec<Period> = self.periods.into_iter().collect();
        let rows: Vec<EntityRow> = self
            .rows
            .into_iter()
            .map(|(name, values, total_dm)| EntityRow {
                values: periods
                    .iter()
                    .map(|p| values.get(p).copied().unwrap_or(0))
                    .collect(),
                name,
                total_dm,
            })
            .collect();

        debug!(
            granularity = %self.granularity,
            entities = rows.len(),
            periods = periods.len(),
            "Built table"
        );

        Table {
            granularity: self.granularity,
            index: rows
                .iter()
                .enumerate()
                .map(|(i, row)| (row.name.clone(), i))
                .collect(),
            periods,
            rows,
        }
    }

    fn declare(&mut self, period: Period) -> Result<()> {
        if period.granularity() != self.granularity {
            return Err(DmVizError::validation_field(
                format!("Period {period} does not match a {} table", self.granularity),
                "period",
            ));
        }
        self.periods.insert(period);
        Ok(())
    }

    fn insert<I>(&mut self, name: &str, values: I, total: Option<u64>) -> Result<()>
    where
        I: IntoIterator<Item = (Period, u64)>,
    {
        if self.names.contains_key(name) {
            warn!(entity = name, "Duplicate entity, keeping the first row");
            return Ok(());
        }

        let mut row = BTreeMap::new();
        for (period, value) in values {
            self.declare(period)?;
            let cell = row.entry(period).or_insert(0u64);
            *cell = cell.saturating_add(value);
        }

        self.names.insert(name.to_string(), self.rows.len());
        self.rows.push((name.to_string(), row, total));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmviz_common::test_utils::snapshot_fixtures;

    fn month(label: &str) -> Period {
        label.parse().unwrap()
    }

    #[test]
    fn test_parse_example_table() {
        let table = Table::from_csv_str(snapshot_fixtures::example_monthly_csv()).unwrap();

        assert_eq!(table.granularity(), Granularity::Monthly);
        assert_eq!(table.periods(), &[month("2020-01"), month("2020-02")]);
        assert_eq!(table.entities().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(table.value("B", &month("2020-02")), 10);
        assert_eq!(table.row("A").unwrap().total_dm, Some(8));
    }

    #[test]
    fn test_non_numeric_and_missing_cells_are_zero() {
        let table = Table::from_csv_str(snapshot_fixtures::monthly_csv()).unwrap();
        assert_eq!(table.value("Dave", &month("2020-01")), 0);
        assert_eq!(table.value("Erin", &month("2020-03")), 0);
        assert_eq!(table.value("Nobody", &month("2020-03")), 0);
        assert_eq!(table.value("Alice", &month("1999-01")), 0);
    }

    #[test]
    fn test_quarterly_granularity_inferred() {
        let table = Table::from_csv_str(snapshot_fixtures::quarterly_csv()).unwrap();
        assert_eq!(table.granularity(), Granularity::Quarterly);
        assert_eq!(table.periods().len(), 3);
        assert_eq!(table.value("Bob", &"2019-Q4".parse().unwrap()), 70);
    }

    #[test]
    fn test_non_conforming_columns_dropped_and_sorted() {
        let csv = "name,2020-02,notes,2020-Q1,2020-13,2020-01,2020-02\nA,2,hi,9,9,1,7\n";
        let table = Table::from_csv_str(csv).unwrap();

        assert_eq!(table.periods(), &[month("2020-01"), month("2020-02")]);
        assert_eq!(table.row("A").unwrap().values, vec![1, 2]);
        assert_eq!(table.row("A").unwrap().total_dm, None);
    }

    #[test]
    fn test_duplicate_names_keep_first_row() {
        let csv = "name,2020-01\nA,1\nA,5\nB,2\n";
        let table = Table::from_csv_str(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value("A", &month("2020-01")), 1);
    }

    #[test]
    fn test_missing_name_column_is_parse_error() {
        let err = Table::from_csv_str("contact,2020-01\nA,1\n").unwrap_err();
        assert!(matches!(err, DmVizError::Parse { .. }));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = Table::from_csv_str("name,total_dm\n").unwrap();
        assert!(table.is_empty());
        assert!(table.periods().is_empty());
        assert_eq!(table.granularity(), Granularity::Monthly);
    }

    #[test]
    fn test_builder_rejects_mixed_granularity() {
        let result = TableBuilder::new(Granularity::Monthly)
            .row("A", [("2020-Q1".parse().unwrap(), 3)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_fills_gaps_with_zero() {
        let table = TableBuilder::new(Granularity::Monthly)
            .period(month("2020-03"))
            .unwrap()
            .row("A", [(month("2020-01"), 4)])
            .unwrap()
            .row("B", [(month("2020-02"), 6)])
            .unwrap()
            .build();

        assert_eq!(table.periods().len(), 3);
        assert_eq!(table.row("A").unwrap().values, vec![4, 0, 0]);
        assert_eq!(table.value("B", &month("2020-02")), 6);
        assert!(table.contains("B"));
    }

    #[test]
    fn test_builder_repeated_period_saturates() {
        let table = TableBuilder::new(Granularity::Monthly)
            .row("A", [(month("2020-01"), u64::MAX), (month("2020-01"), 7)])
            .unwrap()
            .build();
        assert_eq!(table.value("A", &month("2020-01")), u64::MAX);
    }
}
