//! Range aggregation and ranking over count tables.
//!
//! Every operation here is a pure function of its inputs: tables are only
//! read, and each call builds a fresh result.

use crate::stack::{stack, StackedSeries};
use crate::table::Table;
use dmviz_common::{DateRange, Period, RankMode, StackOffset, StackOrder, TieBreak};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{instrument, trace};

/// An entity's total over some set of periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTotal {
    /// Entity name.
    pub name: String,
    /// Sum of the entity's counts.
    pub total: u64,
}

/// One entity's position in one period's ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// Entity name.
    pub name: String,
    /// 1-based rank, 1 being the highest value.
    pub rank: usize,
    /// Raw or cumulative value the rank was computed from.
    pub value: u64,
}

/// One period of an entity's ranked series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedPoint {
    /// The period.
    pub period: Period,
    /// 1-based rank in that period.
    pub rank: usize,
    /// Value the rank was computed from.
    pub value: u64,
}

/// Per-period rankings, each sorted by rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRankings {
    mode: RankMode,
    periods: Vec<Period>,
    rankings: Vec<Vec<RankedEntry>>,
}

impl PeriodRankings {
    /// What the rankings compare.
    pub const fn mode(&self) -> RankMode {
        self.mode
    }

    /// Ranked periods, in the order given.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Whether no period was ranked.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Ranking of one period, best first.
    pub fn entries(&self, period: &Period) -> &[RankedEntry] {
        match self.periods.iter().position(|p| p == period) {
            Some(i) => &self.rankings[i],
            None => &[],
        }
    }

    /// Rank of `entity` in `period`.
    pub fn rank_of(&self, period: &Period, entity: &str) -> Option<usize> {
        self.entries(period)
            .iter()
            .find(|e| e.name == entity)
            .map(|e| e.rank)
    }

    /// `entity`'s rank in every period, in period order.
    pub fn series(&self, entity: &str) -> Vec<RankedPoint> {
        self.periods
            .iter()
            .zip(&self.rankings)
            .filter_map(|(period, entries)| {
                entries.iter().find(|e| e.name == entity).map(|e| RankedPoint {
                    period: *period,
                    rank: e.rank,
                    value: e.value,
                })
            })
            .collect()
    }

    /// Every `(period, ranking)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&Period, &[RankedEntry])> {
        self.periods
            .iter()
            .zip(self.rankings.iter().map(Vec::as_slice))
    }
}

/// Computes totals, top-N selections, per-period rankings and stacked
/// series over a [`Table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeAggregator {
    tie_break: TieBreak,
}

impl RangeAggregator {
    /// Creates an aggregator with the given tie-break policy.
    pub const fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Tie-break policy for equal values.
    pub const fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// The table's periods inside `range`, converted to the table's
    /// granularity first. An empty intersection is an empty list.
    pub fn periods_in_range(&self, table: &Table, range: &DateRange) -> Vec<Period> {
        range
            .to_granularity(table.granularity())
            .filter(table.periods())
    }

    /// Every entity's total over the periods in `range`, in table order.
    /// Entities without counts in the range total 0.
    pub fn totals_in_range(&self, table: &Table, range: &DateRange) -> Vec<EntityTotal> {
        let periods = self.periods_in_range(table, range);
        self.totals_over(table, &periods)
    }

    /// Every entity's total over `periods`, in table order.
    pub fn totals_over(&self, table: &Table, periods: &[Period]) -> Vec<EntityTotal> {
        let columns: Vec<usize> = periods.iter().filter_map(|p| table.period_index(p)).collect();
        table
            .rows()
            .iter()
            .map(|row| EntityTotal {
                name: row.name.clone(),
                total: columns
                    .iter()
                    .map(|&c| row.values[c])
                    .fold(0, u64::saturating_add),
            })
            .collect()
    }

    /// Totals sorted descending, ties resolved by the tie-break policy.
    pub fn rank_totals(&self, totals: &[EntityTotal]) -> Vec<EntityTotal> {
        let mut ranked = totals.to_vec();
        ranked.sort_by(|a, b| self.compare(&a.name, a.total, &b.name, b.total));
        ranked
    }

    /// Names of the `n` entities with the largest totals, best first.
    pub fn top_n(&self, totals: &[EntityTotal], n: usize) -> Vec<String> {
        let mut ranked = self.rank_totals(totals);
        ranked.truncate(n);
        ranked.into_iter().map(|t| t.name).collect()
    }

    /// Rankings of every table entity for each of `periods`.
    pub fn rank_per_period(&self, table: &Table, periods: &[Period], mode: RankMode) -> PeriodRankings {
        let entities: Vec<String> = table.entities().map(str::to_string).collect();
        self.rank_entities_per_period(table, &entities, periods, mode)
    }

    /// Rankings of `entities` for each of `periods`.
    ///
    /// In cumulative mode the value is the running sum over `periods` up to
    /// and including the ranked one. Entities absent from the table count 0.
    #[instrument(skip_all, fields(entities = entities.len(), periods = periods.len(), %mode))]
    pub fn rank_entities_per_period(
        &self,
        table: &Table,
        entities: &[String],
        periods: &[Period],
        mode: RankMode,
    ) -> PeriodRankings {
        let mut cumulative = vec![0u64; entities.len()];
        let mut rankings = Vec::with_capacity(periods.len());

        for period in periods {
            let mut values: Vec<(usize, u64)> = entities
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = table.value(name, period);
                    cumulative[i] = cumulative[i].saturating_add(value);
                    match mode {
                        RankMode::Period => (i, value),
                        RankMode::Cumulative => (i, cumulative[i]),
                    }
                })
                .collect();

            values.sort_by(|&(a, va), &(b, vb)| self.compare(&entities[a], va, &entities[b], vb));

            let entries: Vec<RankedEntry> = values
                .into_iter()
                .enumerate()
                .map(|(position, (i, value))| RankedEntry {
                    name: entities[i].clone(),
                    rank: position + 1,
                    value,
                })
                .collect();
            trace!(%period, leader = ?entries.first().map(|e| &e.name), "Ranked period");
            rankings.push(entries);
        }

        PeriodRankings {
            mode,
            periods: periods.to_vec(),
            rankings,
        }
    }

    /// One row per entity, one column per period. Unknown entities get a
    /// row of zeros.
    pub fn value_matrix(&self, table: &Table, entities: &[String], periods: &[Period]) -> Vec<Vec<u64>> {
        entities
            .iter()
            .map(|name| periods.iter().map(|p| table.value(name, p)).collect())
            .collect()
    }

    /// Stacked bands of `entities` over `periods`. Entities for which
    /// `hidden` holds keep their band but with zero height.
    pub fn stack_series<F>(
        &self,
        table: &Table,
        entities: &[String],
        periods: &[Period],
        offset: StackOffset,
        order: StackOrder,
        hidden: F,
    ) -> StackedSeries
    where
        F: Fn(&str) -> bool,
    {
        let mut matrix = self.value_matrix(table, entities, periods);
        for (row, name) in matrix.iter_mut().zip(entities) {
            if hidden(name) {
                row.iter_mut().for_each(|v| *v = 0);
            }
        }
        stack(entities, &to_f64(&matrix), offset, order)
    }

    fn compare(&self, a_name: &str, a: u64, b_name: &str, b: u64) -> Ordering {
        let by_value = b.cmp(&a);
        match self.tie_break {
            TieBreak::InsertionOrder => by_value,
            TieBreak::Name => by_value.then_with(|| a_name.cmp(b_name)),
        }
    }
}

/// Widen a count matrix for layout arithmetic.
#[allow(clippy::cast_precision_loss)]
fn to_f64(matrix: &[Vec<u64>]) -> Vec<Vec<f64>> {
    matrix
        .iter()
        .map(|row| row.iter().map(|&v| v as f64).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use dmviz_common::test_utils::snapshot_fixtures;
    use dmviz_common::Granularity;

    fn p(label: &str) -> Period {
        label.parse().unwrap()
    }

    fn example() -> Table {
        Table::from_csv_str(snapshot_fixtures::example_monthly_csv()).unwrap()
    }

    #[test]
    fn test_totals_and_top_n() {
        let table = example();
        let aggregator = RangeAggregator::default();
        let range = DateRange::parse("2020-01", "2020-02").unwrap();

        let totals = aggregator.totals_in_range(&table, &range);
        assert_eq!(
            totals,
            vec![
                EntityTotal { name: "A".into(), total: 8 },
                EntityTotal { name: "B".into(), total: 11 },
            ]
        );
        assert_eq!(aggregator.top_n(&totals, 1), vec!["B"]);
        assert_eq!(aggregator.top_n(&totals, 5), vec!["B", "A"]);
    }

    #[test]
    fn test_cumulative_ranks() {
        let table = example();
        let aggregator = RangeAggregator::default();
        let periods = table.periods().to_vec();

        let rankings = aggregator.rank_per_period(&table, &periods, RankMode::Cumulative);
        assert_eq!(rankings.rank_of(&p("2020-01"), "A"), Some(1));
        assert_eq!(rankings.rank_of(&p("2020-01"), "B"), Some(2));
        assert_eq!(rankings.rank_of(&p("2020-02"), "A"), Some(2));
        assert_eq!(rankings.rank_of(&p("2020-02"), "B"), Some(1));

        let b = rankings.series("B");
        assert_eq!(b.iter().map(|pt| pt.value).collect::<Vec<_>>(), vec![1, 11]);
    }

    #[test]
    fn test_period_mode_ranks_raw_values() {
        let table = example();
        let rankings =
            RangeAggregator::default().rank_per_period(&table, table.periods(), RankMode::Period);
        let entries = rankings.entries(&p("2020-02"));
        assert_eq!(entries[0].name, "B");
        assert_eq!(entries[0].value, 10);
        assert_eq!(entries[1].value, 3);
        assert!(rankings.entries(&p("2021-01")).is_empty());
    }

    #[test]
    fn test_tie_break_policies() {
        let table = TableBuilder::new(Granularity::Monthly)
            .row("Zoe", [(p("2020-01"), 5)])
            .unwrap()
            .row("Adam", [(p("2020-01"), 5)])
            .unwrap()
            .build();
        let range = DateRange::parse("2020-01", "2020-01").unwrap();

        let insertion = RangeAggregator::new(TieBreak::InsertionOrder);
        let totals = insertion.totals_in_range(&table, &range);
        assert_eq!(insertion.top_n(&totals, 2), vec!["Zoe", "Adam"]);

        let by_name = RangeAggregator::new(TieBreak::Name);
        assert_eq!(by_name.top_n(&totals, 2), vec!["Adam", "Zoe"]);
        let rankings = by_name.rank_per_period(&table, table.periods(), RankMode::Period);
        assert_eq!(rankings.rank_of(&p("2020-01"), "Adam"), Some(1));
    }

    #[test]
    fn test_quarter_table_with_month_range() {
        let table = Table::from_csv_str(snapshot_fixtures::quarterly_csv()).unwrap();
        let aggregator = RangeAggregator::default();
        let range = DateRange::parse("2020-02", "2020-04").unwrap();

        assert_eq!(aggregator.periods_in_range(&table, &range), vec![p("2020-Q1"), p("2020-Q2")]);
        let totals = aggregator.totals_in_range(&table, &range);
        assert_eq!(totals[0].total, 90);
    }

    #[test]
    fn test_empty_intersection() {
        let table = example();
        let aggregator = RangeAggregator::default();
        let range = DateRange::parse("2021-01", "2021-06").unwrap();

        assert!(aggregator.periods_in_range(&table, &range).is_empty());
        let totals = aggregator.totals_in_range(&table, &range);
        assert!(totals.iter().all(|t| t.total == 0));
        assert_eq!(totals.len(), 2);
        assert!(aggregator.rank_per_period(&table, &[], RankMode::Cumulative).is_empty());
    }

    #[test]
    fn test_value_matrix_and_stack() {
        let table = example();
        let aggregator = RangeAggregator::default();
        let entities = vec!["B".to_string(), "Ghost".to_string(), "A".to_string()];

        let matrix = aggregator.value_matrix(&table, &entities, table.periods());
        assert_eq!(matrix, vec![vec![1, 10], vec![0, 0], vec![5, 3]]);

        let stacked = aggregator.stack_series(
            &table,
            &entities,
            table.periods(),
            StackOffset::None,
            StackOrder::None,
            |_| false,
        );
        assert_eq!(stacked.bands[2].points[1], (10.0, 13.0));

        let without_b = aggregator.stack_series(
            &table,
            &entities,
            table.periods(),
            StackOffset::None,
            StackOrder::None,
            |name| name == "B",
        );
        assert_eq!(without_b.bands[0].points, vec![(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(without_b.bands[2].points[1], (0.0, 3.0));
    }

    #[test]
    fn test_sums_saturate_at_max_count() {
        let table = Table::from_csv_str("name,2020-01,2020-02\nA,18446744073709551615,1\nB,2,3\n").unwrap();
        let aggregator = RangeAggregator::default();
        let range = DateRange::parse("2020-01", "2020-02").unwrap();

        let totals = aggregator.totals_in_range(&table, &range);
        assert_eq!(totals[0].total, u64::MAX);
        assert_eq!(totals[1].total, 5);
        assert_eq!(aggregator.top_n(&totals, 1), vec!["A"]);

        let rankings = aggregator.rank_per_period(&table, table.periods(), RankMode::Cumulative);
        let a = rankings.series("A");
        assert_eq!(a.iter().map(|pt| pt.value).collect::<Vec<_>>(), vec![u64::MAX, u64::MAX]);
    }
}
