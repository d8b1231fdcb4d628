//! Stacked band layout for streamgraphs.
//!
//! Every series starts as the band `[0, v]` per column. The order policy
//! picks which series sits at the bottom, then the offset policy shifts the
//! bands so that each one starts where the previous one ends.

use dmviz_common::{StackOffset, StackOrder};
use serde::Serialize;

/// One series' lower and upper boundary per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackBand {
    /// Series key.
    pub name: String,
    /// Position of this band in the stacking order, 0 at the bottom.
    pub index: usize,
    /// `(y0, y1)` per column.
    pub points: Vec<(f64, f64)>,
}

/// Output of [`stack`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedSeries {
    /// Series indices from bottom to top.
    pub order: Vec<usize>,
    /// Bands in key order.
    pub bands: Vec<StackBand>,
}

impl StackedSeries {
    /// Lowest `y0` and highest `y1` over every band, `(0, 0)` when empty.
    pub fn extent(&self) -> (f64, f64) {
        let mut points = self.bands.iter().flat_map(|b| b.points.iter());
        let Some(&(first0, first1)) = points.next() else {
            return (0.0, 0.0);
        };
        points.fold((first0, first1), |(lo, hi), &(y0, y1)| (lo.min(y0), hi.max(y1)))
    }
}

/// Stack `values` (one row per key, one column per period).
///
/// Rows shorter than the longest row are padded with zeros.
pub fn stack(
    keys: &[String],
    values: &[Vec<f64>],
    offset: StackOffset,
    order: StackOrder,
) -> StackedSeries {
    let columns = values.iter().map(Vec::len).max().unwrap_or(0);
    let mut series: Vec<Vec<(f64, f64)>> = keys
        .iter()
        .enumerate()
        .map(|(i, _)| {
            (0..columns)
                .map(|j| {
                    let v = values.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0);
                    (0.0, if v.is_finite() { v } else { 0.0 })
                })
                .collect()
        })
        .collect();

    let order = match order {
        StackOrder::None => (0..series.len()).collect(),
        StackOrder::InsideOut => inside_out(&series),
    };

    match offset {
        StackOffset::None => offset_none(&mut series, &order),
        StackOffset::Expand => offset_expand(&mut series, &order),
        StackOffset::Silhouette => offset_silhouette(&mut series, &order),
        StackOffset::Wiggle => offset_wiggle(&mut series, &order),
    }

    let mut index = vec![0; series.len()];
    for (position, &i) in order.iter().enumerate() {
        index[i] = position;
    }

    let bands = keys
        .iter()
        .zip(series)
        .enumerate()
        .map(|(i, (name, points))| StackBand {
            name: name.clone(),
            index: index[i],
            points,
        })
        .collect();

    StackedSeries { order, bands }
}

/// Column index of a series' first maximum.
fn peak(points: &[(f64, f64)]) -> usize {
    let mut best = f64::NEG_INFINITY;
    let mut at = 0;
    for (j, &(_, v)) in points.iter().enumerate() {
        if v > best {
            best = v;
            at = j;
        }
    }
    at
}

/// Series ordered by peak, then split between top and bottom so the
/// earliest peaks sit in the middle.
fn inside_out(series: &[Vec<(f64, f64)>]) -> Vec<usize> {
    let peaks: Vec<usize> = series.iter().map(|s| peak(s)).collect();
    let sums: Vec<f64> = series.iter().map(|s| s.iter().map(|p| p.1).sum()).collect();

    let mut by_appearance: Vec<usize> = (0..series.len()).collect();
    by_appearance.sort_by_key(|&i| peaks[i]);

    let (mut top, mut bottom) = (0.0, 0.0);
    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    for i in by_appearance {
        if top < bottom {
            top += sums[i];
            tops.push(i);
        } else {
            bottom += sums[i];
            bottoms.push(i);
        }
    }

    bottoms.reverse();
    bottoms.extend(tops);
    bottoms
}

fn offset_none(series: &mut [Vec<(f64, f64)>], order: &[usize]) {
    for pair in order.windows(2) {
        let (below, above) = (pair[0], pair[1]);
        for j in 0..series[above].len() {
            let base = series[below][j].1;
            let point = &mut series[above][j];
            point.0 = base;
            point.1 += base;
        }
    }
}

fn offset_expand(series: &mut [Vec<(f64, f64)>], order: &[usize]) {
    let columns = series.first().map_or(0, Vec::len);
    for j in 0..columns {
        let total: f64 = series.iter().map(|s| s[j].1).sum();
        if total != 0.0 {
            for s in series.iter_mut() {
                s[j].1 /= total;
            }
        }
    }
    offset_none(series, order);
}

fn offset_silhouette(series: &mut [Vec<(f64, f64)>], order: &[usize]) {
    let Some(&bottom) = order.first() else {
        return;
    };
    for j in 0..series[bottom].len() {
        let total: f64 = series.iter().map(|s| s[j].1).sum();
        let point = &mut series[bottom][j];
        point.0 = -total / 2.0;
        point.1 += point.0;
    }
    offset_none(series, order);
}

fn offset_wiggle(series: &mut [Vec<(f64, f64)>], order: &[usize]) {
    let Some(&bottom) = order.first() else {
        return;
    };
    let columns = series[bottom].len();
    if columns == 0 {
        return;
    }

    let mut baseline = 0.0;
    for j in 1..columns {
        let (mut weight, mut slope) = (0.0, 0.0);
        for (position, &i) in order.iter().enumerate() {
            let current = series[i][j].1;
            let previous = series[i][j - 1].1;
            let mut change = (current - previous) / 2.0;
            for &k in &order[..position] {
                change += series[k][j].1 - series[k][j - 1].1;
            }
            weight += current;
            slope += change * current;
        }

        let point = &mut series[bottom][j - 1];
        point.0 = baseline;
        point.1 += baseline;
        if weight != 0.0 {
            baseline -= slope / weight;
        }
    }

    let point = &mut series[bottom][columns - 1];
    point.0 = baseline;
    point.1 += baseline;
    offset_none(series, order);
}
