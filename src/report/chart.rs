// src/report/chart.rs
//! Chart data: numeric (label, value) points derived from the model.

use crate::config::consts::ZERO_SLICE_VALUE;
use crate::core::number::parse_number;
use crate::data::{ChartSeries, MetricGroup, Metrics};

/// A group's own chart: strictly positive values only.
pub fn primary_series(group: &MetricGroup) -> ChartSeries {
    ChartSeries {
        title: group.name.clone(),
        points: group
            .metrics
            .iter()
            .filter_map(|(label, value)| {
                let v = parse_number(value)?;
                (v > 0.0).then(|| (s!(label), v))
            })
            .collect(),
    }
}

/// A subgroup panel: non-negative values, zero lifted to a thin slice so
/// it still shows up.
pub fn subgroup_series(title: &str, entries: Option<&Metrics>) -> ChartSeries {
    let points = entries
        .into_iter()
        .flat_map(Metrics::iter)
        .filter_map(|(label, value)| {
            let v = parse_number(value)?;
            if v < 0.0 {
                return None;
            }
            Some((s!(label), if v == 0.0 { ZERO_SLICE_VALUE } else { v }))
        })
        .collect();
    ChartSeries { title: s!(title), points }
}
