// src/diff.rs
//! Deltas between this run and the last saved record.
//!
//! Only labels present on both sides are compared. Groups, subgroups or
//! labels that exist on one side only are skipped, so a dashboard that
//! gained or lost a field between runs still diffs cleanly.

use std::collections::BTreeMap;

use log::debug;

use crate::core::number::delta_between;
use crate::data::{DeltaMap, DeltaSet, Metrics, PersistedSnapshot, StatisticsSnapshot};

pub fn compute_deltas(current: &StatisticsSnapshot, previous: Option<&PersistedSnapshot>) -> DeltaSet {
    let mut out = DeltaSet::default();
    let Some(prev) = previous else {
        return out;
    };
    if current.is_error() {
        return out;
    }

    for (&key, cur_group) in &current.groups {
        let Some(prev_group) = prev.group(key) else {
            debug!("Diff: {} not in previous snapshot", key.as_str());
            continue;
        };

        let metrics = diff_metrics(&cur_group.metrics, &prev_group.metrics);
        if !metrics.is_empty() {
            out.per_group.insert(key, metrics);
        }

        let mut subs = BTreeMap::new();
        for (name, cur_sub) in cur_group.subgroups.iter() {
            if let Some(prev_sub) = prev_group.subgroups.get(name) {
                let d = diff_metrics(cur_sub, prev_sub);
                if !d.is_empty() {
                    subs.insert(s!(name), d);
                }
            }
        }
        if !subs.is_empty() {
            out.per_subgroup.insert(key, subs);
        }
    }
    out
}

/// Formatted delta per shared label; unchanged or non-numeric labels omitted.
pub fn diff_metrics(current: &Metrics, previous: &Metrics) -> DeltaMap {
    current
        .iter()
        .filter_map(|(label, cur)| {
            let prev = previous.get(label)?;
            delta_between(cur, prev).map(|d| (s!(label), d))
        })
        .collect()
}
