// tests/diff.rs
mod common;

use chrono::NaiveDate;
use dox_stats::data::{GroupKey, MetricGroup, Metrics, PersistedSnapshot, StatisticsSnapshot};
use dox_stats::diff::compute_deltas;
use dox_stats::specs::dashboard::extract;

use common::dashboard_html;

fn metrics(pairs: &[(&str, &str)]) -> Metrics {
    pairs.iter().map(|&(k, v)| (k, v.to_string())).collect()
}

fn snapshot(p2p: &[(&str, &str)]) -> StatisticsSnapshot {
    let mut snap = StatisticsSnapshot::new("");
    let mut g = MetricGroup::new("p2pDox");
    g.metrics = metrics(p2p);
    snap.attach(GroupKey::P2p, g);
    snap
}

fn persisted(snap: &StatisticsSnapshot) -> PersistedSnapshot {
    let ts = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    PersistedSnapshot::from_snapshot(snap, ts)
}

#[test]
fn no_previous_record_means_no_deltas() {
    let snap = extract(&dashboard_html("100", "5"));
    assert!(compute_deltas(&snap, None).is_empty());
}

#[test]
fn a_snapshot_diffed_with_itself_is_empty() {
    let snap = extract(&dashboard_html("100", "5"));
    let prev = persisted(&snap);
    let deltas = compute_deltas(&snap, Some(&prev));
    assert!(deltas.is_empty());
    assert!(deltas.per_group.is_empty());
    assert!(deltas.per_subgroup.is_empty());
}

#[test]
fn integer_and_fractional_deltas_use_display_format() {
    let prev = persisted(&snapshot(&[("Активных", "100"), ("Конверсия", "1"), ("Всего", "2 000")]));
    let cur = snapshot(&[("Активных", "105"), ("Конверсия", "0,67"), ("Всего", "1\u{a0}997")]);
    let deltas = compute_deltas(&cur, Some(&prev));

    assert_eq!(deltas.metric(GroupKey::P2p, "Активных"), Some("+5"));
    assert_eq!(deltas.metric(GroupKey::P2p, "Конверсия"), Some("-0,33"));
    assert_eq!(deltas.metric(GroupKey::P2p, "Всего"), Some("-3"));
}

#[test]
fn labels_on_one_side_only_are_skipped() {
    let prev = persisted(&snapshot(&[("Старое", "1"), ("Общее", "10")]));
    let cur = snapshot(&[("Новое", "5"), ("Общее", "12")]);
    let deltas = compute_deltas(&cur, Some(&prev));

    assert_eq!(deltas.metric(GroupKey::P2p, "Общее"), Some("+2"));
    assert_eq!(deltas.metric(GroupKey::P2p, "Новое"), None);
    assert_eq!(deltas.metric(GroupKey::P2p, "Старое"), None);
}

#[test]
fn non_numeric_values_never_produce_a_delta() {
    let prev = persisted(&snapshot(&[("Статус", "ok"), ("Доля", "—")]));
    let cur = snapshot(&[("Статус", "fail"), ("Доля", "12")]);
    assert!(compute_deltas(&cur, Some(&prev)).is_empty());
}

#[test]
fn group_missing_from_history_is_skipped() {
    let prev = persisted(&snapshot(&[("Активных", "1")]));
    let cur = extract(&dashboard_html("3", "5"));
    let deltas = compute_deltas(&cur, Some(&prev));

    assert_eq!(deltas.metric(GroupKey::P2p, "Активных"), Some("+2"));
    assert!(!deltas.per_group.contains_key(&GroupKey::Posting));
}

#[test]
fn subgroup_entries_are_diffed_per_subgroup() {
    let prev = persisted(&extract(&dashboard_html("100", "5")));
    let cur = extract(&dashboard_html("100", "8"));
    let deltas = compute_deltas(&cur, Some(&prev));

    assert_eq!(deltas.sub_metric(GroupKey::Posting, "Посты", "Запланировано"), Some("+3"));
    assert_eq!(deltas.sub_metric(GroupKey::Posting, "Сторис", "Опубликовано"), None);
    assert!(deltas.per_group.is_empty());
}

#[test]
fn failed_extraction_is_never_diffed() {
    let prev = persisted(&snapshot(&[("Активных", "1")]));
    let cur = StatisticsSnapshot::failed("no main", "");
    assert!(compute_deltas(&cur, Some(&prev)).is_empty());
}
