// src/data.rs
//
// The normalized statistics model shared by every stage:
//
// - MetricGroup: one dashboard card (label -> formatted value, plus named
//                nested blocks for the Posting card).
// - StatisticsSnapshot: one run's extraction result, error or groups.
// - PersistedSnapshot: the on-disk record of the last good run.
// - DeltaSet: formatted differences between a snapshot and the last record.
// - ChartSeries: numeric (label, value) points for one chart.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{Local, NaiveDateTime};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::consts::{P2P_GROUP_NAME, POSTING_GROUP_NAME};

/* ---------------- OrderedMap ---------------- */

/// String-keyed map that keeps first-insertion order (page order).
/// Re-inserting a key replaces the value in place.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self { Self { entries: Vec::new() } }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool { self.get(key).is_some() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// label -> formatted value, as printed on the page.
pub type Metrics = OrderedMap<String>;

/* ---------------- Groups ---------------- */

/// The two cards the dashboard is known to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    #[serde(rename = "p2p_bot")]
    P2p,
    #[serde(rename = "posting_bot")]
    Posting,
}

impl GroupKey {
    pub const ALL: [GroupKey; 2] = [GroupKey::P2p, GroupKey::Posting];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupKey::P2p => "p2p_bot",
            GroupKey::Posting => "posting_bot",
        }
    }

    /// Name shown in reports for this card.
    pub fn display_name(self) -> &'static str {
        match self {
            GroupKey::P2p => P2P_GROUP_NAME,
            GroupKey::Posting => POSTING_GROUP_NAME,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricGroup {
    pub name: String,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(rename = "subsections", default, skip_serializing_if = "OrderedMap::is_empty")]
    pub subgroups: OrderedMap<Metrics>,
}

impl MetricGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Nested blocks that actually hold entries.
    pub fn non_empty_subgroups(&self) -> impl Iterator<Item = (&str, &Metrics)> {
        self.subgroups.iter().filter(|(_, m)| !m.is_empty())
    }

    /// No metrics and no non-empty subgroup: treated as "card not found".
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.non_empty_subgroups().next().is_none()
    }
}

/* ---------------- Snapshots ---------------- */

/// One run's extraction result. With `extraction_error` set, `groups` is
/// empty and the snapshot is never diffed or saved.
#[derive(Clone, Debug)]
pub struct StatisticsSnapshot {
    pub groups: BTreeMap<GroupKey, MetricGroup>,
    pub captured_at: NaiveDateTime,
    pub extraction_error: Option<String>,
    /// The page as rendered, kept for diagnostics whatever the outcome.
    pub raw_html: String,
}

impl StatisticsSnapshot {
    pub fn new(raw_html: impl Into<String>) -> Self {
        Self {
            groups: BTreeMap::new(),
            captured_at: Local::now().naive_local(),
            extraction_error: None,
            raw_html: raw_html.into(),
        }
    }

    pub fn failed(error: impl Into<String>, raw_html: impl Into<String>) -> Self {
        Self { extraction_error: Some(error.into()), ..Self::new(raw_html) }
    }

    /// Attach a group unless it is empty; returns whether it was attached.
    pub fn attach(&mut self, key: GroupKey, group: MetricGroup) -> bool {
        if group.is_empty() {
            return false;
        }
        self.groups.insert(key, group);
        true
    }

    pub fn group(&self, key: GroupKey) -> Option<&MetricGroup> {
        self.groups.get(&key)
    }

    pub fn is_error(&self) -> bool {
        self.extraction_error.is_some()
    }
}

/// On-disk form: `{ p2p_bot?, posting_bot?, timestamp }`. Missing keys mean
/// the card was not on the page that run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_bot: Option<MetricGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_bot: Option<MetricGroup>,
    #[serde(with = "iso_timestamp")]
    pub timestamp: NaiveDateTime,
}

/// Naive ISO-8601 with microseconds, `2024-05-01T12:00:00.123456`, and no
/// fraction at all on a whole second. Reading accepts any fraction length.
mod iso_timestamp {
    use chrono::{NaiveDateTime, Timelike};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const WHOLE: &str = "%Y-%m-%dT%H:%M:%S";
    const MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    const ANY: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let fmt = if ts.nanosecond() < 1_000 { WHOLE } else { MICROS };
        serializer.collect_str(&ts.format(fmt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, ANY).map_err(D::Error::custom)
    }
}

impl PersistedSnapshot {
    pub fn from_snapshot(snap: &StatisticsSnapshot, timestamp: NaiveDateTime) -> Self {
        Self {
            p2p_bot: snap.group(GroupKey::P2p).cloned(),
            posting_bot: snap.group(GroupKey::Posting).cloned(),
            timestamp,
        }
    }

    pub fn group(&self, key: GroupKey) -> Option<&MetricGroup> {
        match key {
            GroupKey::P2p => self.p2p_bot.as_ref(),
            GroupKey::Posting => self.posting_bot.as_ref(),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupKey, &MetricGroup)> {
        GroupKey::ALL.into_iter().filter_map(|k| self.group(k).map(|g| (k, g)))
    }
}

/* ---------------- Deltas ---------------- */

/// label -> formatted signed delta.
pub type DeltaMap = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeltaSet {
    pub per_group: BTreeMap<GroupKey, DeltaMap>,
    pub per_subgroup: BTreeMap<GroupKey, BTreeMap<String, DeltaMap>>,
}

impl DeltaSet {
    /// True when no label anywhere carries a delta.
    pub fn is_empty(&self) -> bool {
        self.per_group.values().all(BTreeMap::is_empty)
            && self.per_subgroup.values().flat_map(BTreeMap::values).all(BTreeMap::is_empty)
    }

    pub fn metric(&self, key: GroupKey, label: &str) -> Option<&str> {
        self.per_group.get(&key)?.get(label).map(String::as_str)
    }

    pub fn sub_metric(&self, key: GroupKey, subgroup: &str, label: &str) -> Option<&str> {
        self.per_subgroup.get(&key)?.get(subgroup)?.get(label).map(String::as_str)
    }
}

/* ---------------- Charts ---------------- */

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub points: Vec<(String, f64)>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn total(&self) -> f64 { self.points.iter().map(|(_, v)| v).sum() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_map_keeps_first_position_on_replace() {
        let mut m = Metrics::new();
        m.insert("b", s!("1"));
        m.insert("a", s!("2"));
        m.insert("b", s!("3"));
        let keys: Vec<_> = m.keys().collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(m.get("b").map(String::as_str), Some("3"));
    }

    #[test]
    fn ordered_map_json_keeps_page_order() {
        let m: Metrics = [("z", s!("1")), ("a", s!("2"))].into_iter().collect();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
        let back: Metrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.keys().collect::<Vec<_>>(), ["z", "a"]);
    }

    #[test]
    fn group_with_only_empty_subgroups_is_empty() {
        let mut g = MetricGroup::new("Doxposting");
        g.subgroups.insert("Посты", Metrics::new());
        assert!(g.is_empty());
        g.subgroups.insert("Сторис", [("Всего", s!("3"))].into_iter().collect());
        assert!(!g.is_empty());
    }

    #[test]
    fn attach_drops_empty_groups() {
        let mut snap = StatisticsSnapshot::new("");
        assert!(!snap.attach(GroupKey::P2p, MetricGroup::new("p2pDox")));
        assert!(snap.groups.is_empty());
    }

    #[test]
    fn persisted_record_reads_naive_iso_timestamp() {
        let json = r#"{
            "p2p_bot": {"name": "p2pDox", "metrics": {"Активных": "100"}},
            "timestamp": "2024-05-01T12:00:00.123456"
        }"#;
        let rec: PersistedSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(rec.timestamp.format("%H:%M:%S%.6f").to_string(), "12:00:00.123456");
        assert!(rec.posting_bot.is_none());
        assert_eq!(rec.group(GroupKey::P2p).unwrap().metrics.get("Активных").unwrap(), "100");
    }

    #[test]
    fn timestamp_is_written_with_six_fraction_digits() {
        use chrono::NaiveDate;

        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let snap = StatisticsSnapshot::new("");
        let write = |ts| serde_json::to_value(PersistedSnapshot::from_snapshot(&snap, ts)).unwrap()["timestamp"].clone();

        assert_eq!(write(day.and_hms_micro_opt(12, 0, 0, 120_000).unwrap()), "2024-05-01T12:00:00.120000");
        assert_eq!(write(day.and_hms_nano_opt(12, 0, 0, 1_234_567).unwrap()), "2024-05-01T12:00:00.001234");
        assert_eq!(write(day.and_hms_opt(12, 0, 0).unwrap()), "2024-05-01T12:00:00");
    }
}
