// src/report/text.rs
//! Chat message: `<b>` labels, one block per group/subgroup, blank line
//! between blocks, `#Report` as the last line.

use crate::config::consts::REPORT_MARKER;
use crate::core::sanitize::escape_markup;
use crate::data::{DeltaSet, Metrics, StatisticsSnapshot};

const ERROR_TITLE: &str = "Ошибка получения статистики";
const EMPTY_TITLE: &str = "Статистика";
const EMPTY_TEXT: &str = "данные не найдены";

pub fn render_text(snap: &StatisticsSnapshot, deltas: &DeltaSet) -> String {
    if let Some(err) = &snap.extraction_error {
        return with_marker(bold_line!(ERROR_TITLE, err));
    }

    let mut blocks: Vec<String> = Vec::new();
    for (&key, group) in &snap.groups {
        blocks.push(block(&group.name, &group.metrics, |label| deltas.metric(key, label)));

        for (name, entries) in group.non_empty_subgroups() {
            blocks.push(block(name, entries, |label| deltas.sub_metric(key, name, label)));
        }
    }

    if blocks.is_empty() {
        return with_marker(bold_line!(EMPTY_TITLE, EMPTY_TEXT));
    }
    with_marker(blocks.join("\n\n"))
}

fn block<'a>(title: &str, metrics: &Metrics, delta: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut lines = vec![join!("<b>", &escape_markup(title), "</b>")];
    for (label, value) in metrics.iter() {
        let mut line = bold_line!(label, value);
        if let Some(d) = delta(label) {
            line.push_str(&join!(" (", &escape_markup(d), ")"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn with_marker(body: String) -> String {
    join!(&body, "\n\n", REPORT_MARKER)
}
