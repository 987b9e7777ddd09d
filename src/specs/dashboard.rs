// src/specs/dashboard.rs
//! Extraction rules for the statistics dashboard.
//!
//! Page shape (Bootstrap cards, classes vary between revisions):
//! ```text
//! div.card                      top-level card, header text names the group
//!   div.card-header             "... P2P ..." | "... Posting ..."
//!   div.card-body
//!     div.info-item | div.d-flex   <label>Name:</label> <span class="badge">12</span>
//!     div.card.border-primary      Posts sub-card
//!       div.text-center            <div class="fs-3 fw-bold">12</div><div class="text-muted">Name</div>
//!     div.card.border-info         Stories sub-card (same box shape)
//! ```
//!
//! Every field is read through an ordered list of strategies; the first one
//! that yields anything wins and results are never merged across strategies.
//! A card that produces nothing is logged and left out, not an error.

use log::{debug, error, info, warn};

use crate::config::consts::{P2P_GROUP_NAME, POSTING_GROUP_NAME, POSTS_SUBGROUP, STORIES_SUBGROUP};
use crate::core::html::{Document, NodeId, Sel, ROOT};
use crate::data::{GroupKey, MetricGroup, Metrics, StatisticsSnapshot};
use crate::error::Result;

const CARD: Sel = Sel::tag_class("div", "card");
const CARD_HEADER: Sel = Sel::tag_class("div", "card-header");
const CARD_BODY: Sel = Sel::tag_class("div", "card-body");
const LABEL: Sel = Sel::tag("label");
const BADGE: Sel = Sel::tag_class("span", "badge");
const INFO_ITEM: Sel = Sel::tag_class("div", "info-item");
const FLEX_ROW: Sel = Sel::tag_class("div", "d-flex");
const STAT_BOX: Sel = Sel::tag_class("div", "text-center");
const STAT_LABEL: Sel = Sel::tag_class("div", "text-muted");
const STAT_VALUE: Sel = Sel::tag_contains("div", &["fs-3", "fw-bold"]);

/// One way of finding label/badge pairs: the wrapper element that holds a
/// `<label>` and a `span.badge`.
#[derive(Clone, Copy, Debug)]
pub struct PairStrategy {
    pub name: &'static str,
    pub wrapper: Sel,
}

/// P2P card: dedicated info items first, generic flex rows as fallback.
pub const P2P_STRATEGIES: &[PairStrategy] = &[
    PairStrategy { name: "info-item", wrapper: INFO_ITEM },
    PairStrategy { name: "d-flex", wrapper: FLEX_ROW },
];

/// Posting card: flex rows only (outside the sub-cards).
pub const POSTING_STRATEGIES: &[PairStrategy] = &[PairStrategy { name: "d-flex", wrapper: FLEX_ROW }];

/// Nested sub-cards of the Posting card, matched by partial class name.
#[derive(Clone, Copy, Debug)]
pub struct SubCard {
    pub subgroup: &'static str,
    pub sel: Sel,
}

pub const SUB_CARDS: &[SubCard] = &[
    SubCard { subgroup: POSTS_SUBGROUP, sel: Sel::tag_contains("div", &["border-primary"]) },
    SubCard { subgroup: STORIES_SUBGROUP, sel: Sel::tag_contains("div", &["border-info"]) },
];

/// Extract the statistics model from the rendered page. Never fails:
/// a structural failure comes back as `extraction_error` with no groups.
/// The HTML is kept on the snapshot either way.
pub fn extract(html: &str) -> StatisticsSnapshot {
    match parse_groups(html) {
        Ok(groups) => {
            let mut snap = StatisticsSnapshot::new(html);
            for (key, group) in groups {
                let (m, s) = (group.metrics.len(), group.non_empty_subgroups().count());
                if snap.attach(key, group) {
                    info!("Extract: {} -> {m} metrics, {s} subgroups", key.as_str());
                } else {
                    warn!("Extract: no {} metrics found", key.display_name());
                }
            }
            snap
        }
        Err(e) => {
            error!("Extract: failed to parse statistics: {e}");
            StatisticsSnapshot::failed(e.to_string(), html)
        }
    }
}

fn parse_groups(html: &str) -> Result<Vec<(GroupKey, MetricGroup)>> {
    let doc = Document::parse(html)?;

    let mut p2p = MetricGroup::new(P2P_GROUP_NAME);
    let mut posting = MetricGroup::new(POSTING_GROUP_NAME);

    for card in top_level_cards(&doc) {
        let Some(header) = doc.find(card, &CARD_HEADER) else { continue };
        let header_text = doc.text(header);
        let Some(key) = classify_header(&header_text) else {
            debug!("Extract: skipping card {header_text:?}");
            continue;
        };
        let Some(body) = doc.find(card, &CARD_BODY) else {
            debug!("Extract: card {header_text:?} has no body");
            continue;
        };

        match key {
            GroupKey::P2p => {
                info!("Extract: parsing P2P card");
                for (k, v) in first_non_empty(&doc, body, P2P_STRATEGIES, &|_: NodeId| false).iter() {
                    p2p.metrics.insert(k, s!(v));
                }
            }
            GroupKey::Posting => {
                info!("Extract: parsing Posting card");
                parse_posting_body(&doc, body, &mut posting);
            }
        }
    }

    Ok(vec![(GroupKey::P2p, p2p), (GroupKey::Posting, posting)])
}

/// `div.card` elements with no `div.card` ancestor.
fn top_level_cards(doc: &Document) -> Vec<NodeId> {
    doc.find_all(ROOT, &CARD)
        .into_iter()
        .filter(|&c| doc.closest(c, &CARD).is_none())
        .collect()
}

/// Case-sensitive substring match on the header text; "P2P" wins over
/// "Posting" when both appear.
pub fn classify_header(text: &str) -> Option<GroupKey> {
    if text.contains("P2P") {
        Some(GroupKey::P2p)
    } else if text.contains("Posting") {
        Some(GroupKey::Posting)
    } else {
        None
    }
}

fn parse_posting_body(doc: &Document, body: NodeId, group: &mut MetricGroup) {
    // Rows inside a sub-card belong to that sub-card, not to the card itself.
    let inside_sub_card = |id: NodeId| {
        doc.ancestors(id)
            .take_while(|&a| a != body)
            .any(|a| SUB_CARDS.iter().any(|sc| sc.sel.matches(doc, a)))
    };
    for (k, v) in first_non_empty(doc, body, POSTING_STRATEGIES, &inside_sub_card).iter() {
        group.metrics.insert(k, s!(v));
    }

    for sc in SUB_CARDS {
        let Some(card) = doc.find(body, &sc.sel) else {
            debug!("Extract: no {} sub-card", sc.subgroup);
            continue;
        };
        let entries = stat_boxes(doc, card);
        if entries.is_empty() {
            debug!("Extract: {} sub-card has no stat boxes", sc.subgroup);
            continue;
        }
        info!("Extract: {} -> {} entries", sc.subgroup, entries.len());
        group.subgroups.insert(sc.subgroup, entries);
    }
}

/// Run strategies in order; the first that finds any pair wins.
pub fn first_non_empty(
    doc: &Document,
    scope: NodeId,
    strategies: &[PairStrategy],
    exclude: &dyn Fn(NodeId) -> bool,
) -> Metrics {
    for strategy in strategies {
        let found = label_badge_pairs(doc, scope, &strategy.wrapper, exclude);
        if !found.is_empty() {
            debug!("Extract: {} pairs via {}", found.len(), strategy.name);
            return found;
        }
        debug!("Extract: nothing via {}", strategy.name);
    }
    Metrics::new()
}

fn label_badge_pairs(doc: &Document, scope: NodeId, wrapper: &Sel, exclude: &dyn Fn(NodeId) -> bool) -> Metrics {
    let mut out = Metrics::new();
    for item in doc.find_all(scope, wrapper) {
        if exclude(item) {
            continue;
        }
        let (Some(label), Some(badge)) = (doc.find(item, &LABEL), doc.find(item, &BADGE)) else {
            continue;
        };
        let key = clean_label(&doc.text(label));
        if key.is_empty() {
            continue;
        }
        out.insert(key, doc.text(badge));
    }
    out
}

/// Each `div.text-center` box gives one muted label and one emphasized value.
fn stat_boxes(doc: &Document, card: NodeId) -> Metrics {
    let mut out = Metrics::new();
    for b in doc.find_all(card, &STAT_BOX) {
        let value = doc.find(b, &STAT_VALUE).map(|v| doc.text(v));
        let label = doc.find(b, &STAT_LABEL).map(|l| doc.text(l));
        match (label, value) {
            (Some(l), Some(v)) if !l.is_empty() && !v.is_empty() => out.insert(l, v),
            _ => continue,
        }
    }
    out
}

fn clean_label(text: &str) -> String {
    s!(text.trim_end_matches(':').trim_end())
}
