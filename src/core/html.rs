// src/core/html.rs
//! Tolerant HTML tree for offline page parsing.
//!
//! Not a conforming HTML5 parser. It builds an element/text tree good enough
//! for class-based lookups on rendered dashboard markup:
//! - comments, doctype and processing instructions are skipped
//! - `script`/`style` bodies are skipped wholesale
//! - void elements and `<x/>` never take children
//! - a close tag pops back to the nearest open element of that name;
//!   stray close tags are ignored, unclosed elements end at EOF
//! - tag and attribute names are lowercased, entities decoded

use crate::core::sanitize::decode_entities;
use crate::error::{Result, StatsError};

pub type NodeId = usize;

/// Synthetic document root; every parsed node descends from it.
pub const ROOT: NodeId = 0;

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];
const RAW_TEXT: &[&str] = &["script", "style"];

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

/// How an element's `class` attribute is matched.
#[derive(Clone, Copy, Debug)]
pub enum ClassMatch {
    Any,
    /// One whitespace-separated class equals the token.
    Token(&'static str),
    /// The raw attribute contains any of the substrings.
    Contains(&'static [&'static str]),
}

/// Minimal selector: optional tag name plus a class rule.
#[derive(Clone, Copy, Debug)]
pub struct Sel {
    pub tag: Option<&'static str>,
    pub class: ClassMatch,
}

impl Sel {
    pub const fn tag(tag: &'static str) -> Self {
        Self { tag: Some(tag), class: ClassMatch::Any }
    }
    pub const fn tag_class(tag: &'static str, token: &'static str) -> Self {
        Self { tag: Some(tag), class: ClassMatch::Token(token) }
    }
    pub const fn tag_contains(tag: &'static str, subs: &'static [&'static str]) -> Self {
        Self { tag: Some(tag), class: ClassMatch::Contains(subs) }
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(tag) = doc.tag(id) else { return false };
        if id == ROOT {
            return false;
        }
        if let Some(want) = self.tag {
            if tag != want {
                return false;
            }
        }
        match self.class {
            ClassMatch::Any => true,
            ClassMatch::Token(t) => doc.has_class(id, t),
            ClassMatch::Contains(subs) => {
                let class = doc.attr(id, "class").unwrap_or("");
                subs.iter().any(|s| class.contains(s))
            }
        }
    }
}

/// Pre-order walk below a node (the node itself excluded).
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.nodes[id].children.iter().rev());
        Some(id)
    }
}

impl Document {
    pub fn parse(src: &str) -> Result<Self> {
        let mut doc = Document {
            nodes: vec![Node {
                kind: NodeKind::Element { tag: s!("#root"), attrs: Vec::new() },
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut stack: Vec<NodeId> = vec![ROOT];

        let b = src.as_bytes();
        let n = b.len();
        let mut i = 0usize;
        let mut text_start = 0usize;

        while i < n {
            if b[i] != b'<' {
                i += 1;
                continue;
            }
            let kind = b.get(i + 1).copied();
            let is_markup = matches!(kind, Some(b'!' | b'?' | b'/'))
                || kind.is_some_and(|c| c.is_ascii_alphabetic());
            if !is_markup {
                // literal '<' in text
                i += 1;
                continue;
            }

            let parent = *stack.last().unwrap_or(&ROOT);
            doc.push_text(parent, &src[text_start..i]);

            match kind {
                Some(b'!') if src[i..].starts_with("<!--") => {
                    i = src[i + 4..].find("-->").map_or(n, |e| i + 4 + e + 3);
                }
                Some(b'!' | b'?') => {
                    i = src[i..].find('>').map_or(n, |e| i + e + 1);
                }
                Some(b'/') => {
                    let name_start = i + 2;
                    let mut j = name_start;
                    while j < n && b[j].is_ascii_alphanumeric() { j += 1; }
                    let name = src[name_start..j].to_ascii_lowercase();
                    i = src[j..].find('>').map_or(n, |e| j + e + 1);

                    if let Some(pos) = stack.iter().rposition(|&id| id != ROOT && doc.tag(id) == Some(name.as_str())) {
                        stack.truncate(pos);
                    }
                }
                _ => {
                    let Some((tag, end)) = parse_open_tag(src, i) else {
                        // unterminated tag at EOF
                        text_start = n;
                        break;
                    };
                    i = end;

                    if RAW_TEXT.contains(&tag.name.as_str()) {
                        let close = join!("</", &tag.name);
                        i = find_ci(b, i, close.as_bytes())
                            .and_then(|p| src[p..].find('>').map(|e| p + e + 1))
                            .unwrap_or(n);
                    } else {
                        let void = tag.self_closing || VOID.contains(&tag.name.as_str());
                        let id = doc.push_node(parent, NodeKind::Element { tag: tag.name, attrs: tag.attrs });
                        if !void {
                            stack.push(id);
                        }
                    }
                }
            }
            text_start = i;
        }
        if text_start < n {
            let parent = *stack.last().unwrap_or(&ROOT);
            doc.push_text(parent, &src[text_start..]);
        }

        if doc.element_count() == 0 {
            return Err(StatsError::extraction("document has no elements"));
        }
        Ok(doc)
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node { kind, parent: Some(parent), children: Vec::new() });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_text(&mut self, parent: NodeId, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        self.push_node(parent, NodeKind::Text(decode_entities(raw)));
    }

    /// Number of elements, the synthetic root excluded.
    pub fn element_count(&self) -> usize {
        self.nodes[1..]
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Element { .. }))
            .count()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_class(&self, id: NodeId, token: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == token))
    }

    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.nodes[id].children.iter().rev().copied().collect(),
        }
    }

    /// Parent chain up to (not including) the synthetic root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&p| self.nodes[p].parent)
            .filter(|&p| p != ROOT)
    }

    /// First matching descendant in document order.
    pub fn find(&self, scope: NodeId, sel: &Sel) -> Option<NodeId> {
        self.descendants(scope).find(|&id| sel.matches(self, id))
    }

    pub fn find_all(&self, scope: NodeId, sel: &Sel) -> Vec<NodeId> {
        self.descendants(scope).filter(|&id| sel.matches(self, id)).collect()
    }

    /// Nearest matching ancestor.
    pub fn closest(&self, id: NodeId, sel: &Sel) -> Option<NodeId> {
        self.ancestors(id).find(|&a| sel.matches(self, a))
    }

    /// Text content with each fragment trimmed and empty fragments dropped.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = s!();
        for d in self.descendants(id) {
            if let NodeKind::Text(t) = &self.nodes[d].kind {
                out.push_str(t.trim());
            }
        }
        out
    }
}

struct OpenTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

/// Parse `<name attr=.. attr="..">` starting at `lt`; returns the tag and
/// the index just past its `>`. Quoted values may contain `>`.
fn parse_open_tag(src: &str, lt: usize) -> Option<(OpenTag, usize)> {
    let b = src.as_bytes();
    let n = b.len();
    let mut i = lt + 1;

    let name_start = i;
    while i < n && !b[i].is_ascii_whitespace() && b[i] != b'>' && b[i] != b'/' { i += 1; }
    let name = src[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while i < n && b[i].is_ascii_whitespace() { i += 1; }
        if i >= n {
            return None;
        }
        match b[i] {
            b'>' => return Some((OpenTag { name, attrs, self_closing }, i + 1)),
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => {}
        }

        let an_start = i;
        while i < n && !b[i].is_ascii_whitespace() && !matches!(b[i], b'=' | b'>' | b'/') { i += 1; }
        let attr_name = src[an_start..i].to_ascii_lowercase();
        while i < n && b[i].is_ascii_whitespace() { i += 1; }

        let mut value = s!();
        if i < n && b[i] == b'=' {
            i += 1;
            while i < n && b[i].is_ascii_whitespace() { i += 1; }
            if i >= n {
                return None;
            }
            match b[i] {
                q @ (b'"' | b'\'') => {
                    let vs = i + 1;
                    let ve = src[vs..].find(q as char).map(|e| vs + e)?;
                    value = decode_entities(&src[vs..ve]);
                    i = ve + 1;
                }
                _ => {
                    let vs = i;
                    while i < n && !b[i].is_ascii_whitespace() && b[i] != b'>' { i += 1; }
                    value = decode_entities(&src[vs..i]);
                }
            }
        }
        if !attr_name.is_empty() {
            attrs.push((attr_name, value));
        }
        self_closing = false;
    }
}

/// ASCII case-insensitive search for `needle` in `hay[from..]`.
fn find_ci(hay: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document, sel: Sel) -> NodeId {
        doc.find(ROOT, &sel).expect("element present")
    }

    #[test]
    fn builds_nested_tree() {
        let doc = Document::parse(r#"<div class="a"><div class="b"><span>x</span></div></div>"#).unwrap();
        let span = first(&doc, Sel::tag("span"));
        let tags: Vec<_> = doc.ancestors(span).filter_map(|a| doc.tag(a)).collect();
        assert_eq!(tags, ["div", "div"]);
        assert_eq!(doc.text(ROOT), "x");
    }

    #[test]
    fn void_and_self_closing_take_no_children() {
        let doc = Document::parse("<div><input type=text><br/><label>L</label></div>").unwrap();
        let label = first(&doc, Sel::tag("label"));
        assert_eq!(doc.tag(doc.node(label).parent.unwrap()), Some("div"));
        let input = first(&doc, Sel::tag("input"));
        assert_eq!(doc.attr(input, "type"), Some("text"));
    }

    #[test]
    fn skips_comments_scripts_and_doctype() {
        let doc = Document::parse(
            "<!DOCTYPE html><!-- <div>no</div> --><script>if (a<b) { x = '</div>'; }</script><p>yes</p>",
        )
        .unwrap();
        assert_eq!(doc.text(ROOT), "yes");
        assert_eq!(doc.element_count(), 1);
    }

    #[test]
    fn quoted_attribute_may_hold_gt() {
        let doc = Document::parse(r#"<div data-x="a>b" class='card  border-primary'>t</div>"#).unwrap();
        let div = first(&doc, Sel::tag("div"));
        assert_eq!(doc.attr(div, "data-x"), Some("a>b"));
        assert!(doc.has_class(div, "card"));
        assert!(!doc.has_class(div, "border"));
        assert!(Sel::tag_contains("div", &["border-prim"]).matches(&doc, div));
    }

    #[test]
    fn stray_close_tags_are_ignored() {
        let doc = Document::parse("<div id=a></span><p>x</div><div id=b>y</div>").unwrap();
        let divs = doc.find_all(ROOT, &Sel::tag("div"));
        assert_eq!(divs.len(), 2);
        // the unclosed <p> is closed by </div>, so #b is a sibling of #a
        assert_eq!(doc.node(divs[1]).parent, Some(ROOT));
    }

    #[test]
    fn uppercase_tags_and_entities() {
        let doc = Document::parse("<DIV CLASS=Badge>1&nbsp;200</DIV>").unwrap();
        let div = first(&doc, Sel::tag("div"));
        assert_eq!(doc.attr(div, "class"), Some("Badge"));
        assert_eq!(doc.text(div), "1\u{a0}200");
    }

    #[test]
    fn text_joins_trimmed_fragments() {
        let doc = Document::parse("<label>  Активных \n <small>сейчас</small>: </label>").unwrap();
        assert_eq!(doc.text(first(&doc, Sel::tag("label"))), "Активныхсейчас:");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(Document::parse("").is_err());
        assert!(Document::parse("just text").is_err());
    }

    #[test]
    fn closest_finds_nearest_match() {
        let doc = Document::parse(r#"<div class="card"><div class="card-body"><i>z</i></div></div>"#).unwrap();
        let i = first(&doc, Sel::tag("i"));
        let card = doc.closest(i, &Sel::tag_class("div", "card")).unwrap();
        assert!(doc.has_class(card, "card"));
        assert!(doc.closest(card, &Sel::tag_class("div", "card")).is_none());
    }
}
