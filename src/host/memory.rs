//! In-memory backing tree.
//!
//! `MemoryDom` implements [`NodeOps`] over a slotmap arena and records every
//! mutation in an op log, so callers can assert exactly what a patch did:
//! how many nodes were created, inserted, moved or removed.
//!
//! Detached nodes stay in the arena; a removed node can be inserted again
//! (kept-alive components rely on this).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use slotmap::SlotMap;

use crate::patch::NodeOps;
use crate::types::{ElmId, Namespace};

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemNodeKind {
    Element { tag: String, ns: Option<Namespace> },
    Text,
    Comment,
}

#[derive(Debug, Clone)]
pub struct MemNode {
    pub kind: MemNodeKind,
    /// Content of text and comment nodes.
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    pub scope_id: Option<String>,
    pub parent: Option<ElmId>,
    pub children: Vec<ElmId>,
}

impl MemNode {
    fn new(kind: MemNodeKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            attrs: BTreeMap::new(),
            scope_id: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    CreateElement { elm: ElmId, tag: String },
    CreateText { elm: ElmId, text: String },
    CreateComment { elm: ElmId },
    /// A detached node attached.
    Insert { parent: ElmId, elm: ElmId },
    /// An attached node repositioned.
    Move { parent: ElmId, elm: ElmId },
    Remove { parent: ElmId, elm: ElmId },
    SetText { elm: ElmId, text: String },
    SetAttribute { elm: ElmId, name: String, value: String },
    RemoveAttribute { elm: ElmId, name: String },
    SetStyleScope { elm: ElmId, scope_id: String },
}

// =============================================================================
// MemoryDom
// =============================================================================

#[derive(Default)]
pub struct MemoryDom {
    nodes: SlotMap<ElmId, MemNode>,
    log: Vec<DomOp>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// A detached element, not recorded in the log.
    pub fn element(&mut self, tag: &str) -> ElmId {
        self.nodes.insert(MemNode::new(
            MemNodeKind::Element {
                tag: tag.to_string(),
                ns: None,
            },
            "",
        ))
    }

    /// A document-like scaffold: `<body><div id="app"></div></body>`.
    /// Returns `(body, app)`.
    pub fn scaffold(&mut self) -> (ElmId, ElmId) {
        let body = self.element("body");
        let app = self.element("div");
        if let Some(node) = self.nodes.get_mut(app) {
            node.attrs.insert("id".to_string(), "app".to_string());
            node.parent = Some(body);
        }
        if let Some(node) = self.nodes.get_mut(body) {
            node.children.push(app);
        }
        (body, app)
    }

    pub fn node(&self, elm: ElmId) -> Option<&MemNode> {
        self.nodes.get(elm)
    }

    pub fn children(&self, elm: ElmId) -> &[ElmId] {
        self.nodes.get(elm).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn attr(&self, elm: ElmId, name: &str) -> Option<&str> {
        self.nodes.get(elm)?.attrs.get(name).map(String::as_str)
    }

    pub fn is_attached(&self, elm: ElmId) -> bool {
        self.nodes.get(elm).is_some_and(|n| n.parent.is_some())
    }

    // -------------------------------------------------------------------------
    // Op Log
    // -------------------------------------------------------------------------

    pub fn log(&self) -> &[DomOp] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn creates(&self) -> usize {
        self.count(|op| {
            matches!(
                op,
                DomOp::CreateElement { .. } | DomOp::CreateText { .. } | DomOp::CreateComment { .. }
            )
        })
    }

    pub fn inserts(&self) -> usize {
        self.count(|op| matches!(op, DomOp::Insert { .. }))
    }

    pub fn moves(&self) -> usize {
        self.count(|op| matches!(op, DomOp::Move { .. }))
    }

    pub fn removes(&self) -> usize {
        self.count(|op| matches!(op, DomOp::Remove { .. }))
    }

    pub fn text_updates(&self) -> usize {
        self.count(|op| matches!(op, DomOp::SetText { .. }))
    }

    fn count(&self, f: impl Fn(&DomOp) -> bool) -> usize {
        self.log.iter().filter(|op| f(op)).count()
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Concatenated text under `elm`.
    pub fn text_content(&self, elm: ElmId) -> String {
        let mut out = String::new();
        self.collect_text(elm, &mut out);
        out
    }

    fn collect_text(&self, elm: ElmId, out: &mut String) {
        let Some(node) = self.nodes.get(elm) else { return };
        match node.kind {
            MemNodeKind::Text => out.push_str(&node.text),
            MemNodeKind::Comment => {}
            MemNodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Markup for the subtree at `elm`, attributes in name order.
    pub fn serialize(&self, elm: ElmId) -> String {
        let mut out = String::new();
        self.write_node(elm, &mut out);
        out
    }

    fn write_node(&self, elm: ElmId, out: &mut String) {
        let Some(node) = self.nodes.get(elm) else { return };
        match &node.kind {
            MemNodeKind::Text => out.push_str(&node.text),
            MemNodeKind::Comment => {
                let _ = write!(out, "<!--{}-->", node.text);
            }
            MemNodeKind::Element { tag, .. } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in &node.attrs {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                if let Some(scope_id) = &node.scope_id {
                    let _ = write!(out, " {scope_id}");
                }
                out.push('>');
                for &child in &node.children {
                    self.write_node(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn create(&mut self, kind: MemNodeKind, text: &str) -> ElmId {
        let elm = self.nodes.insert(MemNode::new(kind.clone(), text));
        let op = match kind {
            MemNodeKind::Element { tag, .. } => DomOp::CreateElement { elm, tag },
            MemNodeKind::Text => DomOp::CreateText {
                elm,
                text: text.to_string(),
            },
            MemNodeKind::Comment => DomOp::CreateComment { elm },
        };
        self.log.push(op);
        elm
    }

    fn detach(&mut self, elm: ElmId) -> Option<ElmId> {
        let parent = self.nodes.get_mut(elm)?.parent.take()?;
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != elm);
        }
        Some(parent)
    }
}

impl NodeOps for MemoryDom {
    fn create_element(&mut self, tag: &str) -> ElmId {
        self.create(
            MemNodeKind::Element {
                tag: tag.to_string(),
                ns: None,
            },
            "",
        )
    }

    fn create_element_ns(&mut self, ns: &Namespace, tag: &str) -> ElmId {
        self.create(
            MemNodeKind::Element {
                tag: tag.to_string(),
                ns: Some(ns.clone()),
            },
            "",
        )
    }

    fn create_text_node(&mut self, text: &str) -> ElmId {
        self.create(MemNodeKind::Text, text)
    }

    fn create_comment(&mut self, text: &str) -> ElmId {
        self.create(MemNodeKind::Comment, text)
    }

    fn insert_before(&mut self, parent: ElmId, child: ElmId, reference: Option<ElmId>) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        let was_attached = self.detach(child).is_some();
        let Some(node) = self.nodes.get_mut(parent) else { return };
        let index = reference
            .and_then(|r| node.children.iter().position(|&c| c == r))
            .unwrap_or(node.children.len());
        node.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.log.push(if was_attached {
            DomOp::Move { parent, elm: child }
        } else {
            DomOp::Insert { parent, elm: child }
        });
    }

    fn remove_child(&mut self, parent: ElmId, child: ElmId) {
        if self.nodes.get(child).and_then(|n| n.parent) != Some(parent) {
            return;
        }
        self.detach(child);
        self.log.push(DomOp::Remove { parent, elm: child });
    }

    fn parent_node(&self, elm: ElmId) -> Option<ElmId> {
        self.nodes.get(elm)?.parent
    }

    fn next_sibling(&self, elm: ElmId) -> Option<ElmId> {
        let parent = self.nodes.get(self.parent_node(elm)?)?;
        let index = parent.children.iter().position(|&c| c == elm)?;
        parent.children.get(index + 1).copied()
    }

    fn tag_name(&self, elm: ElmId) -> Option<String> {
        match &self.nodes.get(elm)?.kind {
            MemNodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    fn set_text_content(&mut self, elm: ElmId, text: &str) {
        let Some(is_element) = self.nodes.get(elm).map(|n| matches!(n.kind, MemNodeKind::Element { .. })) else {
            return;
        };
        if is_element {
            for child in std::mem::take(&mut self.nodes[elm].children) {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.parent = None;
                }
            }
            if !text.is_empty() {
                let mut text_node = MemNode::new(MemNodeKind::Text, text);
                text_node.parent = Some(elm);
                let child = self.nodes.insert(text_node);
                self.nodes[elm].children.push(child);
            }
        } else {
            self.nodes[elm].text = text.to_string();
        }
        self.log.push(DomOp::SetText {
            elm,
            text: text.to_string(),
        });
    }

    fn set_style_scope(&mut self, elm: ElmId, scope_id: &str) {
        if let Some(node) = self.nodes.get_mut(elm) {
            node.scope_id = Some(scope_id.to_string());
            self.log.push(DomOp::SetStyleScope {
                elm,
                scope_id: scope_id.to_string(),
            });
        }
    }

    fn set_attribute(&mut self, elm: ElmId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(elm) {
            node.attrs.insert(name.to_string(), value.to_string());
            self.log.push(DomOp::SetAttribute {
                elm,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn remove_attribute(&mut self, elm: ElmId, name: &str) {
        if let Some(node) = self.nodes.get_mut(elm) {
            if node.attrs.remove(name).is_some() {
                self.log.push(DomOp::RemoveAttribute {
                    elm,
                    name: name.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_move() {
        let mut dom = MemoryDom::new();
        let ul = dom.create_element("ul");
        let a = dom.create_element("li");
        let b = dom.create_element("li");
        dom.append_child(ul, a);
        dom.append_child(ul, b);
        dom.insert_before(ul, b, Some(a));

        assert_eq!(dom.children(ul), &[b, a]);
        assert_eq!(dom.inserts(), 2);
        assert_eq!(dom.moves(), 1);
        assert_eq!(dom.next_sibling(b), Some(a));
        assert_eq!(dom.next_sibling(a), None);
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let mut dom = MemoryDom::new();
        let p = dom.create_element("p");
        let span = dom.create_element("span");
        dom.append_child(p, span);
        dom.set_text_content(p, "hello");

        assert_eq!(dom.text_content(p), "hello");
        assert!(!dom.is_attached(span));
        assert_eq!(dom.serialize(p), "<p>hello</p>");
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut dom = MemoryDom::new();
        let (body, app) = dom.scaffold();
        dom.remove_child(body, app);
        assert!(!dom.is_attached(app));
        dom.append_child(body, app);
        assert_eq!(dom.serialize(body), "<body><div id=\"app\"></div></body>");
        assert_eq!(dom.removes(), 1);
        assert_eq!(dom.inserts(), 1);
    }
}
