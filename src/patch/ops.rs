//! Backing-tree operations.
//!
//! The patcher never touches a real tree. Everything it does to one goes
//! through a `NodeOps` implementation: a document binding, a terminal
//! renderer, or [`MemoryDom`](crate::host::MemoryDom) in tests.

use crate::types::{ElmId, Namespace};

pub trait NodeOps {
    fn create_element(&mut self, tag: &str) -> ElmId;

    fn create_element_ns(&mut self, ns: &Namespace, tag: &str) -> ElmId;

    fn create_text_node(&mut self, text: &str) -> ElmId;

    fn create_comment(&mut self, text: &str) -> ElmId;

    /// Insert `child` before `reference`, or append when `reference` is
    /// `None`. A `child` that is already attached moves.
    fn insert_before(&mut self, parent: ElmId, child: ElmId, reference: Option<ElmId>);

    fn remove_child(&mut self, parent: ElmId, child: ElmId);

    fn append_child(&mut self, parent: ElmId, child: ElmId) {
        self.insert_before(parent, child, None);
    }

    fn parent_node(&self, elm: ElmId) -> Option<ElmId>;

    fn next_sibling(&self, elm: ElmId) -> Option<ElmId>;

    /// Tag name of an element; `None` for text and comments.
    fn tag_name(&self, elm: ElmId) -> Option<String>;

    /// Replace all content of `elm` with a single text run.
    fn set_text_content(&mut self, elm: ElmId, text: &str);

    fn set_style_scope(&mut self, elm: ElmId, scope_id: &str);

    fn set_attribute(&mut self, elm: ElmId, name: &str, value: &str);

    fn remove_attribute(&mut self, elm: ElmId, name: &str);
}
