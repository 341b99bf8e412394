//! Render context - what a render function builds its tree with.

use std::rc::Rc;

use crate::types::{Normalization, Value};
use crate::vnode::{create_element, Child, DataArg, TagRef, VNode};

use super::instance::ComponentInstance;

/// Handed to a component's render function.
///
/// Nodes built through the context are owned by its instance: they resolve
/// components from its registries and report diagnostics against it.
pub struct RenderContext<'a> {
    instance: &'a Rc<ComponentInstance>,
}

impl<'a> RenderContext<'a> {
    pub fn new(instance: &'a Rc<ComponentInstance>) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &Rc<ComponentInstance> {
        self.instance
    }

    /// Build a node from hand-written children (full normalization).
    pub fn h(&self, tag: impl Into<TagRef>, data: impl Into<DataArg>, children: Vec<Child>) -> VNode {
        create_element(Some(self.instance), tag, data, children, Normalization::Always)
    }

    /// Build a node whose children are already shaped; `level` picks how
    /// much normalization they still need.
    pub fn c(
        &self,
        tag: impl Into<TagRef>,
        data: impl Into<DataArg>,
        children: Vec<Child>,
        level: Normalization,
    ) -> VNode {
        create_element(Some(self.instance), tag, data, children, level)
    }

    pub fn text(&self, text: impl Into<String>) -> VNode {
        VNode::text(text)
    }

    pub fn empty(&self) -> VNode {
        VNode::empty()
    }

    /// Read instance state, subscribing this render to it.
    pub fn get(&self, key: &str) -> Value {
        self.instance.get(key)
    }

    pub fn slot(&self, name: &str) -> Vec<VNode> {
        self.instance.slot(name)
    }

    pub fn scoped_slot(&self, name: &str, props: &Value) -> Vec<VNode> {
        self.instance.scoped_slot(name, props)
    }

    /// Render one child per item, as a list produced by iteration.
    pub fn list<T>(&self, items: impl IntoIterator<Item = T>, mut f: impl FnMut(T, usize) -> Child) -> Child {
        Child::RenderedList(items.into_iter().enumerate().map(|(i, item)| f(item, i)).collect())
    }

    /// A subtree that never changes, rendered once and reused.
    pub fn static_tree(&self, index: usize, f: impl FnOnce(&Self) -> VNode) -> VNode {
        self.instance.static_tree(index, || f(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{base, reset_base, ComponentOptions, ExtendSpec, InstanceInit};
    use crate::scheduler::Scheduler;
    use crate::vnode::NodeData;

    fn instance(options: ComponentOptions) -> Rc<ComponentInstance> {
        reset_base();
        let def = base().extend(&ExtendSpec::new(options));
        ComponentInstance::new(def, None, InstanceInit::default(), Scheduler::new())
    }

    #[test]
    fn test_list_children() {
        let instance = instance(ComponentOptions::new());
        let cx = RenderContext::new(&instance);
        let items = cx.list(["a", "b"], |item, _| {
            cx.h("li", NodeData::new().key(item), vec![Child::from(item)]).into()
        });
        let ul = cx.h("ul", DataArg::None, vec![items]);
        assert_eq!(ul.children.len(), 2);
        assert_eq!(ul.text_content(), "ab");
        assert!(Rc::ptr_eq(&ul.context().expect("context"), &instance));
    }

    #[test]
    fn test_static_tree_reused() {
        let instance = instance(ComponentOptions::new());
        let cx = RenderContext::new(&instance);
        let first = cx.static_tree(0, |cx| cx.h("p", "fixed", vec![]));
        let second = cx.static_tree(0, |_| panic!("static tree rendered twice"));
        assert!(first.is_static());
        assert!(second.is_cloned());
        assert_eq!(second.text_content(), "fixed");
    }
}
