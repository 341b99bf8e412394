//! Reconciler behavior observed through the in-memory host's op log.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::signal;
use spark_vdom::diagnostics::{self, CollectingSink};
use spark_vdom::host::MemNodeKind;
use spark_vdom::{
    create_element, reset_base, reset_config, update_config, Child, DataArg, HookCx, HookModule,
    MemoryDom, Namespace, NodeData, Normalization, PatchTarget, Patcher, RemoveCallback, VNode,
    Value,
};

fn setup() -> Rc<CollectingSink> {
    reset_config();
    update_config(|c| c.production = false);
    reset_base();
    diagnostics::collect()
}

fn el(tag: &str, data: impl Into<DataArg>, children: Vec<Child>) -> VNode {
    create_element(None, tag, data, children, Normalization::Always)
}

fn keyed_li(key: i32) -> Child {
    Child::from(el("li", NodeData::new().key(key), vec![Child::from(key.to_string())]))
}

fn list(keys: &[i32]) -> VNode {
    el("ul", DataArg::None, keys.iter().map(|&k| keyed_li(k)).collect())
}

// =============================================================================
// Children Diff
// =============================================================================

#[test]
fn test_keyed_rotation_is_one_move() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(PatchTarget::None, list(&[1, 2, 3]));
    let ul = old.elm.expect("ul created");
    assert_eq!(patcher.ops().text_content(ul), "123");

    patcher.ops_mut().clear_log();
    let new = patcher.patch(PatchTarget::Node(old), list(&[3, 1, 2]));

    let dom = patcher.ops();
    assert_eq!(dom.text_content(ul), "312");
    assert_eq!(dom.moves(), 1);
    assert_eq!(dom.creates(), 0);
    assert_eq!(dom.removes(), 0);
    assert_eq!(new.elm, Some(ul));
}

#[test]
fn test_keyed_insert_and_remove() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(PatchTarget::None, list(&[1, 2, 3]));
    let ul = old.elm.expect("ul created");

    patcher.ops_mut().clear_log();
    patcher.patch(PatchTarget::Node(old), list(&[1, 4, 3]));

    let dom = patcher.ops();
    assert_eq!(dom.text_content(ul), "143");
    assert_eq!(dom.removes(), 1);
    assert_eq!(dom.moves(), 0);
    // One li plus its text node.
    assert_eq!(dom.creates(), 2);
}

#[test]
fn test_unkeyed_text_change_patches_in_place() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let build = |second: &str| {
        el(
            "ul",
            DataArg::None,
            vec![
                Child::from(el("li", DataArg::None, vec![Child::from("a")])),
                Child::from(el("li", DataArg::None, vec![Child::from(second)])),
            ],
        )
    };
    let old = patcher.patch(PatchTarget::None, build("b"));
    let ul = old.elm.expect("ul created");

    patcher.ops_mut().clear_log();
    patcher.patch(PatchTarget::Node(old), build("c"));

    let dom = patcher.ops();
    assert_eq!(dom.text_content(ul), "ac");
    assert_eq!(dom.text_updates(), 1);
    assert_eq!(dom.creates(), 0);
    assert_eq!(dom.removes(), 0);
}

#[test]
fn test_tag_change_replaces_node() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(
        PatchTarget::None,
        el("section", DataArg::None, vec![Child::from(el("div", DataArg::None, vec![]))]),
    );
    let section = old.elm.expect("section created");

    patcher.ops_mut().clear_log();
    patcher.patch(
        PatchTarget::Node(old),
        el("section", DataArg::None, vec![Child::from(el("span", DataArg::None, vec![]))]),
    );

    let dom = patcher.ops();
    assert_eq!(dom.serialize(section), "<section><span></span></section>");
    assert_eq!(dom.creates(), 1);
    assert_eq!(dom.removes(), 1);
}

#[test]
fn test_text_replaces_children() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(
        PatchTarget::None,
        el("p", DataArg::None, vec![Child::from(el("span", DataArg::None, vec![Child::from("x")]))]),
    );
    let p = old.elm.expect("p created");

    patcher.patch(PatchTarget::Node(old), VNode::element_with_text("p", None, "hi"));
    assert_eq!(patcher.ops().serialize(p), "<p>hi</p>");
}

#[test]
fn test_children_replace_text() {
    setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(PatchTarget::None, VNode::element_with_text("p", None, "hi"));
    let p = old.elm.expect("p created");

    patcher.patch(
        PatchTarget::Node(old),
        el("p", DataArg::None, vec![Child::from(el("b", DataArg::None, vec![Child::from("bold")]))]),
    );
    assert_eq!(patcher.ops().serialize(p), "<p><b>bold</b></p>");
}

#[test]
fn test_mount_replaces_target() {
    setup();
    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut patcher = Patcher::new(dom);
    patcher.patch(PatchTarget::Mount(app), el("main", DataArg::None, vec![Child::from("ready")]));

    assert_eq!(patcher.ops().serialize(body), "<body><main>ready</main></body>");
    assert!(!patcher.ops().is_attached(app));
}

// =============================================================================
// Namespaces
// =============================================================================

#[test]
fn test_svg_namespace_and_foreign_object_reset() {
    setup();
    let div = el("div", DataArg::None, vec![]);
    let foreign = el("foreignObject", DataArg::None, vec![Child::from(div)]);
    let svg = el("svg", DataArg::None, vec![Child::from(foreign)]);

    assert_eq!(svg.ns, Some(Namespace::Svg));
    assert_eq!(svg.children[0].ns, Some(Namespace::Svg));
    assert_eq!(svg.children[0].children[0].ns, None);

    let mut patcher = Patcher::new(MemoryDom::new());
    let svg = patcher.patch(PatchTarget::None, svg);
    let dom = patcher.ops();
    let ns_of = |vnode: &VNode| match &dom.node(vnode.elm.expect("created")).expect("in arena").kind {
        MemNodeKind::Element { ns, .. } => ns.clone(),
        _ => None,
    };
    assert_eq!(ns_of(&svg), Some(Namespace::Svg));
    assert_eq!(ns_of(&svg.children[0].children[0]), None);
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_observed_data_yields_empty_node() {
    let sink = setup();
    let observed = Value::from(signal(Value::from("state")));
    let vnode = create_element(None, "div", DataArg::Observed(observed), vec![], Normalization::None);

    assert!(vnode.is_empty());
    assert_eq!(sink.len(), 1);
    assert!(sink.contains("Avoid using observed data object as vnode data"));
}

#[test]
fn test_duplicate_keys_reported() {
    let sink = setup();
    let mut patcher = Patcher::new(MemoryDom::new());
    patcher.patch(PatchTarget::None, list(&[1, 1]));
    assert!(sink.contains("Duplicate keys detected: '1'"));
}

#[test]
fn test_production_silences_diagnostics() {
    let sink = setup();
    update_config(|c| c.production = true);
    let mut patcher = Patcher::new(MemoryDom::new());
    patcher.patch(PatchTarget::None, list(&[1, 1]));
    assert!(sink.is_empty());
}

// =============================================================================
// Hook Modules
// =============================================================================

/// Holds every removal until the test releases it.
#[derive(Clone, Default)]
struct HoldRemovals {
    held: Rc<RefCell<Vec<RemoveCallback>>>,
}

impl HookModule<MemoryDom> for HoldRemovals {
    fn name(&self) -> &'static str {
        "hold-removals"
    }

    fn remove(&self, _cx: &mut HookCx<'_, MemoryDom>, _vnode: &VNode, rm: &RemoveCallback) {
        rm.hold();
        self.held.borrow_mut().push(rm.clone());
    }
}

#[test]
fn test_held_removal_is_deferred() {
    setup();
    let hold = HoldRemovals::default();
    let mut patcher = Patcher::new(MemoryDom::new());
    patcher.register_module(hold.clone());

    let old = patcher.patch(PatchTarget::None, list(&[1, 2]));
    let ul = old.elm.expect("ul created");
    let second = old.children[1].elm.expect("li created");

    patcher.patch(PatchTarget::Node(old), list(&[1]));
    assert_eq!(patcher.pending_removals(), 1);
    assert!(patcher.ops().is_attached(second));

    for rm in hold.held.borrow().iter() {
        rm.release();
    }
    patcher.sweep_removals();
    assert_eq!(patcher.pending_removals(), 0);
    assert!(!patcher.ops().is_attached(second));
    assert_eq!(patcher.ops().text_content(ul), "1");
}

#[test]
fn test_node_hooks_fire() {
    setup();
    let events = Rc::new(RefCell::new(Vec::new()));
    let data = |events: &Rc<RefCell<Vec<&'static str>>>| {
        let (c, i, u, d) = (events.clone(), events.clone(), events.clone(), events.clone());
        NodeData::new()
            .on_create(move |_| c.borrow_mut().push("create"))
            .on_insert(move |_| i.borrow_mut().push("insert"))
            .on_update(move |_| u.borrow_mut().push("update"))
            .on_destroy(move |_| d.borrow_mut().push("destroy"))
    };

    let mut patcher = Patcher::new(MemoryDom::new());
    let old = patcher.patch(PatchTarget::None, el("div", data(&events), vec![]));
    let old = patcher.patch(PatchTarget::Node(old), el("div", data(&events), vec![]));
    patcher.destroy(old);

    assert_eq!(*events.borrow(), vec!["create", "insert", "update", "destroy"]);
}
