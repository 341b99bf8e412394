//! Component mounting, re-rendering and lifecycles against the in-memory host.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use spark_signals::signal;
use spark_vdom::component::LifecycleHook;
use spark_vdom::diagnostics::{self, CollectingSink};
use spark_vdom::{
    base, derive, mount, reset_base, value_map, AttrsModule, reset_config, update_config, AsyncComponent, Child,
    ComponentDefinition, ComponentInstance, ComponentOptions, InstanceState, MemoryDom, NodeData, Patcher, PropSpec,
    Value, VdomError,
};

fn setup() -> Rc<CollectingSink> {
    reset_config();
    update_config(|c| c.production = false);
    reset_base();
    diagnostics::collect()
}

fn define(options: ComponentOptions) -> Rc<ComponentDefinition> {
    derive(&base(), &options.into_spec())
}

fn data(entries: &[(&str, Value)]) -> impl Fn() -> BTreeMap<String, Value> + 'static {
    let entries: Vec<(String, Value)> = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    move || entries.iter().cloned().collect()
}

fn counter() -> (Rc<Cell<usize>>, impl Fn(&ComponentInstance) + 'static) {
    let count = Rc::new(Cell::new(0));
    let handle = count.clone();
    (count, move |_: &ComponentInstance| handle.set(handle.get() + 1))
}

// =============================================================================
// Derivation
// =============================================================================

#[test]
fn test_derive_is_cached_per_spec() {
    setup();
    let spec = ComponentOptions::new().name("my-widget").into_spec();
    let first = derive(&base(), &spec);
    let second = derive(&base(), &spec);
    assert!(Rc::ptr_eq(&first, &second));

    let other = define(ComponentOptions::new());
    assert_eq!(other.cid(), first.cid() + 1);
    assert_eq!(base().cid(), 0);
}

// =============================================================================
// Mounting
// =============================================================================

#[test]
fn test_mount_and_rerender() {
    setup();
    let def = define(
        ComponentOptions::new()
            .data(data(&[("label", Value::from("hello"))]))
            .render(|ctx| ctx.h("p", NodeData::new(), vec![Child::from(ctx.get("label"))])),
    );

    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut handle = mount(Patcher::new(dom), &def, BTreeMap::new(), Some(app)).expect("mounted");
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><p>hello</p></body>");
    let p = handle.el().expect("root element");

    handle.with_ops_mut(MemoryDom::clear_log);
    handle.root().set("label", "world");
    assert_eq!(handle.flush(), 1);

    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><p>world</p></body>");
    assert_eq!(handle.el(), Some(p));
    assert_eq!(handle.with_ops(MemoryDom::creates), 0);
    assert_eq!(handle.flush(), 0);
}

#[test]
fn test_mount_rejects_body() {
    setup();
    let def = define(ComponentOptions::new().render(|ctx| ctx.h("div", NodeData::new(), vec![])));
    let mut dom = MemoryDom::new();
    let (body, _app) = dom.scaffold();

    let result = mount(Patcher::new(dom), &def, BTreeMap::new(), Some(body));
    assert!(matches!(result, Err(VdomError::InvalidMountTarget { ref tag }) if tag == "body"));
}

#[test]
fn test_missing_render_reports() {
    let sink = setup();
    let def = define(ComponentOptions::new());
    let handle = mount(Patcher::new(MemoryDom::new()), &def, BTreeMap::new(), None).expect("mounted");

    assert!(sink.contains("template or render function not defined"));
    assert!(handle.el().is_some());
}

#[test]
fn test_unmount_destroys_tree() {
    setup();
    let (destroyed, on_destroyed) = counter();
    let child = define(
        ComponentOptions::new()
            .hook(LifecycleHook::Destroyed, on_destroyed)
            .render(|ctx| ctx.h("span", NodeData::new(), vec![])),
    );
    let parent = define(ComponentOptions::new().render(move |ctx| {
        ctx.h("div", NodeData::new(), vec![Child::from(ctx.h(&child, NodeData::new(), vec![]))])
    }));

    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut handle = mount(Patcher::new(dom), &parent, BTreeMap::new(), Some(app)).expect("mounted");
    handle.unmount();

    assert!(!handle.is_mounted());
    assert_eq!(handle.root().state(), InstanceState::Destroyed);
    assert_eq!(destroyed.get(), 1);
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body></body>");
}

// =============================================================================
// Child Components
// =============================================================================

#[test]
fn test_prop_change_updates_child() {
    setup();
    let (child_mounted, on_mounted) = counter();
    let child = define(
        ComponentOptions::new()
            .prop("text", PropSpec::new())
            .hook(LifecycleHook::Mounted, on_mounted)
            .render(|ctx| ctx.h("em", NodeData::new(), vec![Child::from(ctx.get("text"))])),
    );
    let parent = define(
        ComponentOptions::new()
            .data(data(&[("label", Value::from("one"))]))
            .render(move |ctx| {
                let data = NodeData::new().prop("text", ctx.get("label"));
                ctx.h("div", NodeData::new(), vec![Child::from(ctx.h(&child, data, vec![]))])
            }),
    );

    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut handle = mount(Patcher::new(dom), &parent, BTreeMap::new(), Some(app)).expect("mounted");
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div><em>one</em></div></body>");
    assert_eq!(child_mounted.get(), 1);

    handle.root().set("label", "two");
    assert_eq!(handle.flush(), 2);
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div><em>two</em></div></body>");
    assert_eq!(child_mounted.get(), 1);
}

#[test]
fn test_keep_alive_reuses_instance() {
    setup();
    let (created, on_created) = counter();
    let (activated, on_activated) = counter();
    let (deactivated, on_deactivated) = counter();
    let child = define(
        ComponentOptions::new()
            .hook(LifecycleHook::Created, on_created)
            .hook(LifecycleHook::Activated, on_activated)
            .hook(LifecycleHook::Deactivated, on_deactivated)
            .render(|ctx| ctx.h("span", NodeData::new(), vec![Child::from("kept")])),
    );
    let parent = define(
        ComponentOptions::new()
            .data(data(&[("show", Value::from(true))]))
            .render(move |ctx| {
                let content = if ctx.get("show").is_truthy() {
                    Child::from(ctx.h(&child, NodeData::new().key("c").keep_alive(), vec![]))
                } else {
                    Child::from("off")
                };
                ctx.h("div", NodeData::new(), vec![content])
            }),
    );

    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut handle = mount(Patcher::new(dom), &parent, BTreeMap::new(), Some(app)).expect("mounted");

    handle.root().set("show", false);
    handle.flush();
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div>off</div></body>");
    assert_eq!(handle.root().kept_alive_count(), 1);
    assert_eq!(deactivated.get(), 1);

    handle.with_ops_mut(MemoryDom::clear_log);
    handle.root().set("show", true);
    handle.flush();
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div><span>kept</span></div></body>");
    assert_eq!(created.get(), 1);
    assert_eq!(activated.get(), 1);
    assert_eq!(handle.root().kept_alive_count(), 0);
    // Only the "off" text was created and removed; the span came back as is.
    assert_eq!(handle.with_ops(MemoryDom::creates), 0);
}

#[test]
fn test_async_component_renders_once_resolved() {
    setup();
    let factory = AsyncComponent::new();
    let pending = factory.clone();
    let parent = define(ComponentOptions::new().render(move |ctx| {
        ctx.h("div", NodeData::new(), vec![Child::from(ctx.h(pending.clone(), NodeData::new(), vec![]))])
    }));

    let mut dom = MemoryDom::new();
    let (body, app) = dom.scaffold();
    let mut handle = mount(Patcher::new(dom), &parent, BTreeMap::new(), Some(app)).expect("mounted");
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div><!----></div></body>");
    assert_eq!(factory.owner_count(), 1);

    let loaded = define(ComponentOptions::new().render(|ctx| ctx.h("b", NodeData::new(), vec![Child::from("loaded")])));
    factory.resolve(&loaded);
    assert_eq!(handle.flush(), 1);
    assert_eq!(handle.with_ops(|dom| dom.serialize(body)), "<body><div><b>loaded</b></div></body>");
}

#[test]
fn test_runaway_updates_are_cut_off() {
    let sink = setup();
    let def = define(
        ComponentOptions::new()
            .data(data(&[("n", Value::from(0))]))
            .hook(LifecycleHook::Updated, |instance| {
                let n = match instance.get("n") {
                    Value::Number(n) => n,
                    _ => 0.0,
                };
                instance.set("n", n + 1.0);
            })
            .render(|ctx| ctx.h("i", NodeData::new(), vec![Child::from(ctx.get("n"))])),
    );

    let mut handle = mount(Patcher::new(MemoryDom::new()), &def, BTreeMap::new(), None).expect("mounted");
    handle.root().set("n", 1);
    handle.flush();
    assert!(sink.contains("infinite update loop"));
}

#[test]
fn test_signal_style_and_class_reach_element() {
    setup();
    let color = signal(Value::from("red"));
    let active = signal(Value::from(false));
    let (style_cell, class_cell) = (color.clone(), active.clone());
    let def = define(ComponentOptions::new().render(move |ctx| {
        let data = NodeData::new()
            .style(value_map([("color", Value::from(style_cell.clone()))]))
            .class(value_map([("active", Value::from(class_cell.clone()))]));
        ctx.h("div", data, vec![])
    }));

    let mut patcher = Patcher::new(MemoryDom::new());
    patcher.register_module(AttrsModule);
    let mut handle = mount(patcher, &def, BTreeMap::new(), None).expect("mounted");
    let div = handle.el().expect("root element");
    let attr = |handle: &spark_vdom::MountHandle<MemoryDom>, name: &str| {
        handle.with_ops(|dom| dom.attr(div, name).map(str::to_string))
    };
    assert_eq!(attr(&handle, "style").as_deref(), Some("color: red"));
    assert_eq!(attr(&handle, "class"), None);

    color.set(Value::from("blue"));
    active.set(Value::from(true));
    assert_eq!(handle.flush(), 1);
    assert_eq!(handle.el(), Some(div));
    assert_eq!(attr(&handle, "style").as_deref(), Some("color: blue"));
    assert_eq!(attr(&handle, "class").as_deref(), Some("active"));

    active.set(Value::from(false));
    handle.flush();
    assert_eq!(attr(&handle, "class"), None);
}
