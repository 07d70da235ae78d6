//! Derived hooks and memoized components.
//!
//! Everything here is built on [`use_cell`](super::use_cell()) and the
//! equality helpers; none of it needs support from the runtime.
//!
//! ```ignore
//! let list = Component::new("List", |props| {
//!     let filter = props.str("filter").unwrap_or_default().to_string();
//!     let rows = use_memo(|| expensive_rows(&filter), vec![filter.as_str().into()])?;
//!     let clicks = use_ref(0_u32)?;
//!     let on_click = use_auto_callback(move |_: &Event| *clicks.borrow_mut() += 1)?;
//!     Ok(h("ul").on(EventKind::Click, Listener::new(move |e| on_click(e))).child(rows).into())
//! });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::element::{Child, Component, Props};
use super::equals::{deep_equals_list, deep_equals_props, shallow_equals, shallow_equals_props};
use super::hooks::use_cell_named;
use crate::error::RenderError;
use crate::types::Value;

/// Comparison of two dependency lists.
pub type DepsEquals = fn(&[Value], &[Value]) -> bool;

/// Comparison of two props sets.
pub type PropsEquals = fn(&Props, &Props) -> bool;

// =============================================================================
// use_ref
// =============================================================================

/// Mutable box that lives as long as the component.
///
/// The same `Rc` comes back on every render. Writing through it never
/// schedules a render.
pub fn use_ref<T: 'static>(initial: T) -> Result<Rc<RefCell<T>>, RenderError> {
    let cell = use_cell_named("use_ref", || Rc::new(RefCell::new(initial)))?;
    cell.get().ok_or(RenderError::HookMismatch {
        hook: "use_ref",
        path: cell.path().clone(),
        index: cell.index(),
        found: "missing",
    })
}

// =============================================================================
// use_memo
// =============================================================================

struct Memoized<T> {
    deps: Rc<[Value]>,
    value: T,
}

/// Value of `factory()`, recomputed only when `deps` changes.
///
/// Dependencies compare entry-wise with [`shallow_equals`].
pub fn use_memo<T: Clone + 'static>(
    factory: impl FnOnce() -> T,
    deps: Vec<Value>,
) -> Result<T, RenderError> {
    use_memo_by("use_memo", factory, deps, shallow_equals)
}

/// [`use_memo`] with dependencies compared by [`deep_equals_list`].
pub fn use_deep_memo<T: Clone + 'static>(
    factory: impl FnOnce() -> T,
    deps: Vec<Value>,
) -> Result<T, RenderError> {
    use_memo_by("use_deep_memo", factory, deps, deep_equals_list)
}

/// [`use_memo`] with a custom dependency comparison.
pub fn use_memo_with<T: Clone + 'static>(
    factory: impl FnOnce() -> T,
    deps: Vec<Value>,
    equals: DepsEquals,
) -> Result<T, RenderError> {
    use_memo_by("use_memo_with", factory, deps, equals)
}

fn use_memo_by<T: Clone + 'static>(
    hook: &'static str,
    factory: impl FnOnce() -> T,
    deps: Vec<Value>,
    equals: DepsEquals,
) -> Result<T, RenderError> {
    let cell = use_cell_named(hook, || None::<Memoized<T>>)?;
    let cached = cell
        .with(|memo| match memo {
            Some(memo) if equals(&memo.deps, &deps) => Some(memo.value.clone()),
            _ => None,
        })
        .flatten();
    if let Some(value) = cached {
        return Ok(value);
    }

    // Outside the borrow: the factory is caller code
    let value = factory();
    cell.with(|memo| {
        *memo = Some(Memoized {
            deps: deps.into(),
            value: value.clone(),
        })
    });
    Ok(value)
}

// =============================================================================
// Callbacks
// =============================================================================

/// `callback`, kept from the first render until `deps` changes.
///
/// Compare results with `Rc::ptr_eq` to tell whether it was replaced.
pub fn use_callback<F: 'static>(callback: F, deps: Vec<Value>) -> Result<Rc<F>, RenderError> {
    use_memo_by("use_callback", || Rc::new(callback), deps, shallow_equals)
}

/// A callback whose identity never changes but which always calls the `f`
/// passed on the latest render.
pub fn use_auto_callback<A: 'static, R: 'static>(
    f: impl Fn(A) -> R + 'static,
) -> Result<Rc<dyn Fn(A) -> R>, RenderError> {
    let f: Rc<dyn Fn(A) -> R> = Rc::new(f);
    let latest = use_ref(f.clone())?;
    *latest.borrow_mut() = f;

    use_memo_by(
        "use_auto_callback",
        || {
            Rc::new(move |arg: A| {
                let current = latest.borrow().clone();
                current(arg)
            }) as Rc<dyn Fn(A) -> R>
        },
        Vec::new(),
        shallow_equals,
    )
}

// =============================================================================
// memo
// =============================================================================

struct LastRender {
    props: Props,
    rendered: Child,
    revision: Option<u64>,
}

/// Wrap `component` so it reuses its last output while its props stay
/// shallowly equal ([`shallow_equals_props`]).
///
/// The wrapped body still re-runs when its own state was set since the last
/// render. The wrapper is a new component type named `Memo(<name>)`.
pub fn memo(component: &Component) -> Component {
    memo_with(component, shallow_equals_props)
}

/// [`memo`] comparing props with [`deep_equals_props`].
pub fn deep_memo(component: &Component) -> Component {
    memo_with(component, deep_equals_props)
}

/// [`memo`] with a custom props comparison.
pub fn memo_with(component: &Component, equals: PropsEquals) -> Component {
    let inner = component.clone();
    let name = format!("Memo({})", component.name());
    Component::new(name, move |props| {
        let last = use_cell_named("memo", || None::<LastRender>)?;
        // Read before the body runs so a write made during it invalidates
        let revision = last.revision();

        let cached = last
            .with(|last| match last {
                Some(last) if last.revision == revision && equals(&last.props, props) => {
                    Some(last.rendered.clone())
                }
                _ => None,
            })
            .flatten();
        if let Some(rendered) = cached {
            trace!(path = %last.path(), "memo hit");
            return Ok(rendered);
        }

        let rendered = inner.call(props)?;
        last.with(|last| {
            *last = Some(LastRender {
                props: props.clone(),
                rendered: rendered.clone(),
                revision,
            })
        });
        Ok(rendered)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::pipeline::Runtime;
    use crate::primitives::{Setter, h, use_state};
    use crate::renderer::NodeId;
    use crate::types::Style;

    type Calls = Rc<Cell<u32>>;

    fn render(root: impl Into<Child>) -> (Runtime, NodeId) {
        let runtime = Runtime::new();
        let body = runtime.document().create_element("body");
        assert!(runtime.configure(root, body).is_ok());
        (runtime, body)
    }

    /// Parent holding a label in state and rendering `child` with it.
    fn parent(child: &Component, setter: &Rc<RefCell<Option<Setter<String>>>>) -> Component {
        let child = child.clone();
        let setter = setter.clone();
        Component::new("Parent", move |_| {
            let (label, set_label) = use_state(String::from("a"))?;
            *setter.borrow_mut() = Some(set_label);
            Ok(h("div").child(child.element().attr("label", label)).into())
        })
    }

    #[test]
    fn test_use_ref_survives_renders_without_scheduling() {
        let seen: Rc<RefCell<Vec<u32>>> = Rc::default();
        let counter = Component::new("Counter", {
            let seen = seen.clone();
            move |_| {
                let count = use_ref(0_u32)?;
                *count.borrow_mut() += 1;
                seen.borrow_mut().push(*count.borrow());
                Ok(Child::Empty)
            }
        });

        let (runtime, _) = render(counter.element());
        assert!(runtime.render_now().is_ok());
        assert!(runtime.render_now().is_ok());
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert!(!runtime.is_render_scheduled());
    }

    #[test]
    fn test_use_memo_recomputes_on_dep_change() {
        let calls = Calls::default();
        let setter = Rc::new(RefCell::new(None));
        let app = Component::new("App", {
            let calls = calls.clone();
            let setter = setter.clone();
            move |_| {
                let (n, set_n) = use_state(1_i64)?;
                *setter.borrow_mut() = Some(set_n);
                let doubled = use_memo(
                    || {
                        calls.set(calls.get() + 1);
                        n * 2
                    },
                    vec![n.into()],
                )?;
                Ok(doubled.into())
            }
        });

        let (runtime, body) = render(app.element());
        assert!(runtime.render_now().is_ok());
        assert_eq!(calls.get(), 1);

        let set_n: Option<Setter<i64>> = setter.borrow().clone();
        assert!(set_n.is_some_and(|set| set.set(5)));
        assert!(runtime.flush().is_ok());
        assert_eq!(calls.get(), 2);
        assert_eq!(runtime.document().inner_html(body), "10");
    }

    #[test]
    fn test_use_deep_memo_ignores_rebuilt_styles() {
        let (shallow, deep) = (Calls::default(), Calls::default());
        let app = Component::new("App", {
            let (shallow, deep) = (shallow.clone(), deep.clone());
            move |_| {
                let style = Value::from(Style::new().with("color", "red"));
                use_memo(|| shallow.set(shallow.get() + 1), vec![style.clone()])?;
                use_deep_memo(|| deep.set(deep.get() + 1), vec![style])?;
                Ok(Child::Empty)
            }
        });

        let (runtime, _) = render(app.element());
        assert!(runtime.render_now().is_ok());
        assert_eq!(shallow.get(), 2);
        assert_eq!(deep.get(), 1);
    }

    #[test]
    fn test_use_callback_keeps_identity_until_deps_change() {
        let seen: Rc<RefCell<Vec<Rc<dyn Fn() -> i64>>>> = Rc::default();
        let setter = Rc::new(RefCell::new(None));
        let app = Component::new("App", {
            let seen = seen.clone();
            let setter = setter.clone();
            move |_| {
                let (n, set_n) = use_state(1_i64)?;
                *setter.borrow_mut() = Some(set_n);
                let callback = use_callback(move || n, vec![n.into()])?;
                seen.borrow_mut().push(callback);
                Ok(Child::Empty)
            }
        });

        let (runtime, _) = render(app.element());
        assert!(runtime.render_now().is_ok());
        let set_n: Option<Setter<i64>> = setter.borrow().clone();
        assert!(set_n.is_some_and(|set| set.set(7)));
        assert!(runtime.flush().is_ok());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(Rc::ptr_eq(&seen[0], &seen[1]));
        assert!(!Rc::ptr_eq(&seen[1], &seen[2]));
        assert_eq!(seen[2](), 7);
    }

    #[test]
    fn test_use_auto_callback_is_stable_and_current() {
        let seen: Rc<RefCell<Vec<Rc<dyn Fn(i64) -> i64>>>> = Rc::default();
        let setter = Rc::new(RefCell::new(None));
        let app = Component::new("App", {
            let seen = seen.clone();
            let setter = setter.clone();
            move |_| {
                let (n, set_n) = use_state(1_i64)?;
                *setter.borrow_mut() = Some(set_n);
                seen.borrow_mut().push(use_auto_callback(move |x: i64| x + n)?);
                Ok(Child::Empty)
            }
        });

        let (runtime, _) = render(app.element());
        let set_n: Option<Setter<i64>> = setter.borrow().clone();
        assert!(set_n.is_some_and(|set| set.set(10)));
        assert!(runtime.flush().is_ok());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(Rc::ptr_eq(&seen[0], &seen[1]));
        // The first handle already calls the latest closure
        assert_eq!(seen[0](1), 11);
    }

    #[test]
    fn test_memo_skips_body_while_props_equal() {
        let calls = Calls::default();
        let label = Component::new("Label", {
            let calls = calls.clone();
            move |props| {
                calls.set(calls.get() + 1);
                Ok(h("span").child(props.str("label").unwrap_or_default().to_string()).into())
            }
        });
        let memoized = memo(&label);
        assert_eq!(memoized.name(), "Memo(Label)");

        let setter = Rc::new(RefCell::new(None));
        let (runtime, body) = render(parent(&memoized, &setter).element());
        assert!(runtime.render_now().is_ok());
        assert_eq!(calls.get(), 1);

        let set_label: Option<Setter<String>> = setter.borrow().clone();
        assert!(set_label.is_some_and(|set| set.set("b".into())));
        assert!(runtime.flush().is_ok());
        assert_eq!(calls.get(), 2);
        assert_eq!(runtime.document().inner_html(body), "<div><span>b</span></div>");
    }

    #[test]
    fn test_memo_rerenders_on_own_state() {
        let inner_setter = Rc::new(RefCell::new(None));
        let clicks = Component::new("Clicks", {
            let inner_setter = inner_setter.clone();
            move |_| {
                let (n, set_n) = use_state(0_i64)?;
                *inner_setter.borrow_mut() = Some(set_n);
                Ok(h("b").child(n).into())
            }
        });
        let (runtime, body) = render(h("div").child(memo(&clicks).element()));

        let set_n: Option<Setter<i64>> = inner_setter.borrow().clone();
        assert!(set_n.is_some_and(|set| set.set(3)));
        assert!(runtime.flush().is_ok());
        assert_eq!(runtime.document().inner_html(body), "<div><b>3</b></div>");
    }

    #[test]
    fn test_deep_memo_compares_props_structurally() {
        let (shallow_calls, deep_calls) = (Calls::default(), Calls::default());
        let counted = |calls: &Calls| {
            let calls = calls.clone();
            Component::new("Box", move |_| {
                calls.set(calls.get() + 1);
                Ok(Child::Empty)
            })
        };
        let shallow = memo(&counted(&shallow_calls));
        let deep = deep_memo(&counted(&deep_calls));
        let app = Component::new("App", move |_| {
            let style = || Style::new().with("width", 2);
            Ok(h("div")
                .child(shallow.element().style(style()))
                .child(deep.element().style(style()))
                .into())
        });

        let (runtime, _) = render(app.element());
        assert!(runtime.render_now().is_ok());
        assert_eq!(shallow_calls.get(), 2);
        assert_eq!(deep_calls.get(), 1);
    }
}
