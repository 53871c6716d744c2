//! Page driver - a page's lifecycle, data and custom methods as streams.
//!
//! Builds the page's callback table, registers it with the host once per usage
//! site and hands back the page's channels.
//!
//! Slot precedence, lowest first:
//! 1. framework lifecycle slots
//! 2. normalized `methods` handlers
//! 3. `others`
//! 4. share / exit-state equipment (fills empty slots; exit state hooks `onLoad`)
//! 5. `lifetimes` (an `Overwrite` lifetime replaces anything above)
//!
//! # Example
//!
//! ```ignore
//! let page = use_page_driver(&ctx, PageOptions {
//!     name: "Counter".into(),
//!     data: json!({ "count": 0 }),
//!     methods: vec!["increment".into()],
//!     ..Default::default()
//! })?;
//!
//! let increment = page.outputs.value("increment").unwrap();
//! let data_in = page.inputs.value("data").unwrap();
//! let data_out = page.outputs.value("data").unwrap();
//! let _ = increment.subscribe(move |_| {
//!     let count = data_out.value().and_then(|d| d["count"].as_i64()).unwrap_or(0);
//!     data_in.next(json!({ "count": count + 1 }));
//! });
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use bitflags::bitflags;
use log::debug;
use serde_json::{json, Value};

use super::exit_state::{exit_state_driver, ExitStateOptions};
use super::share::{share_driver, ShareOptions};
use crate::channel::Stream;
use crate::error::Result;
use crate::framework::context::Context;
use crate::framework::driver::{compose, DriverInstance};
use crate::framework::lifetimes::{equip_lifetimes, Lifetimes};
use crate::framework::methods::{normalize, MethodDecl, MethodTable};
use crate::framework::reserved::{detect_reserved, RESERVED_PAGE_NAMES};
use crate::framework::singleton::GeneralDriver;
use crate::framework::state_sync::StateSync;
use crate::framework::table::{CallbackTable, Slot};
use crate::host::PageRef;

// =============================================================================
// Options
// =============================================================================

bitflags! {
    /// Optional page hooks.
    ///
    /// Combine with bitwise OR: `PageFeatures::SHARE_APP_MESSAGE | PageFeatures::EXIT_STATE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PageFeatures: u8 {
        const SHARE_APP_MESSAGE = 1 << 0;
        const SHARE_TIMELINE = 1 << 1;
        const ADD_TO_FAVORITES = 1 << 2;
        const PAGE_SCROLL = 1 << 3;
        const EXIT_STATE = 1 << 4;

        const SHARE = Self::SHARE_APP_MESSAGE.bits()
            | Self::SHARE_TIMELINE.bits()
            | Self::ADD_TO_FAVORITES.bits();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PageConfig {
    /// Silence the reserved-name warning for deliberate overrides.
    pub overwrite_reserved: bool,
    pub features: PageFeatures,
}

pub struct PageOptions {
    pub name: String,
    /// Initial page data, also the seed of the data outputs.
    pub data: Value,
    pub methods: Vec<MethodDecl<PageRef>>,
    pub config: PageConfig,
    pub lifetimes: Lifetimes<PageRef>,
    /// Copied into the callback table as-is.
    pub others: BTreeMap<String, Slot<PageRef>>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            name: "UnnamedPage".to_string(),
            data: json!({}),
            methods: Vec::new(),
            config: PageConfig::default(),
            lifetimes: Vec::new(),
            others: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

pub static PAGE_DRIVER: GeneralDriver<PageOptions> = GeneralDriver::new("page", page_driver);

/// Use the page driver at the caller's source location.
///
/// Later calls from the same location return the first instance and ignore
/// their options.
#[track_caller]
pub fn use_page_driver(ctx: &Context, options: PageOptions) -> Result<Rc<DriverInstance>> {
    PAGE_DRIVER.use_driver(ctx, options)
}

/// Callback that pushes its argument.
fn emit_args(stream: Stream<Value>) -> impl Fn(&PageRef, &Value) -> Value + 'static {
    move |_: &PageRef, args: &Value| {
        stream.next(args.clone());
        Value::Null
    }
}

/// Callback that pushes `{}`.
fn emit_empty(stream: Stream<Value>) -> impl Fn(&PageRef, &Value) -> Value + 'static {
    move |_: &PageRef, _: &Value| {
        stream.next(json!({}));
        Value::Null
    }
}

fn page_driver(ctx: &Context, options: PageOptions) -> Result<DriverInstance> {
    let PageOptions {
        name,
        data: default_data,
        methods,
        config,
        lifetimes,
        others,
    } = options;

    let page: Stream<Option<PageRef>> = Stream::replay(1);
    let sync = StateSync::attach(&page, Stream::empty(), Some(default_data.clone()));

    let load: Stream<Value> = Stream::replay(1);
    let show: Stream<Value> = Stream::replay(1);
    let ready: Stream<Value> = Stream::replay(1);
    let hide: Stream<Value> = Stream::replay(1);
    let unload: Stream<Value> = Stream::replay(1);
    let pull_down_refresh: Stream<Value> = Stream::empty();
    let reach_bottom: Stream<Value> = Stream::empty();
    let page_scroll: Stream<Value> = Stream::replay(1);
    let resize: Stream<Value> = Stream::replay(1);
    let tab_item_tap: Stream<Value> = Stream::replay(1);

    let methods = MethodTable::resolve(normalize(methods)?);
    detect_reserved(
        "page",
        "methods",
        methods.names(),
        RESERVED_PAGE_NAMES,
        config.overwrite_reserved,
    );
    detect_reserved(
        "page",
        "others",
        others.keys().map(String::as_str),
        RESERVED_PAGE_NAMES,
        config.overwrite_reserved,
    );

    let mut table: CallbackTable<PageRef> = CallbackTable::new();
    table.insert_value("type", json!("page"));
    table.insert_value("name", Value::String(name.clone()));
    table.insert_value("data", default_data);
    table.insert_value("options", json!({ "pureDataPattern": "^_" }));

    {
        let page = page.clone();
        let load = load.clone();
        table.insert_callback("onLoad", move |receiver: &PageRef, args: &Value| {
            page.next(Some(receiver.clone()));
            load.next(args.clone());
            Value::Null
        });
    }
    table.insert_callback("onShow", emit_empty(show.clone()));
    table.insert_callback("onReady", emit_empty(ready.clone()));
    table.insert_callback("onHide", emit_empty(hide.clone()));
    {
        let page = page.clone();
        let unload = unload.clone();
        table.insert_callback("onUnload", move |_: &PageRef, _: &Value| {
            unload.next(json!({}));
            page.next(None);
            Value::Null
        });
    }
    table.insert_callback("onPullDownRefresh", emit_empty(pull_down_refresh.clone()));
    table.insert_callback("onReachBottom", emit_empty(reach_bottom.clone()));
    table.insert_callback("onResize", emit_args(resize.clone()));
    table.insert_callback("onTabItemTap", emit_args(tab_item_tap.clone()));

    for (method, handler) in &methods.handlers {
        table.insert(method.as_str(), handler.clone());
    }
    for (field, slot) in others {
        table.insert(field, slot);
    }

    let features = config.features;
    if features.contains(PageFeatures::PAGE_SCROLL) && !table.contains("onPageScroll") {
        table.insert_callback("onPageScroll", emit_args(page_scroll.clone()));
    }

    let share = share_driver(
        &mut table,
        ShareOptions {
            features,
            auto_equip: true,
        },
    )?;
    let exit_state = exit_state_driver(
        &mut table,
        ExitStateOptions {
            enabled: features.contains(PageFeatures::EXIT_STATE),
            auto_equip: true,
            ..Default::default()
        },
    )?;
    equip_lifetimes(&mut table, lifetimes)?;

    debug!(
        "page={} slots={} methods={}",
        name,
        table.len(),
        methods.handlers.len()
    );
    ctx.platform().register_page(table);

    let mut instance = DriverInstance::empty();
    instance.inputs.insert("data", sync.input);

    instance.outputs.insert("page", page);
    instance.outputs.insert("data", sync.current);
    instance.outputs.insert("renderedData", sync.rendered);
    instance.outputs.insert("dataChange", sync.changes);
    instance.outputs.insert("load", load);
    instance.outputs.insert("show", show);
    instance.outputs.insert("ready", ready);
    instance.outputs.insert("hide", hide);
    instance.outputs.insert("unload", unload);
    instance.outputs.insert("pullDownRefresh", pull_down_refresh);
    instance.outputs.insert("reachBottom", reach_bottom);
    instance.outputs.insert("pageScroll", page_scroll);
    instance.outputs.insert("resize", resize);
    instance.outputs.insert("tabItemTap", tab_item_tap);

    compose(&mut instance, [share, exit_state]);

    for (method, sink) in methods.sinks {
        instance.inputs.insert(method.clone(), sink.clone());
        instance.outputs.insert(method, sink);
    }

    Ok(instance)
}
