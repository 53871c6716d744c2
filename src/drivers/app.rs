//! App driver - app lifecycle and global data as streams.
//!
//! `onLaunch` publishes the live app object into the [`Context`]'s app holder.
//! Global data pushed on the `globalData` input is applied to it through a
//! state-sync pipeline; the default global data is queued as the first
//! submission and lands as soon as the app launches.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use serde_json::{json, Value};

use crate::channel::Stream;
use crate::error::Result;
use crate::framework::context::Context;
use crate::framework::driver::DriverInstance;
use crate::framework::lifetimes::{equip_lifetimes, Lifetimes};
use crate::framework::reserved::{detect_reserved, RESERVED_APP_NAMES};
use crate::framework::singleton::GeneralDriver;
use crate::framework::state_sync::StateSync;
use crate::framework::table::{CallbackTable, Slot};
use crate::host::{AppRef, Theme};

#[derive(Clone, Copy, Debug, Default)]
pub struct AppConfig {
    /// Silence the reserved-name warning for deliberate overrides.
    pub overwrite_reserved: bool,
}

pub struct AppOptions {
    pub default_global_data: Value,
    pub config: AppConfig,
    pub lifetimes: Lifetimes<AppRef>,
    /// Copied into the callback table as-is.
    pub others: BTreeMap<String, Slot<AppRef>>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            default_global_data: json!({}),
            config: AppConfig::default(),
            lifetimes: Vec::new(),
            others: BTreeMap::new(),
        }
    }
}

pub static APP_DRIVER: GeneralDriver<AppOptions> = GeneralDriver::new("app", app_driver);

#[track_caller]
pub fn use_app_driver(ctx: &Context, options: AppOptions) -> Result<Rc<DriverInstance>> {
    APP_DRIVER.use_driver(ctx, options)
}

fn emit_args(stream: Stream<Value>) -> impl Fn(&AppRef, &Value) -> Value + 'static {
    move |_: &AppRef, args: &Value| {
        stream.next(args.clone());
        Value::Null
    }
}

/// `{theme, isDark, isLight}` for a theme-change payload.
fn theme_event(args: &Value) -> Value {
    let theme = args.get("theme").cloned().unwrap_or(Value::Null);
    let parsed = theme.as_str().and_then(Theme::parse);
    json!({
        "theme": theme,
        "isDark": parsed == Some(Theme::Dark),
        "isLight": parsed == Some(Theme::Light),
    })
}

fn app_driver(ctx: &Context, options: AppOptions) -> Result<DriverInstance> {
    let AppOptions {
        default_global_data,
        config,
        lifetimes,
        others,
    } = options;

    let app: Stream<AppRef> = Stream::replay(1);
    let launch: Stream<Value> = Stream::replay(1);
    let show: Stream<Value> = Stream::replay(1);
    let hide: Stream<Value> = Stream::replay(1);
    let error: Stream<Value> = Stream::replay(1);
    let page_not_found: Stream<Value> = Stream::replay(1);
    let unhandled_rejection: Stream<Value> = Stream::replay(1);
    let theme_change: Stream<Value> = Stream::replay(1);

    let sync = StateSync::attach(
        ctx.app(),
        Stream::replay_of(1, default_global_data.clone()),
        None,
    );

    detect_reserved(
        "app",
        "others",
        others.keys().map(String::as_str),
        RESERVED_APP_NAMES,
        config.overwrite_reserved,
    );

    let mut table: CallbackTable<AppRef> = CallbackTable::new();
    {
        let holder = ctx.app().clone();
        let app = app.clone();
        let launch = launch.clone();
        table.insert_callback("onLaunch", move |receiver: &AppRef, args: &Value| {
            holder.next(Some(receiver.clone()));
            app.next(receiver.clone());
            launch.next(args.clone());
            Value::Null
        });
    }
    table.insert_callback("onShow", emit_args(show.clone()));
    {
        let hide = hide.clone();
        table.insert_callback("onHide", move |_: &AppRef, _: &Value| {
            hide.next(json!({}));
            Value::Null
        });
    }
    table.insert_callback("onError", emit_args(error.clone()));
    table.insert_callback("onPageNotFound", emit_args(page_not_found.clone()));
    table.insert_callback("onUnhandledRejection", emit_args(unhandled_rejection.clone()));
    {
        let theme_change = theme_change.clone();
        table.insert_callback("onThemeChange", move |_: &AppRef, args: &Value| {
            theme_change.next(theme_event(args));
            Value::Null
        });
    }
    table.insert_value("globalData", default_global_data);

    for (field, slot) in others {
        table.insert(field, slot);
    }
    equip_lifetimes(&mut table, lifetimes)?;

    debug!("app slots={}", table.len());
    ctx.platform().register_app(table);

    let mut instance = DriverInstance::empty();
    instance.inputs.insert("globalData", sync.input);

    instance.outputs.insert("app", app);
    instance.outputs.insert("launch", launch);
    instance.outputs.insert("show", show);
    instance.outputs.insert("hide", hide);
    instance.outputs.insert("error", error);
    instance.outputs.insert("pageNotFound", page_not_found);
    instance.outputs.insert("unhandledRejection", unhandled_rejection);
    instance.outputs.insert("themeChange", theme_change);
    instance.outputs.insert("globalData", sync.current);
    instance.outputs.insert("globalDataChange", sync.changes);
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::state_sync::StateChange;
    use crate::host::mock::MockPlatform;
    use crate::host::AppInstance;

    fn setup() -> (Rc<MockPlatform>, Context) {
        let platform = Rc::new(MockPlatform::new());
        let ctx = Context::new(platform.clone());
        (platform, ctx)
    }

    #[test]
    fn test_launch_publishes_app() {
        let (platform, ctx) = setup();
        let driver = APP_DRIVER.create(&ctx, AppOptions::default()).unwrap();
        assert!(ctx.app().value().is_none());

        let app = platform.open_app().unwrap();
        platform.fire_app(&app, "onLaunch", &json!({ "path": "pages/index" }));

        assert!(ctx.app().value().flatten().is_some());
        assert!(driver.outputs.get::<AppRef>("app").unwrap().value().is_some());
        assert_eq!(
            driver.outputs.value("launch").unwrap().value(),
            Some(json!({ "path": "pages/index" }))
        );
    }

    #[test]
    fn test_default_global_data_applied_on_launch() {
        let (platform, ctx) = setup();
        let driver = APP_DRIVER
            .create(
                &ctx,
                AppOptions {
                    default_global_data: json!({ "user": null, "lang": "en" }),
                    ..Default::default()
                },
            )
            .unwrap();

        let changes = driver.outputs.get::<StateChange>("globalDataChange").unwrap();
        assert_eq!(changes.value().unwrap().cur, Value::Null);
        assert_eq!(driver.outputs.value("globalData").unwrap().value(), None);

        let app = crate::host::mock::MockApp::new(json!({}));
        platform.fire_app(&app, "onLaunch", &json!({}));

        assert_eq!(app.global_data(), json!({ "user": null, "lang": "en" }));
        assert_eq!(
            driver.outputs.value("globalData").unwrap().value(),
            Some(json!({ "user": null, "lang": "en" }))
        );
    }

    #[test]
    fn test_theme_change_event() {
        assert_eq!(
            theme_event(&json!({ "theme": "dark" })),
            json!({ "theme": "dark", "isDark": true, "isLight": false })
        );
        assert_eq!(
            theme_event(&json!({})),
            json!({ "theme": null, "isDark": false, "isLight": false })
        );
    }

    #[test]
    fn test_hide_emits_empty_object() {
        let (platform, ctx) = setup();
        let driver = APP_DRIVER.create(&ctx, AppOptions::default()).unwrap();
        let app = platform.open_app().unwrap();

        platform.fire_app(&app, "onHide", &json!("ignored"));
        assert_eq!(driver.outputs.value("hide").unwrap().value(), Some(json!({})));
    }

    #[test]
    fn test_others_override_and_lifetimes_layer() {
        let (platform, ctx) = setup();
        let mut others = BTreeMap::new();
        others.insert("appVersion".to_string(), Slot::Value(json!("1.2.0")));
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        let driver = APP_DRIVER
            .create(
                &ctx,
                AppOptions {
                    others,
                    lifetimes: vec![(
                        "onError".to_string(),
                        crate::framework::lifetimes::Lifetime::handler(
                            move |_: &AppRef, args: &Value| {
                                seen_clone.borrow_mut().push(args.clone());
                                Value::Null
                            },
                        ),
                    )],
                    ..Default::default()
                },
            )
            .unwrap();

        let table = platform.app_table().unwrap();
        assert_eq!(table.value("appVersion"), Some(&json!("1.2.0")));

        let app = platform.open_app().unwrap();
        platform.fire_app(&app, "onError", &json!("boom"));
        assert_eq!(*seen.borrow(), vec![json!("boom")]);
        assert_eq!(driver.outputs.value("error").unwrap().value(), Some(json!("boom")));
    }
}
