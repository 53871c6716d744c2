//! Theme driver - the host's current light/dark theme.
//!
//! Exposed twice:
//! - `outputs["theme"]`: a replay stream of [`Theme`]
//! - `others["signal"]`: the same value as a `spark_signals` signal, for use in
//!   deriveds and effects
//!
//! ```ignore
//! let theme = use_theme_driver(&ctx, ThemeOptions::default())?;
//! let current = theme.others.get::<Signal<Option<Theme>>>("signal").unwrap();
//! let _stop = effect(move || println!("theme: {:?}", current.get()));
//! ```

use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;

use crate::channel::Stream;
use crate::error::Result;
use crate::framework::context::Context;
use crate::framework::driver::DriverInstance;
use crate::framework::singleton::GeneralDriver;
use crate::host::{GlobalEvent, Theme};

#[derive(Clone, Copy, Debug, Default)]
pub struct ThemeOptions {
    /// Used when the host does not report a theme.
    pub default_theme: Theme,
}

pub static THEME_DRIVER: GeneralDriver<ThemeOptions> = GeneralDriver::new("theme", theme_driver);

#[track_caller]
pub fn use_theme_driver(ctx: &Context, options: ThemeOptions) -> Result<Rc<DriverInstance>> {
    THEME_DRIVER.use_driver(ctx, options)
}

fn theme_driver(ctx: &Context, options: ThemeOptions) -> Result<DriverInstance> {
    let initial = match ctx.platform().system_info().theme {
        Some(theme) => theme,
        None => {
            warn!(
                "[spark-mina] theme - host reports no theme, dark mode must be enabled in the host config; using {}",
                options.default_theme.as_str()
            );
            options.default_theme
        }
    };

    let theme = Stream::replay_of(1, initial);
    let sink = theme.clone();
    ctx.platform().subscribe(
        GlobalEvent::ThemeChange,
        Box::new(move |payload: &Value| {
            match payload.get("theme").and_then(Value::as_str).and_then(Theme::parse) {
                Some(next) => {
                    debug!("theme={}", next.as_str());
                    sink.next(next);
                }
                None => warn!("[spark-mina] theme - unrecognized theme change payload: {}", payload),
            }
        }),
    );

    let mut instance = DriverInstance::empty();
    instance.others.insert("signal", theme.watch());
    instance.outputs.insert("theme", theme);
    Ok(instance)
}
