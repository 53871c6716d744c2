//! Counter Example - a page driven entirely through streams
//!
//! This example demonstrates the page driver against the in-process host:
//! - Declaring a method and reacting to it through its sink
//! - Pushing page data and observing `dataChange` / `renderedData`
//! - Mirroring the app theme into a signal
//!
//! Run with: cargo run --example counter

use std::rc::Rc;

use serde_json::json;
use spark_mina::{
    init_logging, use_page_driver, use_theme_driver, Context, GlobalEvent, MockPlatform,
    PageInstance, PageOptions, StateChange, SystemInfo, Theme, ThemeOptions,
};
use spark_signals::{effect, Signal};

fn main() -> spark_mina::Result<()> {
    init_logging("debug")?;

    println!("=== spark-mina Counter Example ===\n");

    let platform = Rc::new(MockPlatform::with_system_info(SystemInfo {
        theme: Some(Theme::Light),
        system: "demo".into(),
        sdk_version: "3.0.0".into(),
    }));
    let ctx = Context::new(platform.clone());

    // Page driver with one declared method
    let page = use_page_driver(
        &ctx,
        PageOptions {
            name: "Counter".into(),
            data: json!({ "count": 0 }),
            methods: vec!["increment".into()],
            ..Default::default()
        },
    )?;

    let data_in = page.inputs.value("data").expect("data input");
    let data_out = page.outputs.value("data").expect("data output");
    let increment = page.outputs.value("increment").expect("increment sink");
    let _ = increment.subscribe(move |_| {
        let count = data_out
            .value()
            .and_then(|data| data["count"].as_i64())
            .unwrap_or(0);
        data_in.next(json!({ "count": count + 1 }));
    });

    let changes = page
        .outputs
        .get::<StateChange>("dataChange")
        .expect("dataChange output");
    let _ = changes.subscribe(|change| {
        println!("dataChange: {} -> {}", change.prev, change.cur);
    });
    let rendered = page.outputs.value("renderedData").expect("renderedData output");
    let _ = rendered.subscribe(|data| println!("rendered:   {data}"));

    // Theme as a signal
    let theme = use_theme_driver(&ctx, ThemeOptions::default())?;
    let current = theme
        .others
        .get::<Signal<Option<Theme>>>("signal")
        .expect("theme signal");
    let _stop = effect(move || {
        println!("theme:      {:?}", current.get());
    });

    // Simulate the host
    let instance = platform.open_page(0, "pages/counter").expect("registered page");
    platform.fire_page(0, &instance, "onLoad", &json!({ "from": "demo" }));

    for _ in 0..3 {
        platform.fire_page(0, &instance, "increment", &json!({ "type": "tap" }));
        instance.flush_renders();
    }

    platform.emit(GlobalEvent::ThemeChange, &json!({ "theme": "dark" }));

    println!("\nfinal page data: {}", instance.data());
    Ok(())
}
