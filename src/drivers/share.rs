//! Share sub-driver - `onShareAppMessage`, `onShareTimeline`, `onAddToFavorites`.
//!
//! Each hook emits the host's event and answers with a copy of the latest
//! info pushed by the application:
//!
//! ```ignore
//! page.inputs.value("shareAppMessageInfo").unwrap().next(json!({ "title": "Hi" }));
//! // host calls onShareAppMessage -> returns { "title": "Hi" }
//! ```

use std::rc::Rc;

use serde_json::{json, Value};

use super::page::PageFeatures;
use super::Equip;
use crate::channel::Stream;
use crate::error::Result;
use crate::framework::driver::DriverInstance;
use crate::framework::table::CallbackTable;
use crate::host::PageRef;

#[derive(Clone, Copy, Debug, Default)]
pub struct ShareOptions {
    /// Only the share flags are read.
    pub features: PageFeatures,
    /// Equip the table immediately.
    pub auto_equip: bool,
}

/// Shallow copy of an info object; anything else answers `{}`.
fn info_of(info: &Stream<Value>) -> Value {
    match info.value() {
        Some(Value::Object(fields)) => Value::Object(fields),
        _ => json!({}),
    }
}

/// Build the share sub-driver. Disabled unless a share feature is set.
pub fn share_driver(
    table: &mut CallbackTable<PageRef>,
    options: ShareOptions,
) -> Result<DriverInstance> {
    let features = options.features & PageFeatures::SHARE;
    if features.is_empty() {
        return Ok(DriverInstance::empty());
    }

    let share_app_message_info = Stream::of(json!({}));
    let share_timeline_info = Stream::of(json!({}));
    let add_to_favorites_info = Stream::of(json!({}));

    let share_app_message: Stream<Value> = Stream::replay(1);
    let share_timeline: Stream<Value> = Stream::replay(1);
    let add_to_favorites: Stream<Value> = Stream::replay(1);

    let equip: Equip = {
        let share_app_message_info = share_app_message_info.clone();
        let share_timeline_info = share_timeline_info.clone();
        let add_to_favorites_info = add_to_favorites_info.clone();
        let share_app_message = share_app_message.clone();
        let share_timeline = share_timeline.clone();
        let add_to_favorites = add_to_favorites.clone();

        Rc::new(move |table: &mut CallbackTable<PageRef>| -> Result<()> {
            if features.contains(PageFeatures::SHARE_APP_MESSAGE)
                && !table.contains("onShareAppMessage")
            {
                let event = share_app_message.clone();
                let info = share_app_message_info.clone();
                table.insert_callback("onShareAppMessage", move |_: &PageRef, args: &Value| {
                    event.next(args.clone());
                    info_of(&info)
                });
            }
            if features.contains(PageFeatures::SHARE_TIMELINE) && !table.contains("onShareTimeline")
            {
                let event = share_timeline.clone();
                let info = share_timeline_info.clone();
                table.insert_callback("onShareTimeline", move |_: &PageRef, _: &Value| {
                    event.next(json!({}));
                    info_of(&info)
                });
            }
            if features.contains(PageFeatures::ADD_TO_FAVORITES)
                && !table.contains("onAddToFavorites")
            {
                let event = add_to_favorites.clone();
                let info = add_to_favorites_info.clone();
                table.insert_callback("onAddToFavorites", move |_: &PageRef, args: &Value| {
                    event.next(args.clone());
                    info_of(&info)
                });
            }
            Ok(())
        })
    };

    if options.auto_equip {
        equip(table)?;
    }

    let mut instance = DriverInstance::empty();
    instance
        .inputs
        .insert("shareAppMessageInfo", share_app_message_info);
    instance.inputs.insert("shareTimelineInfo", share_timeline_info);
    instance.inputs.insert("addToFavoritesInfo", add_to_favorites_info);
    instance.outputs.insert("shareAppMessage", share_app_message);
    instance.outputs.insert("shareTimeline", share_timeline);
    instance.outputs.insert("addToFavorites", add_to_favorites);
    instance.others.insert("equip", equip);
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockPage;

    fn page() -> PageRef {
        MockPage::new("pages/share", json!({})).as_page_ref()
    }

    #[test]
    fn test_disabled_without_share_flags() {
        let mut table = CallbackTable::new();
        let instance = share_driver(
            &mut table,
            ShareOptions {
                features: PageFeatures::PAGE_SCROLL | PageFeatures::EXIT_STATE,
                auto_equip: true,
            },
        )
        .unwrap();

        assert!(instance.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_share_app_message_returns_latest_info() {
        let mut table = CallbackTable::new();
        let instance = share_driver(
            &mut table,
            ShareOptions {
                features: PageFeatures::SHARE_APP_MESSAGE,
                auto_equip: true,
            },
        )
        .unwrap();

        assert!(table.has_callback("onShareAppMessage"));
        assert!(!table.contains("onShareTimeline"));

        let info = instance.inputs.value("shareAppMessageInfo").unwrap();
        assert_eq!(
            table.invoke("onShareAppMessage", &page(), &json!({ "from": "menu" })),
            Some(json!({}))
        );

        info.next(json!({ "title": "Counter", "path": "/pages/index" }));
        let answer = table.invoke("onShareAppMessage", &page(), &json!({ "from": "button" }));
        assert_eq!(answer, Some(json!({ "title": "Counter", "path": "/pages/index" })));

        let event = instance.outputs.value("shareAppMessage").unwrap();
        assert_eq!(event.value(), Some(json!({ "from": "button" })));
    }

    #[test]
    fn test_share_timeline_emits_empty_event() {
        let mut table = CallbackTable::new();
        let instance = share_driver(
            &mut table,
            ShareOptions {
                features: PageFeatures::SHARE_TIMELINE,
                auto_equip: true,
            },
        )
        .unwrap();

        table.invoke("onShareTimeline", &page(), &json!({ "ignored": true }));
        let event = instance.outputs.value("shareTimeline").unwrap();
        assert_eq!(event.value(), Some(json!({})));
    }

    #[test]
    fn test_existing_slot_is_kept() {
        let mut table: CallbackTable<PageRef> = CallbackTable::new();
        table.insert_callback("onAddToFavorites", |_: &PageRef, _: &Value| json!("mine"));

        share_driver(
            &mut table,
            ShareOptions {
                features: PageFeatures::ADD_TO_FAVORITES,
                auto_equip: true,
            },
        )
        .unwrap();

        assert_eq!(
            table.invoke("onAddToFavorites", &page(), &Value::Null),
            Some(json!("mine"))
        );
    }

    #[test]
    fn test_manual_equip() {
        let mut table = CallbackTable::new();
        let instance = share_driver(
            &mut table,
            ShareOptions {
                features: PageFeatures::SHARE,
                auto_equip: false,
            },
        )
        .unwrap();
        assert!(table.is_empty());

        let equip = instance.others.get::<Equip>("equip").unwrap();
        equip(&mut table).unwrap();
        assert_eq!(table.len(), 3);
    }
}
