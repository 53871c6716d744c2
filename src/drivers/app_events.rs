//! App-events driver - process-wide host notifications as replay streams.

use std::rc::Rc;

use serde_json::{json, Value};

use crate::channel::Stream;
use crate::error::Result;
use crate::framework::context::Context;
use crate::framework::driver::DriverInstance;
use crate::framework::singleton::GeneralDriver;
use crate::host::GlobalEvent;

pub static APP_EVENTS_DRIVER: GeneralDriver<()> =
    GeneralDriver::new("app-events", app_events_driver);

#[track_caller]
pub fn use_app_events_driver(ctx: &Context) -> Result<Rc<DriverInstance>> {
    APP_EVENTS_DRIVER.use_driver(ctx, ())
}

/// Events whose payload is dropped in favor of `{}`.
fn carries_payload(event: GlobalEvent) -> bool {
    !matches!(
        event,
        GlobalEvent::AudioInterruptionBegin | GlobalEvent::AudioInterruptionEnd | GlobalEvent::AppHide
    )
}

fn app_events_driver(ctx: &Context, _: ()) -> Result<DriverInstance> {
    let mut instance = DriverInstance::empty();
    for event in GlobalEvent::ALL {
        let stream: Stream<Value> = Stream::replay(1);
        let sink = stream.clone();
        let with_payload = carries_payload(event);
        ctx.platform().subscribe(
            event,
            Box::new(move |payload: &Value| {
                sink.next(if with_payload { payload.clone() } else { json!({}) });
            }),
        );
        instance.outputs.insert(event.channel_name(), stream);
    }
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::singleton::Site;
    use crate::host::mock::MockPlatform;

    #[test]
    fn test_every_event_has_an_output() {
        let platform = Rc::new(MockPlatform::new());
        let ctx = Context::new(platform.clone());
        let driver = APP_EVENTS_DRIVER.create(&ctx, ()).unwrap();

        for event in GlobalEvent::ALL {
            assert!(driver.outputs.contains(event.channel_name()));
            assert_eq!(platform.listener_count(event), 1);
        }
    }

    #[test]
    fn test_payloads() {
        let platform = Rc::new(MockPlatform::new());
        let ctx = Context::new(platform.clone());
        let driver = APP_EVENTS_DRIVER.create(&ctx, ()).unwrap();

        platform.emit(GlobalEvent::Error, &json!("stack trace"));
        platform.emit(GlobalEvent::AppHide, &json!({ "reason": 0 }));
        platform.emit(GlobalEvent::AppShow, &json!({ "scene": 1001 }));

        assert_eq!(driver.outputs.value("error").unwrap().value(), Some(json!("stack trace")));
        assert_eq!(driver.outputs.value("appHide").unwrap().value(), Some(json!({})));
        assert_eq!(
            driver.outputs.value("appShow").unwrap().value(),
            Some(json!({ "scene": 1001 }))
        );
        assert_eq!(driver.outputs.value("themeChange").unwrap().value(), None);
    }

    #[test]
    fn test_subscribes_once_per_site() {
        let platform = Rc::new(MockPlatform::new());
        let ctx = Context::new(platform.clone());
        let site = Site::named("events");

        let first = APP_EVENTS_DRIVER.use_at(&ctx, site, ()).unwrap();
        let second = APP_EVENTS_DRIVER.use_at(&ctx, site, ()).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(platform.listener_count(GlobalEvent::Error), 1);
    }
}
