//! Framework Module - the machinery every driver is built from
//!
//! - **Callback table** - named host slots holding callbacks or data
//! - **Methods** - normalize user method declarations
//! - **Lifetimes** - weave extra behavior into existing slots
//! - **Reserved names** - warn when user slots shadow framework ones
//! - **Singleton** - one driver setup per usage site
//! - **State sync** - push values into a host-held state blob
//! - **Driver** - driver instances and sub-driver composition

pub mod context;
pub mod driver;
pub mod lifetimes;
pub mod methods;
pub mod reserved;
pub mod singleton;
pub mod state_sync;
pub mod table;

pub use context::Context;
pub use driver::{compose, Channels, DriverInstance, Others};
pub use lifetimes::{equip_lifetimes, Lifetime, LifetimeDescriptor, Lifetimes, Mode, Position};
pub use methods::{
    normalize, normalize_one, MethodDecl, MethodDescriptor, MethodSpec, MethodTable, NamedHandler,
};
pub use reserved::{detect_reserved, RESERVED_APP_NAMES, RESERVED_PAGE_NAMES};
pub use singleton::{DriverFactory, GeneralDriver, SingletonRegistry, Site, SiteState};
pub use state_sync::{StateChange, StateHost, StateSync};
pub use table::{callback, Callback, CallbackTable, Slot};
