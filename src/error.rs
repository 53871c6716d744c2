//! Error types.
//!
//! Every error here is a configuration error: it is raised synchronously
//! while a driver is being constructed and is fatal to that construction.
//! Reserved-name collisions are diagnostics, not errors, and never show up here.

use thiserror::Error;

/// Errors raised while building drivers and callback tables.
#[derive(Debug, Error)]
pub enum Error {
    /// A callable was declared as a method but has no discoverable name,
    /// so it cannot be matched to a host slot.
    #[error("method handler has no discoverable name; declare it as a named fn item or with NamedHandler::named")]
    MissingName,

    /// A method descriptor failed validation.
    #[error("invalid method descriptor `{name}`: {reason}")]
    InvalidDescriptor { name: String, reason: &'static str },

    /// A lifetime descriptor carries no handler.
    #[error("invalid lifetime for slot `{name}`: a handler is required when the lifetime is a descriptor")]
    InvalidLifetime { name: String },

    /// A sub-driver needs a slot that the callback table does not define yet.
    #[error("{driver}: `{slot}` must be defined before the callback table is equipped")]
    MissingPrerequisite {
        driver: &'static str,
        slot: &'static str,
    },

    /// The logger backend could not be started.
    #[error("failed to start logger: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
