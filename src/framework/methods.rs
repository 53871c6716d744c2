//! Method Normalizer - uniform `{name, handler, sink}` specs from user declarations.
//!
//! Custom page methods (view event handlers and the like) can be declared three ways:
//!
//! ```ignore
//! let methods: Vec<MethodDecl<PageRef>> = vec![
//!     // bare name: handler forwards its argument into a fresh sink
//!     "tapButton".into(),
//!     // named fn item: handler only, name taken from the item path
//!     NamedHandler::from_fn(on_input).into(),
//!     // descriptor: explicit name with a handler and/or an existing sink
//!     MethodDescriptor::new("submit").sink(submit_stream).into(),
//! ];
//! ```
//!
//! Duplicate names resolve asymmetrically: the first handler wins, the last sink
//! is the one exposed. [`MethodTable::resolve`] implements that rule.

use std::collections::BTreeMap;

use serde_json::Value;

use super::table::{callback, Callback};
use crate::channel::{Sink, Stream};
use crate::error::{Error, Result};

// =============================================================================
// Declarations
// =============================================================================

/// A handler with the name it should be installed under.
pub struct NamedHandler<H> {
    name: Option<String>,
    handler: Callback<H>,
}

impl<H> NamedHandler<H> {
    /// Take the name from the function item's path.
    ///
    /// Closures have no usable name, so they resolve to [`Error::MissingName`]
    /// during normalization.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        Self {
            name: discover_name::<F>(),
            handler: callback(f),
        }
    }

    /// Explicit name, any callable.
    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        Self {
            name: Some(name.into()),
            handler: callback(f),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Object-style declaration.
pub struct MethodDescriptor<H> {
    pub name: String,
    pub handler: Option<Callback<H>>,
    pub sink: Option<Stream<Value>>,
}

impl<H> MethodDescriptor<H> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: None,
            sink: None,
        }
    }

    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        self.handler = Some(callback(f));
        self
    }

    pub fn sink(mut self, sink: Stream<Value>) -> Self {
        self.sink = Some(sink);
        self
    }
}

/// One accepted declaration shape.
pub enum MethodDecl<H> {
    Name(String),
    Handler(NamedHandler<H>),
    Descriptor(MethodDescriptor<H>),
}

impl<H> From<&str> for MethodDecl<H> {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl<H> From<String> for MethodDecl<H> {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<H> From<NamedHandler<H>> for MethodDecl<H> {
    fn from(handler: NamedHandler<H>) -> Self {
        Self::Handler(handler)
    }
}

impl<H> From<MethodDescriptor<H>> for MethodDecl<H> {
    fn from(descriptor: MethodDescriptor<H>) -> Self {
        Self::Descriptor(descriptor)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalized method.
pub struct MethodSpec<H> {
    pub name: String,
    pub handler: Callback<H>,
    pub sink: Option<Stream<Value>>,
}

fn forward_into<H: 'static>(sink: Stream<Value>) -> Callback<H> {
    callback(move |_: &H, event: &Value| {
        Sink::next(&sink, event.clone());
        Value::Null
    })
}

/// Normalize a single declaration.
pub fn normalize_one<H: 'static>(decl: MethodDecl<H>) -> Result<MethodSpec<H>> {
    match decl {
        MethodDecl::Name(name) => {
            if name.is_empty() {
                return Err(Error::InvalidDescriptor {
                    name,
                    reason: "name must not be empty",
                });
            }
            let sink = Stream::empty();
            Ok(MethodSpec {
                name,
                handler: forward_into(sink.clone()),
                sink: Some(sink),
            })
        }
        MethodDecl::Handler(NamedHandler { name, handler }) => match name {
            Some(name) if !name.is_empty() => Ok(MethodSpec {
                name,
                handler,
                sink: None,
            }),
            _ => Err(Error::MissingName),
        },
        MethodDecl::Descriptor(MethodDescriptor {
            name,
            handler,
            sink,
        }) => {
            if name.is_empty() {
                return Err(Error::InvalidDescriptor {
                    name,
                    reason: "name is required",
                });
            }
            match (handler, sink) {
                (None, None) => Err(Error::InvalidDescriptor {
                    name,
                    reason: "one of handler and sink is required",
                }),
                (None, Some(sink)) => Ok(MethodSpec {
                    name,
                    handler: forward_into(sink.clone()),
                    sink: Some(sink),
                }),
                (Some(handler), sink) => Ok(MethodSpec {
                    name,
                    handler,
                    sink,
                }),
            }
        }
    }
}

/// Normalize declarations in order. Stops at the first invalid one.
pub fn normalize<H: 'static>(decls: Vec<MethodDecl<H>>) -> Result<Vec<MethodSpec<H>>> {
    decls.into_iter().map(normalize_one).collect()
}

/// Handlers and sinks keyed by method name.
pub struct MethodTable<H> {
    /// First handler per name, in first-declaration order.
    pub handlers: Vec<(String, Callback<H>)>,
    /// Last sink per name.
    pub sinks: BTreeMap<String, Stream<Value>>,
}

impl<H> MethodTable<H> {
    /// Collapse normalized specs: first handler wins, last sink is exposed.
    pub fn resolve(specs: Vec<MethodSpec<H>>) -> Self {
        let mut handlers: Vec<(String, Callback<H>)> = Vec::new();
        let mut sinks = BTreeMap::new();
        for spec in specs {
            if !handlers.iter().any(|(name, _)| *name == spec.name) {
                handlers.push((spec.name.clone(), spec.handler));
            }
            if let Some(sink) = spec.sink {
                sinks.insert(spec.name, sink);
            }
        }
        Self { handlers, sinks }
    }

    /// Every method name, handlers first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(name, _)| name.as_str())
    }
}

/// Name of a fn item from its type path, `None` for closures and fn pointers.
fn discover_name<F>() -> Option<String> {
    let path = std::any::type_name::<F>();
    // Only fn items have a path; closures, fn pointers and references do not.
    if path.contains("{{closure}}")
        || path.contains('(')
        || path.starts_with("for<")
        || path.starts_with('&')
    {
        return None;
    }
    let path = path.split('<').next().unwrap_or(path);
    path.rsplit("::")
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

// =============================================================================
// TESTS
// =============================================================================
