//! Middleware descriptors: how routes and bootstrap code name middleware

use super::{BoxedMiddleware, Middleware};
use crate::container::key_of;
use crate::error::{FrameworkError, Result};
use std::fmt;
use std::sync::Arc;

/// Something the middleware resolver can turn into a chain
#[derive(Clone)]
pub enum MiddlewareDescriptor {
    /// A group name, an alias or a class key, optionally `name:p1,p2`
    Name(String),
    /// A ready-made handler
    Handler {
        name: String,
        handler: BoxedMiddleware,
    },
    /// Several descriptors run in order
    List(Vec<MiddlewareDescriptor>),
}

impl MiddlewareDescriptor {
    /// Refer to a middleware class by its type key
    pub fn of<M: Middleware + 'static>() -> Self {
        Self::Name(key_of::<M>())
    }

    /// Use a middleware value directly
    pub fn handler<M: Middleware + 'static>(middleware: M) -> Self {
        Self::Handler {
            name: key_of::<M>(),
            handler: Arc::new(middleware),
        }
    }

    /// Use a shared middleware under an explicit name
    pub fn named(name: impl Into<String>, handler: BoxedMiddleware) -> Self {
        Self::Handler {
            name: name.into(),
            handler,
        }
    }

    /// Name used for priority lookup: the part before any `:params`
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(split_params(name).map_or(name.as_str(), |(n, _)| n).trim()),
            Self::Handler { name, .. } => Some(name),
            Self::List(_) => None,
        }
    }
}

/// Split at the first single `:`; `::` belongs to type-path keys
fn split_params(descriptor: &str) -> Option<(&str, &str)> {
    let bytes = descriptor.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            if bytes.get(i + 1) == Some(&b':') {
                i += 2;
                continue;
            }
            return Some((&descriptor[..i], &descriptor[i + 1..]));
        }
        i += 1;
    }
    None
}

/// Split `name:p1,p2` into the name and its parameters
///
/// A descriptor without a parameter colon has no parameters. Empty names, and a colon
/// with nothing after it, are configuration errors.
pub(crate) fn parse_name(descriptor: &str) -> Result<(&str, Vec<String>)> {
    let descriptor = descriptor.trim();
    let (name, params) = match split_params(descriptor) {
        Some((name, params)) => {
            if params.trim().is_empty() {
                return Err(FrameworkError::configuration(format!(
                    "Malformed middleware descriptor [{}]: expected parameters after ':'",
                    descriptor
                )));
            }
            let params = params.split(',').map(|p| p.trim().to_string()).collect();
            (name.trim(), params)
        }
        None => (descriptor, Vec::new()),
    };

    if name.is_empty() {
        return Err(FrameworkError::configuration(format!(
            "Malformed middleware descriptor [{}]: missing middleware name",
            descriptor
        )));
    }
    Ok((name, params))
}

impl From<&str> for MiddlewareDescriptor {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for MiddlewareDescriptor {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<BoxedMiddleware> for MiddlewareDescriptor {
    fn from(handler: BoxedMiddleware) -> Self {
        Self::Handler {
            name: "closure".to_string(),
            handler,
        }
    }
}

impl<D: Into<MiddlewareDescriptor>> From<Vec<D>> for MiddlewareDescriptor {
    fn from(list: Vec<D>) -> Self {
        Self::List(list.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for MiddlewareDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Handler { name, .. } => f.debug_tuple("Handler").field(name).finish(),
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
        }
    }
}
