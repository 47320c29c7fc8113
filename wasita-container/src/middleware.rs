//! Resolution middleware.
//!
//! A [`MiddlewarePipe`] is an ordered list of interceptors folded around
//! the base value getter of every resolution:
//!
//! ```text
//! composed = mw_n( … mw_2( mw_1( base ) ) … )
//! ```
//!
//! The first middleware added wraps the base getter directly, so the last
//! one added runs first when the composed getter is called. A middleware
//! can short-circuit, rewrite arguments, memoize or log by choosing if and
//! how it calls the getter it wraps.
//!
//! A pipe is only mutable while it is being set up. Once a provider owns
//! it there is no way to append, so a composed getter never changes shape
//! under an in-flight resolution.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::descriptor::{ServiceArgs, ServiceDescriptor, ServiceValue};
use crate::error::Result;
use crate::provider::ServiceProvider;

/// Produces a value for a descriptor and a set of call arguments.
pub type ValueGetter =
    Arc<dyn Fn(&ServiceDescriptor, &ServiceArgs) -> Result<ServiceValue> + Send + Sync>;

/// Wraps a closure into a [`ValueGetter`].
///
/// ```
/// use wasita_container::middleware::getter;
///
/// let constant = getter(|_descriptor, _args| Ok(std::sync::Arc::new(5u8) as _));
/// # let _ = constant;
/// ```
pub fn getter<F>(f: F) -> ValueGetter
where
    F: Fn(&ServiceDescriptor, &ServiceArgs) -> Result<ServiceValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An interceptor composed around value construction.
///
/// Receives the descriptor being resolved, the requesting provider, the
/// getter for everything composed before it and the call arguments, and
/// returns the getter to use instead.
pub trait Middleware: Send + Sync {
    fn wrap(
        &self,
        descriptor: &ServiceDescriptor,
        provider: &ServiceProvider,
        next: ValueGetter,
        args: &ServiceArgs,
    ) -> ValueGetter;
}

impl<F> Middleware for F
where
    F: Fn(&ServiceDescriptor, &ServiceProvider, ValueGetter, &ServiceArgs) -> ValueGetter
        + Send
        + Sync,
{
    fn wrap(
        &self,
        descriptor: &ServiceDescriptor,
        provider: &ServiceProvider,
        next: ValueGetter,
        args: &ServiceArgs,
    ) -> ValueGetter {
        self(descriptor, provider, next, args)
    }
}

/// Ordered, append-only list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewarePipe {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipe {
    /// Creates an empty pipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a closure middleware.
    ///
    /// ```
    /// use wasita_container::middleware::{getter, MiddlewarePipe};
    ///
    /// let mut pipe = MiddlewarePipe::new();
    /// pipe.add_middleware(|descriptor, _provider, next, _args| {
    ///     let name = descriptor.name().to_string();
    ///     getter(move |descriptor, args| {
    ///         println!("resolving {name}");
    ///         next(descriptor, args)
    ///     })
    /// });
    /// assert_eq!(pipe.len(), 1);
    /// ```
    pub fn add_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&ServiceDescriptor, &ServiceProvider, ValueGetter, &ServiceArgs) -> ValueGetter
            + Send
            + Sync
            + 'static,
    {
        self.add(middleware)
    }

    /// Appends any [`Middleware`] implementation.
    pub fn add(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Number of middleware in the pipe.
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns true if no middleware is installed.
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Folds the middleware, in registration order, around `get_value`.
    pub fn use_pipe(
        &self,
        descriptor: &ServiceDescriptor,
        provider: &ServiceProvider,
        get_value: ValueGetter,
        args: &ServiceArgs,
    ) -> ValueGetter {
        if !self.middleware.is_empty() {
            trace!(
                service = descriptor.name(),
                middleware = self.middleware.len(),
                "Composing middleware"
            );
        }

        self.middleware
            .iter()
            .fold(get_value, |next, middleware| {
                middleware.wrap(descriptor, provider, next, args)
            })
    }
}

impl fmt::Debug for MiddlewarePipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewarePipe")
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
