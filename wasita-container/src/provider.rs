//! # The provider: heart of Wasita
//!
//! A [`ServiceProvider`] resolves tokens against a collection, runs every
//! construction through the middleware pipe and caches values according
//! to their lifetime. Providers form a chain: a scope is a provider with
//! a parent.
//!
//! # Architecture
//! ```text
//! ServiceCollection ──get_provider()──> ServiceProvider (root)
//!                                              │
//!                                        create_scope()
//!                                              │
//!                                              ▼
//!                                       ServiceProvider (scope)
//! ```
//!
//! # Resolution
//! 1. A value already in this provider's cache is returned as-is.
//! 2. A token with no local descriptor is delegated to the parent, or
//!    fails with `DescriptorNotFound` at the root.
//! 3. Singletons are delegated up to the root-most ancestor that can see
//!    them, through a descriptor or a value already in its cache.
//! 4. The base getter is wrapped by the middleware pipe and called.
//!    Scoped values need a parent and are cached here, singletons are
//!    cached here, transients are never cached.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, instrument, trace};

use crate::collection::ServiceCollection;
use crate::descriptor::{ServiceArgs, ServiceDescriptor, ServiceValue};
use crate::error::{DescriptorNotFoundError, Result, WasitaError};
use crate::guard::ResolutionGuard;
use crate::lifetime::Lifetime;
use crate::middleware::{MiddlewarePipe, ValueGetter, getter};
use crate::token::{Token, TokenId, TokenKey};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// A resolution context: collection, middleware, cache and optional parent.
///
/// Cloning is cheap and yields a handle to the same provider, sharing
/// its cache.
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    id: u64,
    collection: Arc<ServiceCollection>,
    pipe: Arc<MiddlewarePipe>,
    cache: Mutex<HashMap<TokenId, ServiceValue>>,
    parent: Option<ServiceProvider>,
    depth: usize,
}

impl ServiceProvider {
    pub(crate) fn root(collection: Arc<ServiceCollection>, pipe: Arc<MiddlewarePipe>) -> Self {
        Self::build(collection, pipe, None)
    }

    fn build(
        collection: Arc<ServiceCollection>,
        pipe: Arc<MiddlewarePipe>,
        parent: Option<ServiceProvider>,
    ) -> Self {
        let id = NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed);
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);

        debug!(
            provider = id,
            depth,
            registered = collection.len(),
            middleware = pipe.len(),
            "Created provider"
        );

        Self {
            inner: Arc::new(ProviderInner {
                id,
                collection,
                pipe,
                cache: Mutex::new(HashMap::new()),
                parent,
                depth,
            }),
        }
    }

    /// Resolves an argument-less token.
    ///
    /// ```
    /// use wasita_container::prelude::*;
    ///
    /// let token: Token<u32> = Token::named("answer");
    /// let mut services = ServiceCollection::new();
    /// services.add_object(&token, 42u32, Lifetime::Transient);
    ///
    /// let provider = services.get_provider();
    /// assert_eq!(*provider.get_service(&token).unwrap(), 42);
    /// ```
    pub fn get_service<T>(&self, token: &Token<T, ()>) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_service_with(token, ())
    }

    /// Resolves a token, passing `args` to its factory or constructor.
    pub fn get_service_with<T, A>(&self, token: &Token<T, A>, args: A) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
    {
        let args: ServiceArgs = Arc::new(args);
        let value = self.get_service_raw(token.key(), &args)?;

        value.downcast::<T>().map_err(|_| WasitaError::TypeMismatch {
            token: token.key().clone(),
            expected: type_name::<T>(),
        })
    }

    /// Resolves a token without static types.
    pub fn get_service_raw(&self, token: &TokenKey, args: &ServiceArgs) -> Result<ServiceValue> {
        if let Some(value) = self.cached(token.id()) {
            trace!(provider = self.inner.id, token = %token, "Cache hit");
            return Ok(value);
        }

        let Some(descriptor) = self.inner.collection.descriptor(token) else {
            return match &self.inner.parent {
                Some(parent) => {
                    trace!(provider = self.inner.id, token = %token, "Not registered here, asking parent");
                    parent.get_service_raw(token, args)
                }
                None => {
                    debug!(token = %token, "Service descriptor not found");
                    Err(WasitaError::DescriptorNotFound(DescriptorNotFoundError {
                        requested: token.clone(),
                        suggestions: self.inner.collection.suggestions_for(token),
                    }))
                }
            };
        };

        if descriptor.lifetime().is_singleton() {
            if let Some(parent) = self.inner.parent.as_ref().filter(|p| p.can_see(token)) {
                trace!(provider = self.inner.id, token = %token, "Singleton, deferring to parent");
                return parent.get_service_raw(token, args);
            }
        }

        let get_value = self
            .inner
            .pipe
            .use_pipe(&descriptor, self, self.base_getter(), args);

        match descriptor.lifetime() {
            Lifetime::Scoped => {
                if self.inner.parent.is_none() {
                    return Err(WasitaError::ScopeNotProvided {
                        token: token.clone(),
                    });
                }
                let value = self.construct(&descriptor, &get_value, args)?;
                Ok(self.store(token, value))
            }
            Lifetime::Singleton => {
                let value = self.construct(&descriptor, &get_value, args)?;
                Ok(self.store(token, value))
            }
            Lifetime::Transient => self.construct(&descriptor, &get_value, args),
        }
    }

    /// Force-sets the cached value for `token` on this provider.
    ///
    /// The descriptor is bypassed entirely; later resolutions of `token`
    /// on this provider return `value`.
    pub fn resolve_service<T, A>(&self, token: &Token<T, A>, value: impl Into<Arc<T>>) -> &Self
    where
        T: Send + Sync + 'static,
    {
        let value: Arc<T> = value.into();
        debug!(provider = self.inner.id, token = %token, "Attached external value");
        self.inner.cache.lock().insert(token.id(), value);
        self
    }

    /// Creates a child scope sharing this provider's collection and pipe.
    pub fn create_scope(&self) -> ServiceProvider {
        self.create_scope_with(None, None)
    }

    /// Creates a child scope, optionally swapping the collection or pipe.
    ///
    /// Singletons still resolve through the ancestors that can see them.
    #[instrument(skip_all, name = "create_scope", fields(parent = self.inner.id))]
    pub fn create_scope_with(
        &self,
        collection: Option<&ServiceCollection>,
        pipe: Option<MiddlewarePipe>,
    ) -> ServiceProvider {
        let collection = match collection {
            Some(collection) => Arc::new(collection.clone()),
            None => self.inner.collection.clone(),
        };
        let pipe = match pipe {
            Some(pipe) => Arc::new(pipe),
            None => self.inner.pipe.clone(),
        };
        Self::build(collection, pipe, Some(self.clone()))
    }

    /// Returns the parent provider, if this is a scope.
    pub fn parent(&self) -> Option<&ServiceProvider> {
        self.inner.parent.as_ref()
    }

    /// Returns true if this provider has a parent.
    pub fn is_scope(&self) -> bool {
        self.inner.parent.is_some()
    }

    /// Number of ancestors; 0 for a root provider.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Returns the collection this provider resolves from.
    pub fn collection(&self) -> &ServiceCollection {
        &self.inner.collection
    }

    /// Returns true if this provider's own cache holds a value for `token`.
    pub fn is_resolved<T, A>(&self, token: &Token<T, A>) -> bool {
        self.inner.cache.lock().contains_key(&token.id())
    }

    /// Returns true if `self` and `other` are handles to the same provider.
    pub fn ptr_eq(&self, other: &ServiceProvider) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // A provider can see a token it has a descriptor for or already holds a
    // value for, directly or through an ancestor.
    fn can_see(&self, token: &TokenKey) -> bool {
        self.cached(token.id()).is_some()
            || self.inner.collection.descriptor(token).is_some()
            || self.inner.parent.as_ref().is_some_and(|p| p.can_see(token))
    }

    fn cached(&self, id: TokenId) -> Option<ServiceValue> {
        self.inner.cache.lock().get(&id).cloned()
    }

    // The first value stored wins, so every caller shares one instance.
    fn store(&self, token: &TokenKey, value: ServiceValue) -> ServiceValue {
        debug!(provider = self.inner.id, token = %token, "Cached value");
        self.inner
            .cache
            .lock()
            .entry(token.id())
            .or_insert(value)
            .clone()
    }

    fn construct(
        &self,
        descriptor: &ServiceDescriptor,
        get_value: &ValueGetter,
        args: &ServiceArgs,
    ) -> Result<ServiceValue> {
        let _guard = ResolutionGuard::enter(
            self.inner.id,
            Arc::as_ptr(&self.inner.collection) as usize,
            descriptor.token(),
            self.inner.collection.settings(),
        )?;
        trace!(
            provider = self.inner.id,
            service = descriptor.name(),
            lifetime = %descriptor.lifetime(),
            "Constructing"
        );
        get_value(descriptor, args)
    }

    fn base_getter(&self) -> ValueGetter {
        let provider = self.clone();
        getter(move |descriptor, args| descriptor.produce(&provider, args))
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("id", &self.inner.id)
            .field("depth", &self.inner.depth)
            .field("registered", &self.inner.collection.len())
            .field("cached", &self.inner.cache.lock().len())
            .finish()
    }
}
