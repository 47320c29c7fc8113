//! Descriptor registry: the set of registrations providers resolve from.
//!
//! A [`ServiceCollection`] maps tokens to [`ServiceDescriptor`]s. The last
//! registration for a token wins. Building a provider snapshots the
//! collection, so registrations made afterwards only show up in providers
//! created later.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use wasita_container::prelude::*;
//!
//! let config: Arc<Token<String>> = Arc::new(Token::named("config"));
//! let counter: Token<usize> = Token::named("counter");
//!
//! let mut services = ServiceCollection::new();
//! services
//!     .add_object(&config, "postgres://localhost".to_string(), Lifetime::Singleton)
//!     .add_function(
//!         &counter,
//!         {
//!             let config = config.clone();
//!             move |provider, _| Ok(config.get(provider)?.len())
//!         },
//!         Lifetime::Transient,
//!     );
//!
//! assert!(services.has(&config));
//! let provider = services.get_provider();
//! assert_eq!(*counter.get(&provider).unwrap(), 20);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use wasita_support::rendering::suggest_similar;

use crate::descriptor::{Constructible, ServiceDescriptor};
use crate::lifetime::Lifetime;
use crate::middleware::MiddlewarePipe;
use crate::provider::ServiceProvider;
use crate::settings::ContainerSettings;
use crate::token::{Token, TokenId, TokenKey};

/// Mapping of tokens to descriptors.
#[derive(Clone, Default)]
pub struct ServiceCollection {
    descriptors: HashMap<TokenId, Arc<ServiceDescriptor>>,
    settings: ContainerSettings,
}

impl ServiceCollection {
    /// Creates an empty collection with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the settings captured by providers built from here on.
    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Stores a descriptor, replacing any previous one for the same token.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        let id = descriptor.token().id();
        debug!(
            service = descriptor.name(),
            token = %id,
            kind = %descriptor.constructor_kind(),
            lifetime = %descriptor.lifetime(),
            "Registered service"
        );

        if self.descriptors.insert(id, Arc::new(descriptor)).is_some() {
            debug!(token = %id, "Replaced previous registration");
        }
        self
    }

    /// Registers a ready-made value.
    pub fn add_object<T, A>(&mut self, token: &Token<T, A>, value: T, lifetime: Lifetime) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::object(token, value, lifetime))
    }

    /// Registers a factory function.
    pub fn add_function<T, A, F>(
        &mut self,
        token: &Token<T, A>,
        factory: F,
        lifetime: Lifetime,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
        F: Fn(&ServiceProvider, &A) -> crate::error::Result<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::function(token, factory, lifetime))
    }

    /// Registers a constructible type.
    pub fn add_class<C>(&mut self, token: &Token<C, C::Args>, lifetime: Lifetime) -> &mut Self
    where
        C: Constructible,
    {
        self.add(ServiceDescriptor::class(token, lifetime))
    }

    /// Returns true if `token` has a descriptor in this collection.
    pub fn has<T, A>(&self, token: &Token<T, A>) -> bool {
        self.descriptors.contains_key(&token.id())
    }

    /// Returns the descriptor for `token`, if registered here.
    pub fn get<T, A>(&self, token: &Token<T, A>) -> Option<&ServiceDescriptor> {
        self.descriptors.get(&token.id()).map(Arc::as_ref)
    }

    pub(crate) fn descriptor(&self, key: &TokenKey) -> Option<Arc<ServiceDescriptor>> {
        self.descriptors.get(&key.id()).cloned()
    }

    /// Iterates over all descriptors, in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.values().map(Arc::as_ref)
    }

    /// Returns the number of registered tokens.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Builds a root provider with an empty middleware pipe.
    pub fn get_provider(&self) -> ServiceProvider {
        self.get_provider_with(|_| {})
    }

    /// Builds a root provider, letting `setup` install middleware first.
    ///
    /// The pipe is frozen once `setup` returns.
    pub fn get_provider_with(&self, setup: impl FnOnce(&mut MiddlewarePipe)) -> ServiceProvider {
        let mut pipe = MiddlewarePipe::new();
        setup(&mut pipe);
        ServiceProvider::root(Arc::new(self.clone()), Arc::new(pipe))
    }

    /// Registered names resembling the requested token's name.
    pub(crate) fn suggestions_for(&self, requested: &TokenKey) -> Vec<String> {
        let Some(name) = requested.name() else {
            return Vec::new();
        };
        let available: Vec<&str> = self.descriptors.values().map(|d| d.name()).collect();
        suggest_similar(name, &available, self.settings.suggestions)
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registered", &self.descriptors.len())
            .field("settings", &self.settings)
            .finish()
    }
}
