//! Provider-bearing objects.
//!
//! Anything that can hand out a [`ServiceProvider`] can be used to resolve
//! tokens, which lets an application object carry its provider around:
//!
//! ```
//! use wasita_container::prelude::*;
//!
//! struct Store {
//!     name: &'static str,
//! }
//!
//! let greeting: Token<String> = Token::named("greeting");
//! let mut services = ServiceCollection::new();
//! services.add_object(&greeting, "hi".to_string(), Lifetime::Singleton);
//!
//! let store = attach_provider(Store { name: "main" }, services.get_provider());
//! assert_eq!(store.name, "main");
//! assert_eq!(*greeting.get(&store).unwrap(), "hi");
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::provider::ServiceProvider;

/// A value services can be resolved through.
pub trait ProviderHost {
    fn service_provider(&self) -> &ServiceProvider;
}

impl ProviderHost for ServiceProvider {
    fn service_provider(&self) -> &ServiceProvider {
        self
    }
}

impl<H: ProviderHost + ?Sized> ProviderHost for &H {
    fn service_provider(&self) -> &ServiceProvider {
        (**self).service_provider()
    }
}

/// A value paired with the provider that serves it.
pub struct Hosted<T> {
    value: T,
    provider: ServiceProvider,
}

/// Pairs `value` with `provider`.
pub fn attach_provider<T>(value: T, provider: ServiceProvider) -> Hosted<T> {
    Hosted { value, provider }
}

impl<T> Hosted<T> {
    /// Returns the wrapped value, dropping the provider handle.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Splits into the value and its provider.
    pub fn into_parts(self) -> (T, ServiceProvider) {
        (self.value, self.provider)
    }
}

impl<T> ProviderHost for Hosted<T> {
    fn service_provider(&self) -> &ServiceProvider {
        &self.provider
    }
}

impl<T> Deref for Hosted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Hosted<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Hosted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hosted")
            .field("value", &self.value)
            .field("provider", &self.provider)
            .finish()
    }
}
