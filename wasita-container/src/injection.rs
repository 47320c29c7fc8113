//! Field injection for constructible types.
//!
//! [`injector`] is the registration step: it appends `(field, token)` to
//! the injection list of a target type. [`construct_injected`] is the
//! factory that consumes it: it runs [`Constructible::construct`] first,
//! then resolves every listed token from the same provider and assigns
//! the results, in registration order.
//!
//! Lists are per type and process-wide. Register before the first
//! instance is built; instances built earlier are not revisited.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use wasita_container::prelude::*;
//!
//! struct Mailer {
//!     sender: Option<Arc<String>>,
//! }
//!
//! impl Constructible for Mailer {
//!     type Args = ();
//!
//!     fn construct(_: &ServiceProvider, _: &()) -> Result<Self> {
//!         Ok(Mailer { sender: None })
//!     }
//! }
//!
//! let sender: Token<String> = Token::named("sender");
//! injector(&sender).field::<Mailer>("sender", |mailer, value| mailer.sender = Some(value));
//!
//! let mailer: Token<Mailer> = Token::named("mailer");
//! let mut services = ServiceCollection::new();
//! services
//!     .add_object(&sender, "noreply@example.com".to_string(), Lifetime::Singleton)
//!     .add_class(&mailer, Lifetime::Transient);
//!
//! let provider = services.get_provider();
//! let built = provider.get_service(&mailer).unwrap();
//! assert_eq!(built.sender.as_deref().map(String::as_str), Some("noreply@example.com"));
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::descriptor::{Constructible, ServiceArgs};
use crate::error::{Result, WasitaError};
use crate::provider::ServiceProvider;
use crate::token::{Token, TokenKey};

static INJECTIONS: Lazy<DashMap<TypeId, Box<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

type AssignFn<C> = Arc<dyn Fn(&mut C, &ServiceProvider) -> Result<()> + Send + Sync>;

/// One `(field, token)` entry of an injection list.
pub struct FieldInjection<C> {
    key: &'static str,
    token: TokenKey,
    assign: AssignFn<C>,
}

impl<C> FieldInjection<C> {
    /// Name of the injected field.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Token the field is resolved from.
    pub fn token(&self) -> &TokenKey {
        &self.token
    }
}

impl<C> Clone for FieldInjection<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            token: self.token.clone(),
            assign: self.assign.clone(),
        }
    }
}

impl<C> fmt::Debug for FieldInjection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInjection")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}

/// Ordered injection entries for the type `C`.
pub struct InjectionList<C> {
    fields: Vec<FieldInjection<C>>,
}

impl<C: Send + Sync + 'static> InjectionList<C> {
    /// Snapshot of the entries currently registered for `C`.
    pub fn current() -> Self {
        INJECTIONS
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.value().downcast_ref::<InjectionList<C>>().cloned())
            .unwrap_or_default()
    }

    /// Iterates over the entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldInjection<C>> {
        self.fields.iter()
    }

    /// Number of injected fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is injected.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn append(entry: FieldInjection<C>) {
        let mut slot = INJECTIONS
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(InjectionList::<C>::default()));

        if let Some(list) = slot.value_mut().downcast_mut::<InjectionList<C>>() {
            list.fields.push(entry);
        }
    }
}

impl<C> Default for InjectionList<C> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<C> Clone for InjectionList<C> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<C> fmt::Debug for InjectionList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

/// Registers fields to be filled from `token`.
pub struct Injector<'a, T> {
    token: &'a Token<T>,
}

/// Starts a field registration for `token`.
pub fn injector<T>(token: &Token<T>) -> Injector<'_, T>
where
    T: Send + Sync + 'static,
{
    Injector { token }
}

impl<'a, T> Injector<'a, T>
where
    T: Send + Sync + 'static,
{
    /// Appends `(key, token)` to `C`'s injection list; `assign` stores the
    /// resolved value on a freshly constructed instance.
    pub fn field<C>(self, key: &'static str, assign: impl Fn(&mut C, Arc<T>) + Send + Sync + 'static) -> Self
    where
        C: Send + Sync + 'static,
    {
        let token = self.token.key().clone();
        debug!(target_type = type_name::<C>(), field = key, token = %token, "Registered field injection");

        let resolve_key = token.clone();
        let assign: AssignFn<C> = Arc::new(move |instance: &mut C, provider: &ServiceProvider| {
            let args: ServiceArgs = Arc::new(());
            let value = provider
                .get_service_raw(&resolve_key, &args)?
                .downcast::<T>()
                .map_err(|_| WasitaError::TypeMismatch {
                    token: resolve_key.clone(),
                    expected: type_name::<T>(),
                })?;
            assign(instance, value);
            Ok(())
        });

        InjectionList::<C>::append(FieldInjection { key, token, assign });
        self
    }
}

/// Constructs `C`, then assigns its injected fields from `provider`.
pub fn construct_injected<C>(provider: &ServiceProvider, args: &C::Args) -> Result<C>
where
    C: Constructible,
{
    let mut instance = C::construct(provider, args)?;

    // Snapshot first: resolving a field may construct another `C`.
    let injections = InjectionList::<C>::current();
    for field in injections.iter() {
        trace!(target_type = type_name::<C>(), field = field.key, token = %field.token, "Injecting field");
        (field.assign)(&mut instance, provider)?;
    }

    Ok(instance)
}
