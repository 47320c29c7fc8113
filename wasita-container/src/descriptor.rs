//! Service descriptors: a token bound to an implementation and a lifetime.
//!
//! An implementation is one of three kinds:
//! - an object, handed out as-is
//! - a function `(provider, args) -> value`
//! - a class, a type implementing [`Constructible`] whose fields may be
//!   filled from the provider after construction (see [`crate::injection`])

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use wasita_support::rendering::shorten_type_name;

use crate::error::{Result, WasitaError};
use crate::injection::construct_injected;
use crate::lifetime::Lifetime;
use crate::provider::ServiceProvider;
use crate::token::{Token, TokenKey};

/// A resolved, type-erased service value.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Type-erased call-time arguments.
pub type ServiceArgs = Arc<dyn Any + Send + Sync>;

/// Type-erased factory shared by function and class implementations.
pub type FactoryFn =
    Arc<dyn Fn(&ServiceProvider, &ServiceArgs) -> Result<ServiceValue> + Send + Sync>;

/// Which kind of implementation a descriptor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructorKind {
    Object,
    Function,
    Class,
}

impl fmt::Display for ConstructorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorKind::Object => write!(f, "object"),
            ConstructorKind::Function => write!(f, "function"),
            ConstructorKind::Class => write!(f, "class"),
        }
    }
}

/// The payload of a descriptor, tagged by [`ConstructorKind`].
#[derive(Clone)]
pub enum Implementation {
    Object(ServiceValue),
    Function(FactoryFn),
    Class(FactoryFn),
}

impl Implementation {
    /// Returns the tag of this implementation.
    pub fn kind(&self) -> ConstructorKind {
        match self {
            Implementation::Object(_) => ConstructorKind::Object,
            Implementation::Function(_) => ConstructorKind::Function,
            Implementation::Class(_) => ConstructorKind::Class,
        }
    }
}

/// A type the container can construct, the counterpart of a class
/// constructor taking `(provider, args)`.
///
/// Fields registered with [`crate::injection::injector`] are assigned
/// after `construct` returns.
///
/// # Examples
/// ```
/// use wasita_container::prelude::*;
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Constructible for Greeter {
///     type Args = String;
///
///     fn construct(_provider: &ServiceProvider, name: &String) -> Result<Self> {
///         Ok(Greeter { greeting: format!("hello, {name}") })
///     }
/// }
///
/// let token: Token<Greeter, String> = Token::named("greeter");
/// let mut services = ServiceCollection::new();
/// services.add_class(&token, Lifetime::Transient);
///
/// let provider = services.get_provider();
/// let greeter = provider.get_service_with(&token, "ada".to_string()).unwrap();
/// assert_eq!(greeter.greeting, "hello, ada");
/// ```
pub trait Constructible: Sized + Send + Sync + 'static {
    /// Arguments passed at resolution time.
    type Args: Send + Sync + 'static;

    /// Builds a new instance.
    fn construct(provider: &ServiceProvider, args: &Self::Args) -> Result<Self>;
}

/// Registration record for a single token.
///
/// Created by [`crate::collection::ServiceCollection`]'s `add_*` methods
/// or by the constructors below, immutable afterwards.
#[derive(Clone)]
pub struct ServiceDescriptor {
    token: TokenKey,
    implementation: Implementation,
    lifetime: Lifetime,
    name: Arc<str>,
    value_type: &'static str,
}

impl ServiceDescriptor {
    /// Binds `token` to a ready-made value.
    pub fn object<T, A>(token: &Token<T, A>, value: T, lifetime: Lifetime) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::build(
            token.key(),
            Implementation::Object(Arc::new(value)),
            lifetime,
            type_name::<T>(),
            type_name::<T>(),
        )
    }

    /// Binds `token` to a factory called with the resolving provider and
    /// the call arguments.
    pub fn function<T, A, F>(token: &Token<T, A>, factory: F, lifetime: Lifetime) -> Self
    where
        T: Send + Sync + 'static,
        A: Send + Sync + 'static,
        F: Fn(&ServiceProvider, &A) -> Result<T> + Send + Sync + 'static,
    {
        let key = token.key().clone();
        let erased: FactoryFn = Arc::new(move |provider: &ServiceProvider, args: &ServiceArgs| {
            let args = downcast_args::<A>(&key, args)?;
            let value = factory(provider, args)?;
            Ok(Arc::new(value) as ServiceValue)
        });

        Self::build(
            token.key(),
            Implementation::Function(erased),
            lifetime,
            type_name::<F>(),
            type_name::<T>(),
        )
    }

    /// Binds `token` to the constructible type `C`.
    pub fn class<C>(token: &Token<C, C::Args>, lifetime: Lifetime) -> Self
    where
        C: Constructible,
    {
        let key = token.key().clone();
        let erased: FactoryFn = Arc::new(move |provider: &ServiceProvider, args: &ServiceArgs| {
            let args = downcast_args::<C::Args>(&key, args)?;
            let instance = construct_injected::<C>(provider, args)?;
            Ok(Arc::new(instance) as ServiceValue)
        });

        Self::build(
            token.key(),
            Implementation::Class(erased),
            lifetime,
            type_name::<C>(),
            type_name::<C>(),
        )
    }

    fn build(
        token: &TokenKey,
        implementation: Implementation,
        lifetime: Lifetime,
        implementation_name: &'static str,
        value_type: &'static str,
    ) -> Self {
        let name: Arc<str> = match token.name() {
            Some(name) => name.into(),
            None => shorten_type_name(implementation_name).into(),
        };

        Self {
            token: token.clone(),
            implementation,
            lifetime,
            name,
            value_type,
        }
    }

    /// Returns the token this descriptor is registered under.
    #[inline]
    pub fn token(&self) -> &TokenKey {
        &self.token
    }

    /// Returns the lifetime.
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns which kind of implementation is stored.
    #[inline]
    pub fn constructor_kind(&self) -> ConstructorKind {
        self.implementation.kind()
    }

    /// Returns the stored implementation.
    #[inline]
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Display name: the token's name, or the implementation's when unnamed.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full type name of the value this descriptor produces.
    #[inline]
    pub fn value_type_name(&self) -> &'static str {
        self.value_type
    }

    /// Produces a value without consulting any cache or middleware.
    pub(crate) fn produce(
        &self,
        provider: &ServiceProvider,
        args: &ServiceArgs,
    ) -> Result<ServiceValue> {
        match &self.implementation {
            Implementation::Object(value) => Ok(value.clone()),
            Implementation::Function(factory) | Implementation::Class(factory) => {
                factory(provider, args)
            }
        }
    }
}

fn downcast_args<'a, A: 'static>(token: &TokenKey, args: &'a ServiceArgs) -> Result<&'a A> {
    args.downcast_ref::<A>().ok_or_else(|| WasitaError::TypeMismatch {
        token: token.clone(),
        expected: type_name::<A>(),
    })
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("kind", &self.constructor_kind())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    fn make_database(_: &ServiceProvider, _: &()) -> Result<Database> {
        Ok(Database)
    }

    #[test]
    fn named_token_wins_over_implementation_name() {
        let token: Token<Database> = Token::named("primary_db");
        let descriptor = ServiceDescriptor::function(&token, make_database, Lifetime::Singleton);
        assert_eq!(descriptor.name(), "primary_db");
    }

    #[test]
    fn unnamed_token_takes_function_name() {
        let token: Token<Database> = Token::new();
        let descriptor = ServiceDescriptor::function(&token, make_database, Lifetime::Singleton);
        assert_eq!(descriptor.name(), "make_database");
        assert_eq!(descriptor.constructor_kind(), ConstructorKind::Function);
    }

    #[test]
    fn unnamed_object_takes_value_type_name() {
        let token: Token<Database> = Token::new();
        let descriptor = ServiceDescriptor::object(&token, Database, Lifetime::Transient);
        assert_eq!(descriptor.name(), "Database");
        assert_eq!(descriptor.constructor_kind(), ConstructorKind::Object);
        assert!(descriptor.value_type_name().ends_with("Database"));
    }

    #[test]
    fn descriptor_keeps_token_identity() {
        let token: Token<u32> = Token::new();
        let descriptor = ServiceDescriptor::object(&token, 7u32, Lifetime::Scoped);
        assert_eq!(descriptor.token(), token.key());
        assert_eq!(descriptor.lifetime(), Lifetime::Scoped);
    }

    #[test]
    fn debug_shows_kind_and_lifetime() {
        let token: Token<u32> = Token::named("answer");
        let descriptor = ServiceDescriptor::object(&token, 42u32, Lifetime::Singleton);
        let debug = format!("{descriptor:?}");
        assert!(debug.contains("Object"));
        assert!(debug.contains("Singleton"));
        assert!(debug.contains("answer"));
    }
}
