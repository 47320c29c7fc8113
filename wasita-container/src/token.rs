//! Service identity tokens.
//!
//! A [`Token`] is the key a service is registered and resolved under.
//! Identity is the token itself: two tokens are only equal when they are
//! the same token, no matter their names or types.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::host::ProviderHost;

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u64);

impl TokenId {
    fn next() -> Self {
        Self(NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Untyped view of a token: its identity plus its display name.
///
/// This is what descriptors, caches and errors carry around.
#[derive(Clone)]
pub struct TokenKey {
    id: TokenId,
    name: Option<Arc<str>>,
}

impl TokenKey {
    /// Returns the token identity.
    #[inline]
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Returns the name the token was created with, if any.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// Equality is identity only: the name is diagnostics.
impl PartialEq for TokenKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TokenKey {}

impl Hash for TokenKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Token({}, name={:?})", self.id, name),
            None => write!(f, "Token({})", self.id),
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "token {}", self.id),
        }
    }
}

/// Identifies a service resolving to `T`, called with arguments `A`.
///
/// Tokens are deliberately not `Clone`: create one, keep it somewhere
/// shared (a `static`, a field, an `Arc`) and pass it by reference to
/// both registration and resolution.
///
/// `T` is the stored value type. Trait services are registered as
/// `Token<Box<dyn Trait>>` and resolve to `Arc<Box<dyn Trait>>`.
///
/// # Examples
/// ```
/// use wasita_container::token::Token;
///
/// let port: Token<u16> = Token::named("port");
/// let other: Token<u16> = Token::named("port");
///
/// // Same name and type, still two different services.
/// assert_ne!(port.key(), other.key());
/// assert_eq!(port.name(), Some("port"));
/// ```
pub struct Token<T, A = ()> {
    key: TokenKey,
    _marker: PhantomData<fn(A) -> Arc<T>>,
}

impl<T, A> Token<T, A> {
    /// Creates an unnamed token.
    ///
    /// Descriptors registered under it take the implementation's name.
    pub fn new() -> Self {
        Self::with_name(None)
    }

    /// Creates a token with a display name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::with_name(Some(name.into()))
    }

    fn with_name(name: Option<Arc<str>>) -> Self {
        Self {
            key: TokenKey { id: TokenId::next(), name },
            _marker: PhantomData,
        }
    }

    /// Returns the identity of this token.
    #[inline]
    pub fn id(&self) -> TokenId {
        self.key.id
    }

    /// Returns the untyped key used by collections and caches.
    #[inline]
    pub fn key(&self) -> &TokenKey {
        &self.key
    }

    /// Returns the display name, if the token was created with one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.key.name()
    }
}

impl<T, A> Token<T, A>
where
    T: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Resolves this token through a provider or a provider-bearing object.
    pub fn get_with(&self, host: &impl ProviderHost, args: A) -> Result<Arc<T>> {
        host.service_provider().get_service_with(self, args)
    }
}

impl<T: Send + Sync + 'static> Token<T, ()> {
    /// Resolves this argument-less token through `host`.
    ///
    /// ```
    /// use wasita_container::prelude::*;
    ///
    /// let greeting: Token<String> = Token::named("greeting");
    /// let mut services = ServiceCollection::new();
    /// services.add_object(&greeting, "hello".to_string(), Lifetime::Singleton);
    ///
    /// let provider = services.get_provider();
    /// assert_eq!(*greeting.get(&provider).unwrap(), "hello");
    /// ```
    pub fn get(&self, host: &impl ProviderHost) -> Result<Arc<T>> {
        self.get_with(host, ())
    }
}

impl<T, A> Default for Token<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> fmt::Debug for Token<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.key, f)
    }
}

impl<T, A> fmt::Display for Token<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key, f)
    }
}

/// Creates a token, named when `name` is given.
pub fn create_token<T, A>(name: Option<&str>) -> Token<T, A> {
    match name {
        Some(name) => Token::named(name),
        None => Token::new(),
    }
}
