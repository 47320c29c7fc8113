//! Service lifetimes.
//!
//! A lifetime decides where a resolved value is cached:
//! - [`Lifetime::Singleton`]: at the root-most provider that can see the descriptor
//! - [`Lifetime::Scoped`]: in the scope that resolved it
//! - [`Lifetime::Transient`]: nowhere, recomputed on every call
//!
//! # Ordering
//! Lifetimes are ordered by how long a cached value lives:
//! `Singleton > Scoped > Transient`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines how long a resolved value is reused.
///
/// # Examples
/// ```
/// use wasita_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton > Lifetime::Scoped);
/// assert!(Lifetime::Scoped > Lifetime::Transient);
/// assert_eq!(Lifetime::default(), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One value per provider chain.
    ///
    /// Always resolved on the root-most provider, so every scope
    /// below it shares the same instance.
    Singleton,

    /// One value per scope.
    ///
    /// Only resolvable on a provider that has a parent.
    Scoped,

    /// A new value on every resolution. Never cached.
    #[default]
    Transient,
}

impl Lifetime {
    /// Returns `true` if resolved values are kept in a provider cache.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }

    /// Returns `true` for [`Lifetime::Singleton`].
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }

    #[inline]
    fn rank(&self) -> u8 {
        match self {
            Lifetime::Singleton => 2,
            Lifetime::Scoped => 1,
            Lifetime::Transient => 0,
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}
