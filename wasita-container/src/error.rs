//! Error types for container operations.
//!
//! Every error is fatal to the resolution that raised it. Nothing is
//! cached on failure, so a later call can succeed once the cause is fixed.

use std::fmt;

use wasita_support::rendering::render_chain;

use crate::token::TokenKey;

/// Main error type for all Wasita operations.
#[derive(Debug, thiserror::Error)]
pub enum WasitaError {
    /// No descriptor for the token anywhere in the provider chain.
    #[error("{}", .0)]
    DescriptorNotFound(DescriptorNotFoundError),

    /// A scoped service was requested from a provider with no parent.
    #[error("Scope not provided: {token} is Scoped and must be resolved from a scope")]
    ScopeNotProvided { token: TokenKey },

    /// The token is already being resolved further up the call stack.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Nested resolutions went deeper than the configured limit.
    #[error("{}", .0)]
    DepthLimitExceeded(DepthLimitError),

    /// A value or argument did not have the type its token declares.
    #[error("Type mismatch for {token}: expected {expected}")]
    TypeMismatch {
        token: TokenKey,
        expected: &'static str,
    },

    /// A factory or constructor reported a failure.
    #[error("Failed to construct {token}: {source}")]
    ConstructionFailed {
        token: TokenKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl WasitaError {
    /// Wraps an arbitrary error raised while building `token`.
    pub fn construction(
        token: &TokenKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        WasitaError::ConstructionFailed {
            token: token.clone(),
            source: source.into(),
        }
    }

    /// Returns the token the failure is about.
    pub fn token(&self) -> Option<&TokenKey> {
        match self {
            WasitaError::DescriptorNotFound(e) => Some(&e.requested),
            WasitaError::ScopeNotProvided { token }
            | WasitaError::TypeMismatch { token, .. }
            | WasitaError::ConstructionFailed { token, .. } => Some(token),
            WasitaError::CircularDependency(e) => e.chain.last(),
            WasitaError::DepthLimitExceeded(e) => e.chain.last(),
        }
    }
}

/// Error when a token has no descriptor reachable from the provider.
#[derive(Debug)]
pub struct DescriptorNotFoundError {
    /// The token that was requested
    pub requested: TokenKey,
    /// Registered descriptor names that look similar
    pub suggestions: Vec<String>,
}

impl fmt::Display for DescriptorNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service descriptor not found: {}", self.requested)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register it on this provider's collection or one of its parents"
        )
    }
}

/// Error when a resolution re-enters a token that is still being built.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Resolution chain ending with the repeated token, e.g. `[A, B, A]`.
    pub chain: Vec<TokenKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(ToString::to_string).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: break the cycle by resolving one side lazily inside the factory"
        )
    }
}

/// Error when nested resolutions exceed `ContainerSettings::max_depth`.
#[derive(Debug)]
pub struct DepthLimitError {
    /// The configured limit.
    pub limit: usize,
    /// Tokens in flight when the limit was hit, ending with the rejected one.
    pub chain: Vec<TokenKey>,
}

impl fmt::Display for DepthLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolution depth limit of {} exceeded", self.limit)?;
        if let Some(last) = self.chain.last() {
            write!(f, " while resolving {last}")?;
        }
        write!(f, "\n  Hint: raise or unset max_depth in the container settings")
    }
}

/// Convenient Result type for Wasita operations.
pub type Result<T> = std::result::Result<T, WasitaError>;
