//! # Wasita — a small IoC container for Rust
//!
//! Register services against identity tokens in a [`ServiceCollection`],
//! build a [`ServiceProvider`], open scopes for units of work and wrap
//! construction in middleware.
//!
//! ```
//! use wasita::prelude::*;
//!
//! let greeting: Token<String> = Token::named("greeting");
//! let mut services = ServiceCollection::new();
//! services.add_object(&greeting, "hello".to_string(), Lifetime::Singleton);
//!
//! let provider = services.get_provider();
//! assert_eq!(*greeting.get(&provider).unwrap(), "hello");
//! ```

pub use wasita_container::*;
pub use wasita_support::*;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

const DEFAULT_FILTER: &str = "wasita=info,wasita_container=info";

/// Installs a global `fmt` subscriber for the container's logs.
///
/// `RUST_LOG` takes precedence over the default filter. Fails if a global
/// subscriber is already set.
pub fn init_logging() -> std::result::Result<(), TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
        .try_init()?;

    tracing::debug!(default_filter = DEFAULT_FILTER, "Logging initialized");
    Ok(())
}
