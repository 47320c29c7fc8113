//! Resolution engine for Wasita.
//!
//! Register services against [`Token`]s in a [`ServiceCollection`], build a
//! [`ServiceProvider`] from it and resolve through providers and their scopes.

pub mod collection;
pub mod descriptor;
pub mod error;
mod guard;
pub mod host;
pub mod injection;
pub mod lifetime;
pub mod middleware;
pub mod provider;
pub mod settings;
pub mod token;

pub use collection::ServiceCollection;
pub use descriptor::{Constructible, ConstructorKind, ServiceDescriptor};
pub use error::{Result, WasitaError};
pub use lifetime::Lifetime;
pub use middleware::MiddlewarePipe;
pub use provider::ServiceProvider;
pub use token::{Token, create_token};

pub mod prelude {
    pub use crate::collection::ServiceCollection;
    pub use crate::descriptor::{Constructible, ServiceDescriptor};
    pub use crate::error::{Result, WasitaError};
    pub use crate::host::{ProviderHost, attach_provider};
    pub use crate::injection::{construct_injected, injector};
    pub use crate::lifetime::Lifetime;
    pub use crate::middleware::{MiddlewarePipe, getter};
    pub use crate::provider::ServiceProvider;
    pub use crate::settings::ContainerSettings;
    pub use crate::token::{Token, create_token};
}
