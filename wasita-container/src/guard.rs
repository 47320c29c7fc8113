//! Resolution-in-progress tracking.
//!
//! Every construction pushes a frame `(provider, token)` onto a
//! thread-local stack and pops it when done. Seeing the same frame twice
//! means a factory asked, directly or through others, for the value it is
//! building. Without this check such a registration recurses until the
//! stack overflows.
//!
//! An optional depth limit caps how many frames of one collection
//! snapshot may be in flight at once. It is off unless configured.

use std::cell::RefCell;

use tracing::warn;

use crate::error::{CircularDependencyError, DepthLimitError, Result, WasitaError};
use crate::settings::ContainerSettings;
use crate::token::TokenKey;

thread_local! {
    static IN_FLIGHT: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    provider: u64,
    origin: usize,
    token: TokenKey,
}

/// Marks a token as being built on a provider until dropped.
pub(crate) struct ResolutionGuard {
    active: bool,
}

impl ResolutionGuard {
    /// Pushes a frame, or fails if it would close a cycle or exceed the
    /// depth limit.
    ///
    /// `origin` identifies the collection snapshot whose settings apply;
    /// only frames with the same origin count towards its depth limit.
    pub(crate) fn enter(
        provider: u64,
        origin: usize,
        token: &TokenKey,
        settings: &ContainerSettings,
    ) -> Result<Self> {
        if !settings.detect_cycles && settings.max_depth.is_none() {
            return Ok(Self { active: false });
        }

        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();

            if settings.detect_cycles {
                if let Some(start) = stack
                    .iter()
                    .position(|frame| frame.provider == provider && frame.token == *token)
                {
                    let mut chain: Vec<TokenKey> =
                        stack[start..].iter().map(|frame| frame.token.clone()).collect();
                    chain.push(token.clone());

                    warn!(cycle = ?chain, "Circular dependency detected");
                    return Err(WasitaError::CircularDependency(CircularDependencyError { chain }));
                }
            }

            if let Some(limit) = settings.max_depth {
                let depth = stack.iter().filter(|frame| frame.origin == origin).count();
                if depth >= limit {
                    let mut chain: Vec<TokenKey> = stack
                        .iter()
                        .filter(|frame| frame.origin == origin)
                        .map(|frame| frame.token.clone())
                        .collect();
                    chain.push(token.clone());

                    warn!(depth, token = %token, "Resolution depth limit exceeded");
                    return Err(WasitaError::DepthLimitExceeded(DepthLimitError { limit, chain }));
                }
            }

            stack.push(Frame {
                provider,
                origin,
                token: token.clone(),
            });
            Ok(Self { active: true })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        if self.active {
            IN_FLIGHT.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
}
