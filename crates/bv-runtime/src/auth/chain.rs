//! Identity source chain
//!
//! Combines identity sources into a priority-ordered chain. Sources are
//! tried in the order they were added:
//!
//! - `Ok(Some(ctx))` wins immediately
//! - `Ok(None)` means the source has nothing to offer; try the next one
//! - `Err(e)` stops the chain and is returned to the caller
//!
//! Non-authoritative sources (the runner store) downgrade their own
//! failures to `Ok(None)`, so only the authoritative fallback can fail the
//! resolution.

use std::fmt;

use super::context::AuthContext;
use super::credentials::CredentialFile;
use super::runner::RunnerStore;
use crate::env::RuntimeEnv;
use crate::error::{AuthError, AuthResult};

/// A strategy that may produce an execution identity
pub trait IdentitySource: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn resolve(&self) -> AuthResult<Option<AuthContext>>;
}

/// Ordered list of identity sources; first non-empty result wins
#[derive(Default)]
pub struct SourceChain {
    sources: Vec<Box<dyn IdentitySource>>,
}

impl fmt::Debug for SourceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceChain")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl SourceChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner store first, then the developer credential file
    pub fn for_env(env: &RuntimeEnv) -> Self {
        Self::new()
            .with_source(RunnerStore::for_env(env))
            .with_source(CredentialFile::for_env(env))
    }

    /// Add a source (builder pattern); earlier sources take priority
    pub fn with_source<S: IdentitySource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of configured sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in resolution order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Return the first identity produced, or `NotAuthenticated` if none is
    ///
    /// An error from a source stops the chain; later sources are not tried.
    pub fn resolve(&self) -> AuthResult<AuthContext> {
        for source in &self.sources {
            match source.resolve() {
                Ok(Some(ctx)) => {
                    tracing::debug!(source = source.name(), "Resolved execution identity");
                    return Ok(ctx);
                }
                Ok(None) => {
                    tracing::trace!(source = source.name(), "Source has no identity, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::NotAuthenticated)
    }
}
