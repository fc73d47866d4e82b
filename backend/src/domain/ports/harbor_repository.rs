//! Driven port for persisting harbors.

use async_trait::async_trait;

use crate::domain::{Harbor, Unloc};

/// Errors raised by harbor persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarborRepositoryError {
    /// Repository connection could not be established.
    #[error("harbor persistence connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("harbor persistence query failed: {message}")]
    Query { message: String },
}

impl HarborRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for writing and reading harbors keyed by their code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HarborRepository: Send + Sync {
    /// Insert the harbor or overwrite every field of the existing row with
    /// the same code.
    async fn upsert_harbor(&self, harbor: &Harbor) -> Result<(), HarborRepositoryError>;

    /// Load the harbor stored under `unloc`.
    async fn find_by_unloc(&self, unloc: &Unloc) -> Result<Option<Harbor>, HarborRepositoryError>;
}

/// Fixture implementation for wiring that does not exercise persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureHarborRepository;

#[async_trait]
impl HarborRepository for FixtureHarborRepository {
    async fn upsert_harbor(&self, _harbor: &Harbor) -> Result<(), HarborRepositoryError> {
        Ok(())
    }

    async fn find_by_unloc(
        &self,
        _unloc: &Unloc,
    ) -> Result<Option<Harbor>, HarborRepositoryError> {
        Ok(None)
    }
}
