//! The document-store capability the translator reads through.
//!
//! A repository is bound to one resource collection. Implementations receive fully
//! built [`FindQuery`] descriptors and are expected to apply, in order: filter, sort,
//! projection, skip/limit, populate. Failures to reach the store or run a query are
//! reported as [`QueryError::RepositoryUnavailable`].

mod memory;

use async_trait::async_trait;
use bson::Document as BsonDocument;
use std::sync::Arc;

use crate::errors::QueryError;
use crate::query::{Filter, FindQuery};

pub use memory::{MemoryRepository, MemoryStore};

#[async_trait]
pub trait Repository: Send + Sync {
    /// Name of the collection this repository reads.
    fn collection(&self) -> &str;

    /// Executes one read.
    async fn fetch(&self, query: &FindQuery) -> Result<Vec<BsonDocument>, QueryError>;

    /// Number of documents matching `filter`, ignoring pagination.
    async fn count(&self, filter: &Filter) -> Result<u64, QueryError>;
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    fn collection(&self) -> &str {
        (**self).collection()
    }

    async fn fetch(&self, query: &FindQuery) -> Result<Vec<BsonDocument>, QueryError> {
        (**self).fetch(query).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, QueryError> {
        (**self).count(filter).await
    }
}
