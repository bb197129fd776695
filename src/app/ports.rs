//! Seams between the request handling core and its external collaborators.
//! Production adapters live under `infra`; tests substitute in-memory fakes.

use async_trait::async_trait;
use mongodb::bson::Document;
use serde_json::Value;

use crate::error::{FetchError, StoreError};

/// One outbound call to the picture-of-the-day API. No retries, no caching.
#[async_trait]
pub trait PictureProvider: Send + Sync {
    /// Returns the provider's record verbatim as JSON.
    async fn fetch_daily(&self) -> Result<Value, FetchError>;
}

/// Generic key-document store, parameterized by collection name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Materialized find; read paths use `projection` to drop the store's
    /// internal identifier.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
    ) -> Result<Vec<Document>, StoreError>;

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Deletes at most one matching document. Zero matches is success.
    async fn delete_one(&self, collection: &str, filter: Document) -> Result<(), StoreError>;
}

/// Best-effort side-channel notifications. Both operations are
/// fire-and-forget: failures are logged inside the adapter and never
/// propagated, which is why the signatures return nothing.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Idempotent: an already-existing topic is not an error.
    async fn ensure_topic(&self, topic: &str);

    /// Publish with a bounded wait for broker acknowledgment.
    async fn publish(&self, topic: &str, message: &str);
}
