//! MongoDB-backed document store adapter.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::FindOptions;
use mongodb::{Client, Database};

use crate::app::ports::DocumentStore;
use crate::config::MongoConfig;
use crate::error::{AppError, Result, StoreError};

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Client construction validates the connection string; actual I/O is
    /// deferred to the first operation, per driver convention.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let client = Client::with_uri_str(config.uri())
            .await
            .map_err(|e| AppError::Config(format!("failed to initialize MongoDB client: {e}")))?;
        Ok(Self {
            db: client.database(&config.db_name),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Document,
    ) -> std::result::Result<Vec<Document>, StoreError> {
        let options = FindOptions::builder().projection(projection).build();
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(
        &self,
        collection: &str,
        doc: Document,
    ) -> std::result::Result<(), StoreError> {
        self.db
            .collection::<Document>(collection)
            .insert_one(doc, None)
            .await?;
        Ok(())
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> std::result::Result<(), StoreError> {
        // delete_one on zero matches reports deleted_count = 0, which is
        // success from the caller's point of view.
        self.db
            .collection::<Document>(collection)
            .delete_one(filter, None)
            .await?;
        Ok(())
    }
}
