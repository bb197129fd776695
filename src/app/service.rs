//! The request handling core: one operation per use case, each calling the
//! collaborators in a fixed sequence and mapping their outcomes to a single
//! tagged error type. Holds no state of its own between requests.

use std::fmt;
use std::sync::Arc;

use mongodb::bson::{doc, to_document, Document};
use tracing::{error, info};

use crate::app::ports::{DocumentStore, NotificationPublisher, PictureProvider};
use crate::error::{AppError, Result};
use crate::metrics::{FetchGuard, MetricsSink};

pub const FAVORITES_COLLECTION: &str = "favorites";
pub const LAST_SEEN_COLLECTION: &str = "last_seen";
pub const NOTIFICATION_TOPIC: &str = "favorites";

/// Which collection a pictures listing reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureKind {
    Favorites,
    LastSeen,
}

impl PictureKind {
    /// Validated at the boundary, before any store read happens.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "favorites" => Ok(PictureKind::Favorites),
            "last_seen" => Ok(PictureKind::LastSeen),
            _ => Err(AppError::Validation(
                "Invalid data type. Use \"favorites\" or \"last_seen\".".into(),
            )),
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            PictureKind::Favorites => FAVORITES_COLLECTION,
            PictureKind::LastSeen => LAST_SEEN_COLLECTION,
        }
    }
}

impl fmt::Display for PictureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Orchestrates the picture provider, the document store, and the
/// notification publisher behind the HTTP handlers.
pub struct ApodService {
    provider: Arc<dyn PictureProvider>,
    store: Arc<dyn DocumentStore>,
    publisher: Arc<dyn NotificationPublisher>,
    metrics: Arc<dyn MetricsSink>,
}

impl ApodService {
    pub fn new(
        provider: Arc<dyn PictureProvider>,
        store: Arc<dyn DocumentStore>,
        publisher: Arc<dyn NotificationPublisher>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            provider,
            store,
            publisher,
            metrics,
        }
    }

    /// Favorites with only `url` and `title`, for the home and favorites views.
    pub async fn list_favorites(&self) -> Result<Vec<Document>> {
        self.store
            .find(
                FAVORITES_COLLECTION,
                doc! {},
                doc! { "_id": 0, "url": 1, "title": 1 },
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Error retrieving favorites");
                AppError::Store("Failed to load favorites. Please try again later.".into())
            })
    }

    /// Fetch today's picture and append it to `last_seen`. The append is
    /// unconditional and not deduplicated; a provider error stores nothing.
    pub async fn fetch_daily_picture(&self) -> Result<Document> {
        // The in-flight gauge brackets only the provider call.
        let fetched = {
            let _guard = FetchGuard::new(self.metrics.as_ref());
            self.provider.fetch_daily().await
        };
        let record = match fetched {
            Ok(record) => record,
            Err(e) => {
                error!(error = ?e, "Error fetching APOD data");
                return Err(AppError::Fetch(e));
            }
        };

        let doc = to_document(&record).map_err(|e| {
            error!(error = %e, "APOD record is not a document");
            AppError::Store("Failed to save picture data.".into())
        })?;
        self.store
            .insert_one(LAST_SEEN_COLLECTION, doc.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "Error saving last seen");
                AppError::Store("Failed to save picture data.".into())
            })?;
        Ok(doc)
    }

    pub async fn list_pictures(&self, kind: PictureKind) -> Result<Vec<Document>> {
        let projection = match kind {
            PictureKind::Favorites => doc! { "_id": 0, "url": 1, "title": 1 },
            PictureKind::LastSeen => doc! { "_id": 0 },
        };
        self.store
            .find(kind.collection(), doc! {}, projection)
            .await
            .map_err(|e| {
                error!(error = %e, kind = %kind, "Error retrieving pictures");
                AppError::Store(format!("Failed to load {kind}. Please try again later."))
            })
    }

    /// Insert a favorite and notify the side channel. The topic is ensured on
    /// every call (idempotent no-op after the first); publisher failures are
    /// swallowed by the publisher itself and never change the outcome.
    pub async fn add_favorite(&self, url: &str, title: &str) -> Result<()> {
        if url.is_empty() || title.is_empty() {
            return Err(AppError::Validation("No picture data provided".into()));
        }

        self.publisher.ensure_topic(NOTIFICATION_TOPIC).await;
        self.store
            .insert_one(FAVORITES_COLLECTION, doc! { "url": url, "title": title })
            .await
            .map_err(|e| {
                error!(error = %e, "Error adding favorite");
                AppError::Store("Failed to add favorite".into())
            })?;
        self.publisher
            .publish(NOTIFICATION_TOPIC, &format!("Added favorite: {title}"))
            .await;
        info!(title = %title, "Favorite added");
        Ok(())
    }

    /// Delete one `last_seen` entry by url. Deleting nothing is success.
    pub async fn delete_last_seen(&self, url: &str) -> Result<()> {
        self.store
            .delete_one(LAST_SEEN_COLLECTION, doc! { "url": url })
            .await
            .map_err(|e| {
                error!(error = %e, "Error deleting last seen");
                AppError::Store(
                    "Failed to delete last seen image. Please try again later.".into(),
                )
            })
    }
}
