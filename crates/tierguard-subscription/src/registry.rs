//! The caller's document registry. Only touched when a lapsed grace period
//! drops the client to free and excess documents must go.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::errors::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Registry key, passed back to [`DocumentRegistry::delete`].
    pub id: String,
    /// The name the upload was recorded under in the usage counters.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[allow(async_fn_in_trait)]
pub trait DocumentRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<DocumentEntry>, RegistryError>;

    /// Permanently remove a document.
    async fn delete(&self, id: &str) -> Result<(), RegistryError>;
}

impl<T: DocumentRegistry> DocumentRegistry for Arc<T> {
    async fn list(&self) -> Result<Vec<DocumentEntry>, RegistryError> {
        (**self).list().await
    }

    async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        (**self).delete(id).await
    }
}
