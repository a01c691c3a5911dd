use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use showhome_core::domain::host::Host;
use showhome_core::domain::inventory::InventoryModel;
use showhome_core::domain::visit::{NewVisit, VisitId, VisitPhoto, VisitWithVisitor};
use showhome_core::domain::visitor::NewVisitor;

pub mod host;
pub mod inventory;
pub mod memory;
pub mod visit;

pub use host::SqlHostRepository;
pub use inventory::SqlInventoryRepository;
pub use memory::{InMemoryInventoryRepository, InMemoryVisitRepository};
pub use visit::SqlVisitRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Store for the visit lifecycle. Absent rows are `Ok(None)`; errors mean
/// the store itself failed.
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Create the visitor and their visit in one transaction.
    async fn create_intake(
        &self,
        new_visitor: NewVisitor,
        new_visit: NewVisit,
        host: Option<&Host>,
    ) -> Result<VisitWithVisitor, RepositoryError>;

    /// Active visits (no `ended_at`), newest first by start time.
    async fn list_active(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError>;

    /// Every visit, for analytics aggregation.
    async fn list_all(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError>;

    async fn find_by_id(&self, id: &VisitId)
        -> Result<Option<VisitWithVisitor>, RepositoryError>;

    /// Mark a visit ended. Returns false when the id is unknown or the
    /// visit already ended.
    async fn end_visit(
        &self,
        id: &VisitId,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn add_photo(&self, photo: VisitPhoto) -> Result<(), RepositoryError>;

    async fn list_photos(&self, id: &VisitId) -> Result<Vec<VisitPhoto>, RepositoryError>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<InventoryModel>, RepositoryError>;
}

#[async_trait]
pub trait HostRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Host>, RepositoryError>;

    /// Find the host by email, creating the record when missing.
    async fn ensure(&self, name: &str, email: &str) -> Result<Host, RepositoryError>;
}
