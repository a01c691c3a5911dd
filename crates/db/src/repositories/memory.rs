//! In-memory repository implementations for tests and handler unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use showhome_core::domain::host::Host;
use showhome_core::domain::inventory::InventoryModel;
use showhome_core::domain::visit::{
    NewVisit, Visit, VisitId, VisitPhoto, VisitWithVisitor,
};
use showhome_core::domain::visitor::{NewVisitor, Visitor, VisitorId};

use super::{InventoryRepository, RepositoryError, VisitRepository};

#[derive(Default)]
pub struct InMemoryVisitRepository {
    visits: Mutex<Vec<VisitWithVisitor>>,
    photos: Mutex<Vec<VisitPhoto>>,
}

impl InMemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn create_intake(
        &self,
        new_visitor: NewVisitor,
        new_visit: NewVisit,
        host: Option<&Host>,
    ) -> Result<VisitWithVisitor, RepositoryError> {
        let now = Utc::now();
        let visitor = Visitor {
            id: VisitorId::generate(),
            name: new_visitor.name,
            email: new_visitor.email,
            phone: new_visitor.phone,
            created_at: now,
        };
        let record = VisitWithVisitor {
            visit: Visit {
                id: VisitId::generate(),
                visitor_id: visitor.id.clone(),
                host_user_id: host.map(|h| h.id.clone()),
                stage: new_visit.stage,
                budget_min: new_visit.budget_min,
                budget_max: new_visit.budget_max,
                timeline: new_visit.timeline,
                must_have: new_visit.must_have,
                notes: None,
                started_at: now,
                ended_at: None,
            },
            visitor,
            host: host.cloned(),
        };

        self.visits.lock().expect("visit store lock").push(record.clone());
        Ok(record)
    }

    async fn list_active(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError> {
        let store = self.visits.lock().expect("visit store lock");
        let mut active: Vec<VisitWithVisitor> =
            store.iter().filter(|record| record.visit.is_active()).cloned().collect();
        // Insertion order breaks start-time ties, newest last in the store.
        active.reverse();
        active.sort_by(|a, b| b.visit.started_at.cmp(&a.visit.started_at));
        Ok(active)
    }

    async fn list_all(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError> {
        let store = self.visits.lock().expect("visit store lock");
        let mut all: Vec<VisitWithVisitor> = store.clone();
        all.reverse();
        all.sort_by(|a, b| b.visit.started_at.cmp(&a.visit.started_at));
        Ok(all)
    }

    async fn find_by_id(
        &self,
        id: &VisitId,
    ) -> Result<Option<VisitWithVisitor>, RepositoryError> {
        let store = self.visits.lock().expect("visit store lock");
        Ok(store.iter().find(|record| &record.visit.id == id).cloned())
    }

    async fn end_visit(
        &self,
        id: &VisitId,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.visits.lock().expect("visit store lock");
        match store.iter_mut().find(|record| &record.visit.id == id) {
            Some(record) if record.visit.is_active() => {
                record.visit.ended_at = Some(ended_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_photo(&self, photo: VisitPhoto) -> Result<(), RepositoryError> {
        self.photos.lock().expect("photo store lock").push(photo);
        Ok(())
    }

    async fn list_photos(&self, id: &VisitId) -> Result<Vec<VisitPhoto>, RepositoryError> {
        let store = self.photos.lock().expect("photo store lock");
        Ok(store.iter().filter(|photo| &photo.visit_id == id).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryInventoryRepository {
    models: Mutex<Vec<InventoryModel>>,
}

impl InMemoryInventoryRepository {
    pub fn with_models(models: Vec<InventoryModel>) -> Self {
        Self { models: Mutex::new(models) }
    }
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn list_active(&self) -> Result<Vec<InventoryModel>, RepositoryError> {
        let store = self.models.lock().expect("inventory store lock");
        let mut active: Vec<InventoryModel> =
            store.iter().filter(|model| model.active).cloned().collect();
        active.sort_by(|a, b| a.base_price.total_cmp(&b.base_price));
        Ok(active)
    }
}
