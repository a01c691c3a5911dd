use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use showhome_core::domain::host::{Host, HostRole};
use showhome_core::domain::visit::{
    NewVisit, Visit, VisitId, VisitPhoto, VisitStage, VisitWithVisitor,
};
use showhome_core::domain::visitor::{NewVisitor, Visitor, VisitorId};

use super::{RepositoryError, VisitRepository};
use crate::DbPool;

const VISIT_JOIN_SELECT: &str = "SELECT v.id, v.visitor_id, v.host_user_id, v.stage,
        v.budget_min, v.budget_max, v.timeline, v.must_have, v.notes,
        v.started_at, v.ended_at,
        vis.name AS visitor_name, vis.email AS visitor_email,
        vis.phone AS visitor_phone, vis.created_at AS visitor_created_at,
        u.name AS host_name, u.email AS host_email, u.role AS host_role,
        u.created_at AS host_created_at
     FROM visit v
     JOIN visitor vis ON vis.id = v.visitor_id
     LEFT JOIN user u ON u.id = v.host_user_id";

pub struct SqlVisitRepository {
    pool: DbPool,
}

impl SqlVisitRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VisitRepository for SqlVisitRepository {
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
        let visit = Visit {
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
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO visitor (id, name, email, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&visitor.id.0)
        .bind(&visitor.name)
        .bind(&visitor.email)
        .bind(&visitor.phone)
        .bind(visitor.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO visit (id, visitor_id, host_user_id, stage, budget_min, budget_max,
                                timeline, must_have, notes, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL)",
        )
        .bind(&visit.id.0)
        .bind(&visit.visitor_id.0)
        .bind(&visit.host_user_id)
        .bind(visit.stage.map(|stage| stage.as_str()))
        .bind(visit.budget_min)
        .bind(visit.budget_max)
        .bind(&visit.timeline)
        .bind(&visit.must_have)
        .bind(&visit.notes)
        .bind(visit.started_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VisitWithVisitor { visit, visitor, host: host.cloned() })
    }

    async fn list_active(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{VISIT_JOIN_SELECT} WHERE v.ended_at IS NULL ORDER BY v.started_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_visit_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<VisitWithVisitor>, RepositoryError> {
        let rows = sqlx::query(&format!("{VISIT_JOIN_SELECT} ORDER BY v.started_at DESC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_visit_row).collect()
    }

    async fn find_by_id(
        &self,
        id: &VisitId,
    ) -> Result<Option<VisitWithVisitor>, RepositoryError> {
        let row = sqlx::query(&format!("{VISIT_JOIN_SELECT} WHERE v.id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_visit_row).transpose()
    }

    async fn end_visit(
        &self,
        id: &VisitId,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE visit SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL")
            .bind(ended_at)
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn add_photo(&self, photo: VisitPhoto) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO visit_photo (id, visit_id, url, caption) VALUES (?1, ?2, ?3, ?4)")
            .bind(&photo.id)
            .bind(&photo.visit_id.0)
            .bind(&photo.url)
            .bind(&photo.caption)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_photos(&self, id: &VisitId) -> Result<Vec<VisitPhoto>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, visit_id, url, caption FROM visit_photo WHERE visit_id = ?1 ORDER BY id",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(VisitPhoto {
                    id: row.try_get("id")?,
                    visit_id: VisitId(row.try_get("visit_id")?),
                    url: row.try_get("url")?,
                    caption: row.try_get("caption")?,
                })
            })
            .collect()
    }
}

fn map_visit_row(row: &SqliteRow) -> Result<VisitWithVisitor, RepositoryError> {
    let stage = row
        .try_get::<Option<String>, _>("stage")?
        .map(|raw| {
            VisitStage::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown visit stage `{raw}`")))
        })
        .transpose()?;

    let host_user_id: Option<String> = row.try_get("host_user_id")?;
    let host = match &host_user_id {
        Some(host_id) => {
            // LEFT JOIN may still miss when the host row was deleted.
            match row.try_get::<Option<String>, _>("host_name")? {
                Some(host_name) => {
                    let raw_role: String = row.try_get("host_role")?;
                    let role = HostRole::parse(&raw_role).ok_or_else(|| {
                        RepositoryError::Decode(format!("unknown host role `{raw_role}`"))
                    })?;
                    Some(Host {
                        id: host_id.clone(),
                        name: host_name,
                        email: row.try_get("host_email")?,
                        role,
                        created_at: row.try_get("host_created_at")?,
                    })
                }
                None => None,
            }
        }
        None => None,
    };

    Ok(VisitWithVisitor {
        visit: Visit {
            id: VisitId(row.try_get("id")?),
            visitor_id: VisitorId(row.try_get("visitor_id")?),
            host_user_id,
            stage,
            budget_min: row.try_get("budget_min")?,
            budget_max: row.try_get("budget_max")?,
            timeline: row.try_get("timeline")?,
            must_have: row.try_get("must_have")?,
            notes: row.try_get("notes")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
        },
        visitor: Visitor {
            id: VisitorId(row.try_get("visitor_id")?),
            name: row.try_get("visitor_name")?,
            email: row.try_get("visitor_email")?,
            phone: row.try_get("visitor_phone")?,
            created_at: row.try_get("visitor_created_at")?,
        },
        host,
    })
}
