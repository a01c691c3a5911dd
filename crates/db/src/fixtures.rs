use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_HOST_ID: &str = "host-sarah-001";

const SEED_INVENTORY_IDS: &[&str] =
    &["inv-aspen-001", "inv-birch-001", "inv-cedar-001", "inv-dogwood-001"];

/// (visit id, expected stage) pairs the verification contract checks.
const SEED_VISITS: &[(&str, &str)] = &[
    ("visit-miller-001", "Hot Now"),
    ("visit-smith-001", "Researching"),
    ("visit-reed-001", "Just Looking"),
    ("visit-garcia-001", "Hot Now"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub models_seeded: usize,
    pub visits_seeded: usize,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub checks: Vec<(String, bool)>,
}

impl VerificationResult {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|(_, passed)| *passed)
    }
}

/// Deterministic demo dataset: a host, the model lineup, and one visit per
/// triage stage (plus a second hot lead). Loading resets visitor-facing
/// tables, so the admin seed operation is repeatable.
pub struct ShowroomSeedDataset;

impl ShowroomSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/showroom_seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            models_seeded: SEED_INVENTORY_IDS.len(),
            visits_seeded: SEED_VISITS.len(),
        })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let host_exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1)")
                .bind(SEED_HOST_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("seed-host".to_string(), host_exists == 1));

        let quoted_models = sql_array_from_ids(SEED_INVENTORY_IDS);
        let model_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM inventory_model WHERE id IN {quoted_models} AND active = 1"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("inventory-models".to_string(), model_count == SEED_INVENTORY_IDS.len() as i64));

        for (visit_id, stage) in SEED_VISITS {
            let visit_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM visit v
                     JOIN visitor vis ON vis.id = v.visitor_id
                     WHERE v.id = ?1 AND v.stage = ?2 AND v.ended_at IS NULL
                 )",
            )
            .bind(visit_id)
            .bind(stage)
            .fetch_one(pool)
            .await?;
            checks.push((visit_id.to_string(), visit_ok == 1));
        }

        Ok(VerificationResult { checks })
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{id}'")).collect();
    format!("({})", quoted.join(", "))
}
