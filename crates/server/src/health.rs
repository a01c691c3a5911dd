//! Liveness endpoint served on the dedicated health port, separate from
//! the sales-floor routes so probes keep working while the app port is
//! busy or misconfigured.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use showhome_db::DbPool;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentCheck {
    pub component: &'static str,
    pub status: ComponentStatus,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: ComponentStatus,
    pub checks: Vec<ComponentCheck>,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn spawn(bind_address: &str, port: u16, db_pool: DbPool) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let checks = vec![
        ComponentCheck {
            component: "service",
            status: ComponentStatus::Ready,
            detail: "showhome-server runtime initialized".to_string(),
        },
        database_check(&state.db_pool).await,
        migrations_check(&state.db_pool).await,
    ];

    let ready = checks.iter().all(|check| check.status == ComponentStatus::Ready);
    let report = HealthReport {
        status: if ready { ComponentStatus::Ready } else { ComponentStatus::Degraded },
        checks,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(report))
}

async fn database_check(pool: &DbPool) -> ComponentCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => ComponentCheck {
            component: "database",
            status: ComponentStatus::Ready,
            detail: "database query succeeded".to_string(),
        },
        Err(error) => ComponentCheck {
            component: "database",
            status: ComponentStatus::Degraded,
            detail: format!("database query failed: {error}"),
        },
    }
}

/// Counts applied migration rows; a reachable database with no schema is
/// degraded, not ready.
async fn migrations_check(pool: &DbPool) -> ComponentCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(applied) if applied > 0 => ComponentCheck {
            component: "migrations",
            status: ComponentStatus::Ready,
            detail: format!("{applied} migration(s) applied"),
        },
        Ok(_) => ComponentCheck {
            component: "migrations",
            status: ComponentStatus::Degraded,
            detail: "no migrations applied".to_string(),
        },
        Err(error) => ComponentCheck {
            component: "migrations",
            status: ComponentStatus::Degraded,
            detail: format!("migration ledger unavailable: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use showhome_db::{connect_with_settings, migrations};

    use crate::health::{health, ComponentStatus, HealthState};

    #[tokio::test]
    async fn health_reports_ready_on_a_migrated_database() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let (status, Json(report)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, ComponentStatus::Ready);
        assert_eq!(report.checks.len(), 3);
        assert!(report.checks.iter().all(|check| check.status == ComponentStatus::Ready));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_degrades_when_the_database_is_unreachable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;

        let (status, Json(report)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, ComponentStatus::Degraded);
        let database = report
            .checks
            .iter()
            .find(|check| check.component == "database")
            .expect("database check");
        assert_eq!(database.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn health_degrades_on_an_unmigrated_database() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");

        let (status, Json(report)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let migrations_check = report
            .checks
            .iter()
            .find(|check| check.component == "migrations")
            .expect("migrations check");
        assert_eq!(migrations_check.status, ComponentStatus::Degraded);

        pool.close().await;
    }
}
