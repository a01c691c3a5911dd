use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use showhome_agent::{GenerationError, HttpGenerationClient};
use showhome_core::config::{AppConfig, ConfigError, LoadOptions};
use showhome_db::repositories::{
    HostRepository, RepositoryError, SqlHostRepository, SqlInventoryRepository,
    SqlVisitRepository,
};
use showhome_db::{connect, migrations, DbPool};

use crate::api::AppState;
use crate::pages;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("default host provisioning failed: {0}")]
    DefaultHost(#[source] RepositoryError),
    #[error("generation client initialization failed: {0}")]
    Generation(#[source] GenerationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let hosts = SqlHostRepository::new(db_pool.clone());
    let default_host = hosts
        .ensure(&config.intake.default_host_name, &config.intake.default_host_email)
        .await
        .map_err(BootstrapError::DefaultHost)?;
    info!(
        event_name = "system.bootstrap.default_host_ready",
        correlation_id = "bootstrap",
        host_email = %default_host.email,
        "default intake host is available"
    );

    let generation =
        HttpGenerationClient::new(&config.generation).map_err(BootstrapError::Generation)?;

    let state = AppState {
        visits: Arc::new(SqlVisitRepository::new(db_pool.clone())),
        inventory: Arc::new(SqlInventoryRepository::new(db_pool.clone())),
        generation: Arc::new(generation),
        default_host,
        admin_token: config.server.admin_token.clone(),
        db_pool: db_pool.clone(),
        templates: pages::templates(),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use showhome_core::analytics;
    use showhome_core::config::{ConfigOverrides, GenerationProvider, LoadOptions};
    use showhome_core::domain::visit::{NewVisit, VisitStage};
    use showhome_core::domain::visitor::NewVisitor;
    use showhome_db::repositories::VisitRepository;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_generation_credentials() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                generation_provider: Some(GenerationProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("generation.api_key"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_data_path_and_analytics_checkpoints() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('visitor', 'visit', 'inventory_model', 'user')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose baseline visit-path tables");

        assert_eq!(app.state.default_host.email, "sarah@example.com");

        let created = app
            .state
            .visits
            .create_intake(
                NewVisitor { name: "Smoke Family".to_string(), email: None, phone: None },
                NewVisit {
                    stage: Some(VisitStage::HotNow),
                    budget_min: 650_000,
                    budget_max: Some(750_000),
                    timeline: Some("<3".to_string()),
                    must_have: Some("home office".to_string()),
                },
                Some(&app.state.default_host),
            )
            .await
            .expect("intake should persist through bootstrap wiring");

        let active = app.state.visits.list_active().await.expect("active listing");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].visit.id, created.visit.id);

        let visits: Vec<_> = active.iter().map(|record| record.visit.clone()).collect();
        let summary = analytics::summarize(&visits);
        assert_eq!(summary.total_visitors, 1);
        assert_eq!(summary.hot_leads, 1);
        assert_eq!(summary.pipeline, 750_000, "hot lead contributes its budget ceiling");

        app.db_pool.close().await;
    }
}
