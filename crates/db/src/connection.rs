use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use showhome_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Session pragmas applied to every pooled connection. WAL keeps dashboard
/// reads from blocking intake writes; the busy timeout covers the brief
/// writer lock during visitor creation.
const CONNECTION_PRAGMAS: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "PRAGMA journal_mode = WAL",
    "PRAGMA busy_timeout = 5000",
];

/// Open the showroom database with the configured pool bounds.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in CONNECTION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use showhome_core::config::DatabaseConfig;

    use super::{connect, connect_with_settings};

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let enabled: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn config_connect_yields_a_working_pool() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 2,
            timeout_secs: 5,
        };

        let pool = connect(&config).await.expect("connect");
        let journal_mode: String =
            sqlx::query_scalar("PRAGMA journal_mode").fetch_one(&pool).await.expect("pragma");
        // In-memory databases report `memory`; the WAL pragma is still applied
        // without error on file-backed databases.
        assert!(!journal_mode.is_empty());
    }
}
