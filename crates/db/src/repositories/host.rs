use chrono::Utc;
use sqlx::Row;

use showhome_core::domain::host::{Host, HostRole};

use super::{HostRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHostRepository {
    pool: DbPool,
}

impl SqlHostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HostRepository for SqlHostRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Host>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email, role, created_at FROM user WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let raw_role: String = row.try_get("role")?;
            let role = HostRole::parse(&raw_role).ok_or_else(|| {
                RepositoryError::Decode(format!("unknown host role `{raw_role}`"))
            })?;
            Ok(Host {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                role,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn ensure(&self, name: &str, email: &str) -> Result<Host, RepositoryError> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }

        let host = Host {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: HostRole::Host,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO user (id, name, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)")
            .bind(&host.id)
            .bind(&host.name)
            .bind(&host.email)
            .bind(host.role.as_str())
            .bind(host.created_at)
            .execute(&self.pool)
            .await?;

        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::SqlHostRepository;
    use crate::repositories::HostRepository;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn ensure_is_idempotent_per_email() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        let hosts = SqlHostRepository::new(pool);

        let first = hosts.ensure("Sarah P.", "sarah@example.com").await.expect("first ensure");
        let second = hosts.ensure("Sarah P.", "sarah@example.com").await.expect("second ensure");

        assert_eq!(first.id, second.id);
        assert_eq!(
            hosts
                .find_by_email("sarah@example.com")
                .await
                .expect("find")
                .map(|host| host.id),
            Some(first.id)
        );
    }

    #[tokio::test]
    async fn unknown_email_is_none() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        let hosts = SqlHostRepository::new(pool);

        assert!(hosts.find_by_email("nobody@example.com").await.expect("find").is_none());
    }
}
