use sqlx::Row;

use showhome_core::domain::inventory::InventoryModel;

use super::{InventoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn list_active(&self) -> Result<Vec<InventoryModel>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, base_price, beds, baths, sqft, garage, active
             FROM inventory_model
             WHERE active = 1
             ORDER BY base_price",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(InventoryModel {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    base_price: row.try_get("base_price")?,
                    beds: row.try_get("beds")?,
                    baths: row.try_get("baths")?,
                    sqft: row.try_get("sqft")?,
                    garage: row.try_get("garage")?,
                    active: row.try_get::<i64, _>("active")? != 0,
                })
            })
            .collect()
    }
}
