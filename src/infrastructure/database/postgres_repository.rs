use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::domain::{Item, ItemRepository, ItemRepositoryPtr, NewItem};

const CREATE_ITEMS_TABLE: &str = "CREATE TABLE IF NOT EXISTS items (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    price       DOUBLE PRECISION NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: f64,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        // ---
        Item {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            created_at: r.created_at,
        }
    }
}

/// Connect to PostgreSQL, retrying while the server comes up.
///
/// Makes `retry_count` attempts (at least one), one second apart.
pub async fn connect_postgres(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let attempts = config.retry_count.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %err, "Database not ready, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to connect to database after {attempts} attempts")
                })
            }
        }
    }
}

/// Connects, ensures the `items` table exists, and returns the repository.
pub async fn create_postgres_repository(config: &DatabaseConfig) -> Result<ItemRepositoryPtr> {
    // ---
    let pool = connect_postgres(config).await?;
    let repository = PostgresRepository::new(pool);
    repository.ensure_schema().await?;

    tracing::info!("PostgreSQL item repository ready");
    Ok(Arc::new(repository))
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }

    /// Create the `items` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        // ---
        sqlx::query(CREATE_ITEMS_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create items table")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ItemRepository for PostgresRepository {
    // ---
    async fn list_items(&self) -> Result<Vec<Item>> {
        // ---
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, price, created_at FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn create_item(&self, item: NewItem) -> Result<Item> {
        // ---
        let row = sqlx::query_as::<_, ItemRow>(
            "INSERT INTO items (name, description, price) VALUES ($1, $2, $3)
             RETURNING id, name, description, price, created_at",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        // ---
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, price, created_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn update_item(&self, id: i64, item: NewItem) -> Result<Option<Item>> {
        // ---
        let row = sqlx::query_as::<_, ItemRow>(
            "UPDATE items SET name = $1, description = $2, price = $3 WHERE id = $4
             RETURNING id, name, description, price, created_at",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn delete_item(&self, id: i64) -> Result<bool> {
        // ---
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
