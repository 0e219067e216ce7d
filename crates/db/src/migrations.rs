use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::connect_with_settings;

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "offer",
        "offer_embedding",
        "idx_offer_supplier",
        "idx_offer_created_at",
    ];

    #[tokio::test]
    async fn migrations_create_the_offer_schema() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");

        run_pending(&pool).await.expect("migrations should apply");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')")
            .fetch_all(&pool)
            .await
            .expect("schema listing should succeed");
        let names: Vec<String> =
            rows.iter().map(|row| row.get::<String, _>("name")).collect();

        for object in MANAGED_SCHEMA_OBJECTS {
            assert!(names.iter().any(|name| name == object), "missing schema object {object}");
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");

        run_pending(&pool).await.expect("first run should apply");
        run_pending(&pool).await.expect("second run should be a no-op");

        pool.close().await;
    }
}
