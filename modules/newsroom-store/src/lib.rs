pub mod clusters;
pub mod embedding_store;
pub mod error;
pub mod published_articles;
pub mod run_lock;
pub mod source_articles;

pub use embedding_store::EmbeddingStore;
pub use error::{Result, StoreError};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Postgres-backed persistence for the pipeline. All the component stores
/// (`source_articles`, `clusters`, `published_articles`, `pipeline_run_lock`)
/// share one connection pool; each is implemented as its own `impl Store`
/// block in its own module.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect to Postgres and run the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool (used by tests against a shared `testcontainers`
    /// instance).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
