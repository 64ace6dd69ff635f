pub mod baskets;
pub mod memory;

use crate::baskets::BasketStore;
use crate::config::{BasketBackendKind, Settings};
use anyhow::Context;
use std::sync::Arc;

pub use baskets::PgBasketBackend;
pub use memory::MemoryBasketBackend;

/// Builds the basket store selected by `BASKET_BACKEND`, running migrations for Postgres.
pub async fn connect_basket_store(settings: &Settings) -> anyhow::Result<BasketStore> {
    match settings.basket_backend {
        BasketBackendKind::Memory => {
            tracing::warn!("using in-memory basket backend; baskets are lost on exit");
            Ok(BasketStore::new(Arc::new(MemoryBasketBackend::new())))
        }
        BasketBackendKind::Postgres => {
            let db_url = settings.require_database_url()?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("connect DATABASE_URL failed")?;
            migrate(&pool).await?;
            Ok(BasketStore::new(Arc::new(PgBasketBackend::new(pool))))
        }
    }
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
