use crate::baskets::{BasketBackend, BasketError, BasketWrite, WriteMode};
use crate::domain::basket::{StockBasket, StoredBasketStock, UserId};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

type BasketRow = (
    Uuid,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    Json<BTreeMap<String, f64>>,
    bool,
);

type StockRow = (Uuid, Uuid, String, String, String, f64, bool);

/// `stock_baskets` / `basket_stocks` on Postgres. Statements run with
/// `persistent(false)` so the backend also works behind a transaction-mode pooler.
#[derive(Debug, Clone)]
pub struct PgBasketBackend {
    pool: sqlx::PgPool,
}

impl PgBasketBackend {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

// Baskets created in the same instant resolve to the one inserted last (`seq`).
#[async_trait::async_trait]
impl BasketBackend for PgBasketBackend {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn latest_basket(&self, user_id: UserId) -> anyhow::Result<Option<StockBasket>> {
        let row = sqlx::query_as::<_, BasketRow>(
            "SELECT id, name, created_at, updated_at, source_weights, is_locked \
             FROM stock_baskets \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, seq DESC \
             LIMIT 1",
        )
        .persistent(false)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("select stock_baskets failed")?;

        Ok(row.map(
            |(id, name, created_at, updated_at, Json(source_weights), is_locked)| StockBasket {
                id: Some(id),
                name,
                source_weights,
                is_locked,
                created_at: Some(created_at),
                updated_at: Some(updated_at),
            },
        ))
    }

    async fn stocks_for_basket(&self, basket_id: Uuid) -> anyhow::Result<Vec<StoredBasketStock>> {
        let rows = sqlx::query_as::<_, StockRow>(
            "SELECT id, basket_id, symbol, name, sector, allocation, is_locked \
             FROM basket_stocks \
             WHERE basket_id = $1",
        )
        .persistent(false)
        .bind(basket_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select basket_stocks failed (basket_id={basket_id})"))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, basket_id, symbol, name, sector, allocation, is_locked)| StoredBasketStock {
                    id,
                    basket_id,
                    symbol,
                    name,
                    sector,
                    allocation,
                    is_locked,
                },
            )
            .collect())
    }

    async fn replace_basket(&self, write: &BasketWrite) -> Result<(), BasketError> {
        // The whole replacement commits or nothing does; dropping `tx` rolls back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BasketError::backend("begin transaction", e))?;

        match write.mode {
            WriteMode::Insert => {
                sqlx::query(
                    "INSERT INTO stock_baskets (id, user_id, name, created_at, updated_at, source_weights, is_locked) \
                     VALUES ($1, $2, $3, $4, $4, $5, $6)",
                )
                .persistent(false)
                .bind(write.basket_id)
                .bind(write.user_id.0)
                .bind(&write.name)
                .bind(write.now)
                .bind(Json(&write.source_weights))
                .bind(write.is_locked)
                .execute(&mut *tx)
                .await
                .map_err(|e| BasketError::backend("insert stock_baskets", e))?;
            }
            WriteMode::Update => {
                let res = sqlx::query(
                    "UPDATE stock_baskets \
                     SET name = $1, updated_at = $2, source_weights = $3, is_locked = $4 \
                     WHERE id = $5 AND user_id = $6",
                )
                .persistent(false)
                .bind(&write.name)
                .bind(write.now)
                .bind(Json(&write.source_weights))
                .bind(write.is_locked)
                .bind(write.basket_id)
                .bind(write.user_id.0)
                .execute(&mut *tx)
                .await
                .map_err(|e| BasketError::backend("update stock_baskets", e))?;

                if res.rows_affected() == 0 {
                    return Err(BasketError::NotFound {
                        basket_id: write.basket_id,
                    });
                }
            }
        }

        let deleted = sqlx::query("DELETE FROM basket_stocks WHERE basket_id = $1")
            .persistent(false)
            .bind(write.basket_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BasketError::backend("delete basket_stocks", e))?
            .rows_affected();

        if !write.stocks.is_empty() {
            let mut qb = sqlx::QueryBuilder::new(
                "INSERT INTO basket_stocks (id, basket_id, symbol, name, sector, allocation, is_locked) ",
            );
            qb.push_values(&write.stocks, |mut b, stock| {
                b.push_bind(stock.id)
                    .push_bind(stock.basket_id)
                    .push_bind(&stock.symbol)
                    .push_bind(&stock.name)
                    .push_bind(&stock.sector)
                    .push_bind(stock.allocation)
                    .push_bind(stock.is_locked);
            });
            qb.build()
                .persistent(false)
                .execute(&mut *tx)
                .await
                .map_err(|e| BasketError::backend("insert basket_stocks", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| BasketError::backend("commit transaction", e))?;

        tracing::debug!(
            basket_id = %write.basket_id,
            deleted,
            inserted = write.stocks.len(),
            "basket stocks replaced"
        );
        Ok(())
    }
}
