//! User-owned stock baskets: most-recent lookup and full-replacement save.

pub mod error;
pub mod store;

use crate::domain::basket::{StockBasket, StoredBasketStock, UserId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use error::BasketError;
pub use store::BasketStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Insert,
    /// Update scoped by basket id and owning user.
    Update,
}

/// One save: the basket row plus the complete stock list that replaces the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketWrite {
    pub mode: WriteMode,
    pub user_id: UserId,
    pub basket_id: Uuid,
    pub name: String,
    pub source_weights: BTreeMap<String, f64>,
    pub is_locked: bool,
    pub now: DateTime<Utc>,
    pub stocks: Vec<StoredBasketStock>,
}

#[async_trait::async_trait]
pub trait BasketBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Newest basket by `created_at` owned by `user_id`.
    async fn latest_basket(&self, user_id: UserId) -> anyhow::Result<Option<StockBasket>>;

    async fn stocks_for_basket(&self, basket_id: Uuid) -> anyhow::Result<Vec<StoredBasketStock>>;

    /// Writes the basket row, deletes every stock row of the basket and inserts
    /// `write.stocks`. Stops at the first failing step.
    async fn replace_basket(&self, write: &BasketWrite) -> Result<(), BasketError>;
}
