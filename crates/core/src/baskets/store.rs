use crate::baskets::{BasketBackend, BasketError, BasketWrite, WriteMode};
use crate::domain::basket::{BasketStock, MostRecentBasket, StockBasket, StoredBasketStock, UserId};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct BasketStore {
    backend: Arc<dyn BasketBackend>,
}

impl fmt::Debug for BasketStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasketStore")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl BasketStore {
    pub fn new(backend: Arc<dyn BasketBackend>) -> Self {
        Self { backend }
    }

    /// Most recently created basket of the caller with its stocks.
    ///
    /// A caller without baskets gets an empty result, not an error.
    pub async fn get_most_recent_basket(
        &self,
        user: Option<UserId>,
    ) -> Result<MostRecentBasket, BasketError> {
        let user_id = require_user(user)?;

        let basket = match self.backend.latest_basket(user_id).await {
            Ok(basket) => basket,
            Err(source) => {
                let err = BasketError::backend("select stock_baskets", source);
                tracing::error!(%user_id, error = %err, "basket lookup failed");
                return Err(err);
            }
        };

        let Some(basket) = basket else {
            tracing::debug!(%user_id, "user has no baskets");
            return Ok(MostRecentBasket::empty());
        };

        let Some(basket_id) = basket.id else {
            return Err(BasketError::backend(
                "select stock_baskets",
                anyhow::anyhow!("basket row has no id"),
            ));
        };

        match self.backend.stocks_for_basket(basket_id).await {
            Ok(stocks) => Ok(MostRecentBasket {
                basket: Some(basket),
                stocks: Some(stocks),
            }),
            Err(source) => {
                tracing::error!(%user_id, %basket_id, error = %format!("{source:#}"), "basket stock lookup failed");
                Err(BasketError::StocksUnavailable { basket, source })
            }
        }
    }

    /// Creates (no id) or updates (id present) a basket and replaces its stock list.
    ///
    /// Returns the basket id, newly generated for creates.
    pub async fn save_basket(
        &self,
        user: Option<UserId>,
        basket: &StockBasket,
        stocks: &[BasketStock],
    ) -> Result<Uuid, BasketError> {
        let user_id = require_user(user)?;

        let (basket_id, mode) = match basket.id {
            Some(id) => (id, WriteMode::Update),
            None => (Uuid::new_v4(), WriteMode::Insert),
        };

        let write = BasketWrite {
            mode,
            user_id,
            basket_id,
            name: basket.name.clone(),
            source_weights: basket.source_weights.clone(),
            is_locked: basket.is_locked,
            now: Utc::now(),
            stocks: stocks
                .iter()
                .map(|stock| StoredBasketStock::new(basket_id, stock))
                .collect(),
        };

        match self.backend.replace_basket(&write).await {
            Ok(()) => {
                tracing::info!(
                    %user_id,
                    %basket_id,
                    ?mode,
                    stocks = write.stocks.len(),
                    backend = self.backend.backend_name(),
                    "basket saved"
                );
                Ok(basket_id)
            }
            Err(err) => {
                tracing::error!(%user_id, %basket_id, ?mode, error = %err, "basket save failed");
                Err(err)
            }
        }
    }
}

fn require_user(user: Option<UserId>) -> Result<UserId, BasketError> {
    user.ok_or_else(|| {
        tracing::warn!("basket operation without authenticated user");
        BasketError::NotAuthenticated
    })
}
