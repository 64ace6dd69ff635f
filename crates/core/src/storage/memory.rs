use crate::baskets::{BasketBackend, BasketError, BasketWrite, WriteMode};
use crate::domain::basket::{StockBasket, StoredBasketStock, UserId};
use uuid::Uuid;

/// Steps at which `MemoryBasketBackend` can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStage {
    SelectBaskets,
    SelectStocks,
    WriteBasket,
    DeleteStocks,
    InsertStocks,
}

impl MemoryStage {
    fn statement(self) -> &'static str {
        match self {
            Self::SelectBaskets => "select stock_baskets",
            Self::SelectStocks => "select basket_stocks",
            Self::WriteBasket => "write stock_baskets",
            Self::DeleteStocks => "delete basket_stocks",
            Self::InsertStocks => "insert basket_stocks",
        }
    }
}

#[derive(Debug, Clone)]
struct BasketRow {
    user_id: UserId,
    seq: u64,
    basket: StockBasket,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    baskets: Vec<BasketRow>,
    stocks: Vec<StoredBasketStock>,
    next_seq: u64,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    fail_at: Option<MemoryStage>,
}

/// Process-local basket tables for tests and local development.
///
/// Saves are applied to a copy of the tables and swapped in only when every step
/// succeeded, matching the transactional Postgres backend.
#[derive(Debug, Default)]
pub struct MemoryBasketBackend {
    state: tokio::sync::Mutex<State>,
}

impl MemoryBasketBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call reaching `stage` fail until reset with `None`.
    pub async fn fail_at(&self, stage: Option<MemoryStage>) {
        self.state.lock().await.fail_at = stage;
    }

    pub async fn basket_count(&self) -> usize {
        self.state.lock().await.tables.baskets.len()
    }
}

fn check(fail_at: Option<MemoryStage>, stage: MemoryStage) -> anyhow::Result<()> {
    if fail_at == Some(stage) {
        anyhow::bail!("injected failure at {}", stage.statement());
    }
    Ok(())
}

fn check_write(fail_at: Option<MemoryStage>, stage: MemoryStage) -> Result<(), BasketError> {
    check(fail_at, stage).map_err(|e| BasketError::backend(stage.statement(), e))
}

#[async_trait::async_trait]
impl BasketBackend for MemoryBasketBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn latest_basket(&self, user_id: UserId) -> anyhow::Result<Option<StockBasket>> {
        let state = self.state.lock().await;
        check(state.fail_at, MemoryStage::SelectBaskets)?;

        Ok(state
            .tables
            .baskets
            .iter()
            .filter(|row| row.user_id == user_id)
            .max_by_key(|row| (row.basket.created_at, row.seq))
            .map(|row| row.basket.clone()))
    }

    async fn stocks_for_basket(&self, basket_id: Uuid) -> anyhow::Result<Vec<StoredBasketStock>> {
        let state = self.state.lock().await;
        check(state.fail_at, MemoryStage::SelectStocks)?;

        Ok(state
            .tables
            .stocks
            .iter()
            .filter(|s| s.basket_id == basket_id)
            .cloned()
            .collect())
    }

    async fn replace_basket(&self, write: &BasketWrite) -> Result<(), BasketError> {
        let mut state = self.state.lock().await;
        let fail_at = state.fail_at;
        let mut tables = state.tables.clone();

        check_write(fail_at, MemoryStage::WriteBasket)?;
        match write.mode {
            WriteMode::Insert => {
                let seq = tables.next_seq;
                tables.next_seq += 1;
                tables.baskets.push(BasketRow {
                    user_id: write.user_id,
                    seq,
                    basket: StockBasket {
                        id: Some(write.basket_id),
                        name: write.name.clone(),
                        source_weights: write.source_weights.clone(),
                        is_locked: write.is_locked,
                        created_at: Some(write.now),
                        updated_at: Some(write.now),
                    },
                });
            }
            WriteMode::Update => {
                let row = tables
                    .baskets
                    .iter_mut()
                    .find(|row| {
                        row.user_id == write.user_id && row.basket.id == Some(write.basket_id)
                    })
                    .ok_or(BasketError::NotFound {
                        basket_id: write.basket_id,
                    })?;
                row.basket.name = write.name.clone();
                row.basket.source_weights = write.source_weights.clone();
                row.basket.is_locked = write.is_locked;
                row.basket.updated_at = Some(write.now);
            }
        }

        check_write(fail_at, MemoryStage::DeleteStocks)?;
        tables.stocks.retain(|s| s.basket_id != write.basket_id);

        check_write(fail_at, MemoryStage::InsertStocks)?;
        tables.stocks.extend(write.stocks.iter().cloned());

        state.tables = tables;
        Ok(())
    }
}
