use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Identity of the authenticated caller. Every basket row is scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A named, user-owned collection of stock allocations.
///
/// `id` is `None` for a basket that has never been saved; the timestamps are always
/// assigned by the store and ignored on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBasket {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub source_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketStock {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub allocation: f64,
    #[serde(default)]
    pub is_locked: bool,
}

impl BasketStock {
    pub fn sector_or_unknown(&self) -> &str {
        match self.sector.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_SECTOR,
        }
    }
}

/// A persisted `basket_stocks` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBasketStock {
    pub id: Uuid,
    pub basket_id: Uuid,
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub allocation: f64,
    pub is_locked: bool,
}

impl StoredBasketStock {
    pub fn new(basket_id: Uuid, stock: &BasketStock) -> Self {
        Self {
            id: Uuid::new_v4(),
            basket_id,
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            sector: stock.sector_or_unknown().to_string(),
            allocation: stock.allocation,
            is_locked: stock.is_locked,
        }
    }

    /// The row as caller-facing input, without the generated ids.
    pub fn to_stock(&self) -> BasketStock {
        BasketStock {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            sector: Some(self.sector.clone()),
            allocation: self.allocation,
            is_locked: self.is_locked,
        }
    }
}

/// Body of a save: the basket fields plus its complete stock list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBasketRequest {
    pub basket: StockBasket,
    #[serde(default)]
    pub stocks: Vec<BasketStock>,
}

/// Result of a most-recent-basket lookup. Both fields are `None` when the user has no
/// baskets yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostRecentBasket {
    pub basket: Option<StockBasket>,
    pub stocks: Option<Vec<StoredBasketStock>>,
}

impl MostRecentBasket {
    pub fn empty() -> Self {
        Self {
            basket: None,
            stocks: None,
        }
    }
}
