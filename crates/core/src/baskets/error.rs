use crate::domain::basket::StockBasket;
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum BasketError {
    /// No authenticated caller. Checked before any backend call.
    NotAuthenticated,
    /// An update named a basket id the caller does not own (or that does not exist).
    NotFound { basket_id: Uuid },
    /// A backend call failed; `stage` names the statement that failed.
    Backend {
        stage: &'static str,
        source: anyhow::Error,
    },
    /// The basket row was read but its stocks could not be loaded.
    StocksUnavailable {
        basket: StockBasket,
        source: anyhow::Error,
    },
}

impl BasketError {
    pub fn backend(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            stage,
            source: source.into(),
        }
    }

    /// The basket that was found before the failure, if any.
    pub fn partial_basket(&self) -> Option<&StockBasket> {
        match self {
            Self::StocksUnavailable { basket, .. } => Some(basket),
            _ => None,
        }
    }
}

impl fmt::Display for BasketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => f.write_str("user not authenticated"),
            Self::NotFound { basket_id } => write!(f, "basket {basket_id} not found for user"),
            Self::Backend { stage, source } => {
                write!(f, "basket backend error (stage={stage}): {source:#}")
            }
            Self::StocksUnavailable { basket, source } => write!(
                f,
                "failed to load stocks for basket {}: {source:#}",
                basket.id.map(|id| id.to_string()).unwrap_or_default()
            ),
        }
    }
}

impl std::error::Error for BasketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend { source, .. } | Self::StocksUnavailable { source, .. } => Some(&**source),
            Self::NotAuthenticated | Self::NotFound { .. } => None,
        }
    }
}
