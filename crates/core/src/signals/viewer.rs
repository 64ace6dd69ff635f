use crate::domain::signal::Signal;
use crate::signals::query::{SentimentFilter, SignalQuery, SortKey, SortOrder};
use crate::signals::source::SignalSource;
use crate::signals::stats::SummaryStats;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load Twitter Signals.";

/// What the signal table shows. Exactly one applies, chosen in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Error(String),
    Empty,
    Populated(Vec<Signal>),
}

impl ViewState {
    pub fn resolve(loading: bool, error: Option<&str>, rows: &[Signal]) -> Self {
        if loading {
            Self::Loading
        } else if let Some(message) = error {
            Self::Error(message.to_string())
        } else if rows.is_empty() {
            Self::Empty
        } else {
            Self::Populated(rows.to_vec())
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Empty => "empty",
            Self::Populated(_) => "populated",
        }
    }
}

/// Read model behind the signal page: the fetched rows plus the user's criteria.
///
/// The visible rows are recomputed from scratch whenever the data or any criterion
/// changes.
#[derive(Debug, Clone)]
pub struct SignalViewer {
    data: Vec<Signal>,
    loading: bool,
    error: Option<String>,
    stats: SummaryStats,
    query: SignalQuery,
    visible: Vec<Signal>,
}

impl Default for SignalViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalViewer {
    pub fn new() -> Self {
        Self::with_query(SignalQuery::default())
    }

    pub fn with_query(query: SignalQuery) -> Self {
        Self {
            data: Vec::new(),
            loading: true,
            error: None,
            stats: SummaryStats::compute(&[]),
            query,
            visible: Vec::new(),
        }
    }

    /// Runs the one fetch for this viewer. Later calls are ignored.
    pub async fn load(&mut self, source: &dyn SignalSource) {
        if !self.loading {
            tracing::debug!("signal viewer already activated; skipping fetch");
            return;
        }

        match source.fetch_signals().await {
            Ok(data) => {
                self.stats = SummaryStats::compute(&data);
                self.data = data;
                self.recompute();
                tracing::info!(
                    source = source.source_name(),
                    total = self.stats.total,
                    "signals loaded"
                );
            }
            Err(err) => {
                tracing::error!(
                    source = source.source_name(),
                    error = %format!("{err:#}"),
                    "signal fetch failed"
                );
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        self.loading = false;
    }

    pub fn state(&self) -> ViewState {
        ViewState::resolve(self.loading, self.error.as_deref(), &self.visible)
    }

    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    pub fn query(&self) -> &SignalQuery {
        &self.query
    }

    pub fn visible(&self) -> &[Signal] {
        &self.visible
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.recompute();
    }

    pub fn set_sentiment_filter(&mut self, filter: SentimentFilter) {
        self.query.sentiment = filter;
        self.recompute();
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.query.sort_key = key;
        self.recompute();
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.query.sort_order = order;
        self.recompute();
    }

    pub fn toggle_sort_order(&mut self) {
        self.set_sort_order(self.query.sort_order.flipped());
    }

    fn recompute(&mut self) {
        self.visible = self.query.apply(&self.data);
    }
}
