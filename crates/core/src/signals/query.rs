use crate::domain::signal::{Sentiment, Signal};
use crate::signals::dates::parse_generic_date;
use anyhow::bail;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentFilter {
    #[default]
    All,
    Only(Sentiment),
}

impl SentimentFilter {
    pub fn matches(self, signal: &Signal) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => signal.category() == Some(wanted),
        }
    }
}

impl FromStr for SentimentFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match Sentiment::parse(s) {
            Some(sentiment) => Ok(Self::Only(sentiment)),
            None => bail!("unknown sentiment filter: {s} (expected all, positive, negative or neutral)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Symbol,
    SentimentScore,
    Tweets,
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "symbol" => Ok(Self::Symbol),
            "sentiment_score" | "score" => Ok(Self::SentimentScore),
            "tweets" | "analyzed_tweets" => Ok(Self::Tweets),
            other => bail!("unknown sort key: {other} (expected date, symbol, sentiment_score or tweets)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => bail!("unknown sort order: {other} (expected asc or desc)"),
        }
    }
}

/// User-selected filter and sort criteria for the signal table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalQuery {
    pub sentiment: SentimentFilter,
    /// Case-insensitive substring of the ticker symbol. Empty matches everything.
    pub search: String,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl SignalQuery {
    pub fn matches(&self, signal: &Signal) -> bool {
        if !self.sentiment.matches(signal) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        signal
            .comp_symbol
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    pub fn apply(&self, signals: &[Signal]) -> Vec<Signal> {
        let mut rows: Vec<Signal> = signals.iter().filter(|s| self.matches(s)).cloned().collect();
        sort_ascending(&mut rows, self.sort_key);
        if self.sort_order == SortOrder::Descending {
            rows.reverse();
        }
        rows
    }
}

/// Stable ascending sort. Descending order is always derived by reversing this.
pub fn sort_ascending(rows: &mut [Signal], key: SortKey) {
    match key {
        // Unparseable dates sort before every real date.
        SortKey::Date => rows.sort_by_cached_key(|s| parse_generic_date(&s.date)),
        SortKey::Symbol => rows.sort_by(|a, b| compare_symbols(&a.comp_symbol, &b.comp_symbol)),
        SortKey::SentimentScore => {
            rows.sort_by(|a, b| a.sentiment_score.total_cmp(&b.sentiment_score))
        }
        SortKey::Tweets => rows.sort_by_key(|s| s.analyzed_tweets),
    }
}

fn compare_symbols(a: &str, b: &str) -> Ordering {
    // Case-folded first; on a tie lowercase sorts before uppercase.
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
