use crate::domain::signal::{Sentiment, Signal};
use crate::signals::dates::normalize_date;
use serde::Serialize;

pub const NO_UPDATE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total_tweets: u64,
    /// Date of the first record in fetch order, which is not necessarily the latest.
    pub last_update: String,
}

impl SummaryStats {
    pub fn compute(signals: &[Signal]) -> Self {
        let mut stats = Self {
            total: signals.len(),
            positive: 0,
            negative: 0,
            neutral: 0,
            total_tweets: 0,
            last_update: signals
                .first()
                .map(|s| normalize_date(&s.date))
                .unwrap_or_else(|| NO_UPDATE.to_string()),
        };

        for signal in signals {
            match signal.category() {
                Some(Sentiment::Positive) => stats.positive += 1,
                Some(Sentiment::Negative) => stats.negative += 1,
                Some(Sentiment::Neutral) => stats.neutral += 1,
                None => {}
            }
            stats.total_tweets = stats.total_tweets.saturating_add(signal.analyzed_tweets);
        }

        stats
    }

    pub fn categorized(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}
