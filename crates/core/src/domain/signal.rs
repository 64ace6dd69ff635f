use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// One row of pre-computed sentiment/price data for a ticker on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: String,
    pub comp_symbol: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub analyzed_tweets: u64,
    pub sentiment_score: f64,
    pub sentiment: String,
    pub entry_price: f64,
}

impl Signal {
    /// Recognized category of the free-form sentiment label, if any.
    pub fn category(&self) -> Option<Sentiment> {
        Sentiment::parse(&self.sentiment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Case-insensitive but otherwise exact; padded labels are not recognized.
    pub fn parse(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("positive") {
            Some(Self::Positive)
        } else if label.eq_ignore_ascii_case("negative") {
            Some(Self::Negative)
        } else if label.eq_ignore_ascii_case("neutral") {
            Some(Self::Neutral)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Upstream jobs sometimes encode whole counts as floats (`120.0`).
#[derive(Deserialize)]
#[serde(untagged)]
enum TweetCount {
    Whole(u64),
    Float(f64),
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TweetCount>::deserialize(deserializer)? {
        None => Ok(0),
        Some(TweetCount::Whole(n)) => Ok(n),
        Some(TweetCount::Float(n))
            if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 =>
        {
            Ok(n as u64)
        }
        Some(TweetCount::Float(n)) => Err(de::Error::custom(format!(
            "analyzed_tweets must be a non-negative whole number, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentiment_parse_is_case_insensitive() {
        assert_eq!(Sentiment::parse("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("neutral"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("bullish"), None);
    }

    #[test]
    fn padded_sentiment_label_is_not_recognized() {
        assert_eq!(Sentiment::parse(" positive "), None);
        assert_eq!(Sentiment::parse("neutral\n"), None);
    }

    fn with_tweets(tweets: serde_json::Value) -> Result<Signal, serde_json::Error> {
        serde_json::from_value(json!({
            "date": "2024-01-15",
            "comp_symbol": "AAPL",
            "analyzed_tweets": tweets,
            "sentiment_score": 0.1,
            "sentiment": "neutral",
            "entry_price": 10.0,
        }))
    }

    #[test]
    fn whole_float_tweet_count_is_accepted() {
        assert_eq!(with_tweets(json!(120.0)).unwrap().analyzed_tweets, 120);
        assert_eq!(with_tweets(json!(0.0)).unwrap().analyzed_tweets, 0);
        assert_eq!(with_tweets(json!(120)).unwrap().analyzed_tweets, 120);
    }

    #[test]
    fn fractional_or_negative_float_tweet_count_is_rejected() {
        assert!(with_tweets(json!(120.5)).is_err());
        assert!(with_tweets(json!(-1.0)).is_err());
        assert!(with_tweets(json!("120")).is_err());
    }

    #[test]
    fn missing_or_null_tweet_count_reads_as_zero() {
        let missing: Signal = serde_json::from_value(json!({
            "date": "2024-01-15",
            "comp_symbol": "AAPL",
            "sentiment_score": 0.1,
            "sentiment": "neutral",
            "entry_price": 10.0,
        }))
        .unwrap();
        assert_eq!(missing.analyzed_tweets, 0);

        let null: Signal = serde_json::from_value(json!({
            "date": "2024-01-15",
            "comp_symbol": "AAPL",
            "analyzed_tweets": null,
            "sentiment_score": 0.1,
            "sentiment": "neutral",
            "entry_price": 10.0,
        }))
        .unwrap();
        assert_eq!(null.analyzed_tweets, 0);
    }

    #[test]
    fn negative_tweet_count_is_rejected() {
        let res = serde_json::from_value::<Signal>(json!({
            "date": "2024-01-15",
            "comp_symbol": "AAPL",
            "analyzed_tweets": -3,
            "sentiment_score": 0.1,
            "sentiment": "neutral",
            "entry_price": 10.0,
        }));
        assert!(res.is_err());
    }
}
