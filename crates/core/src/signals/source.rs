use crate::config::Settings;
use crate::domain::signal::Signal;
use crate::signals::dates::normalize_date;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

#[async_trait::async_trait]
pub trait SignalSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Fetches the full signal list with dates already normalized.
    async fn fetch_signals(&self) -> Result<Vec<Signal>>;
}

/// Single-endpoint JSON source. One GET per call; no paging, no retry.
#[derive(Debug, Clone)]
pub struct HttpSignalSource {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSignalSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.require_signals_endpoint_url()?.trim().to_string();
        Self::new(
            url,
            settings.signals_api_key.clone(),
            Duration::from_secs(settings.signals_timeout_secs),
        )
    }

    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build signals http client")?;

        Ok(Self { http, url, api_key })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl SignalSource for HttpSignalSource {
    fn source_name(&self) -> &'static str {
        "http_json"
    }

    async fn fetch_signals(&self) -> Result<Vec<Signal>> {
        let res = self
            .http
            .get(&self.url)
            .headers(self.headers()?)
            .send()
            .await
            .context("signals request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read signals response")?;

        if !status.is_success() {
            anyhow::bail!("signals endpoint HTTP {status}: {text}");
        }

        let signals = parse_signals(&text)?;
        tracing::debug!(url = %self.url, count = signals.len(), "fetched signals");
        Ok(signals)
    }
}

/// Decodes and validates a signals payload. The whole payload is rejected if any record
/// is malformed.
pub fn parse_signals(text: &str) -> Result<Vec<Signal>> {
    let mut signals = serde_json::from_str::<Vec<Signal>>(text)
        .context("signals response is not a JSON array of signal records")?;

    for (idx, signal) in signals.iter_mut().enumerate() {
        validate_signal(signal).with_context(|| format!("invalid signal at index {idx}"))?;
        signal.date = normalize_date(&signal.date);
    }

    Ok(signals)
}

fn validate_signal(signal: &Signal) -> Result<()> {
    anyhow::ensure!(
        !signal.comp_symbol.trim().is_empty(),
        "comp_symbol must be non-empty"
    );
    anyhow::ensure!(
        signal.sentiment_score.is_finite(),
        "sentiment_score must be finite"
    );
    anyhow::ensure!(
        signal.entry_price.is_finite() && signal.entry_price >= 0.0,
        "entry_price must be a non-negative amount (got {})",
        signal.entry_price
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn parses_and_normalizes_example_record() {
        let body = json!([
            {
                "date": "2024-01-15T00:00:00Z",
                "comp_symbol": "aapl",
                "analyzed_tweets": 120,
                "sentiment_score": 0.73,
                "sentiment": "Positive",
                "entry_price": 185.5
            }
        ])
        .to_string();

        let signals = parse_signals(&body).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].date, "2024-01-15");
        assert_eq!(signals[0].comp_symbol, "aapl");
        assert_eq!(signals[0].analyzed_tweets, 120);
    }

    #[test]
    fn accepts_whole_tweet_counts_encoded_as_floats() {
        let body = r#"[
            {"date":"2024-01-15","comp_symbol":"AAPL","analyzed_tweets":120.0,"sentiment_score":0.5,"sentiment":"positive","entry_price":10.0},
            {"date":"2024-01-16","comp_symbol":"MSFT","analyzed_tweets":7,"sentiment_score":-0.2,"sentiment":"negative","entry_price":20.0}
        ]"#;
        let signals = parse_signals(body).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].analyzed_tweets, 120);
        assert_eq!(signals[1].analyzed_tweets, 7);

        let fractional = body.replace("120.0", "120.5");
        assert!(parse_signals(&fractional).is_err());
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(parse_signals(r#"{"error":"nope"}"#).is_err());
        assert!(parse_signals("not json").is_err());
    }

    #[test]
    fn rejects_records_with_missing_fields() {
        let body = json!([{ "date": "2024-01-15", "comp_symbol": "AAPL" }]).to_string();
        assert!(parse_signals(&body).is_err());
    }

    #[test]
    fn rejects_negative_entry_price() {
        let body = json!([
            {
                "date": "2024-01-15",
                "comp_symbol": "AAPL",
                "analyzed_tweets": 1,
                "sentiment_score": 0.1,
                "sentiment": "neutral",
                "entry_price": -1.0
            }
        ])
        .to_string();
        let err = parse_signals(&body).unwrap_err();
        assert!(format!("{err:#}").contains("index 0"));
    }

    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                read.extend_from_slice(&buf[..n]);
                if read.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}/api/twitter-signals")
    }

    #[tokio::test]
    async fn http_source_fetches_and_normalizes() {
        let body = json!([
            {
                "date": "01/15/2024",
                "comp_symbol": "MSFT",
                "analyzed_tweets": null,
                "sentiment_score": -0.2,
                "sentiment": "negative",
                "entry_price": 400.0
            }
        ])
        .to_string();
        let url = serve_once("200 OK", body).await;

        let source = HttpSignalSource::new(url, None, Duration::from_secs(5)).unwrap();
        let signals = source.fetch_signals().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].date, "2024-01-15");
        assert_eq!(signals[0].analyzed_tweets, 0);
    }

    #[tokio::test]
    async fn http_source_surfaces_error_status() {
        let url = serve_once("500 Internal Server Error", "[]".to_string()).await;

        let source = HttpSignalSource::new(url, Some("k".to_string()), Duration::from_secs(5)).unwrap();
        let err = source.fetch_signals().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
