use serde::Serialize;

/// Per-ticker sentiment from each signal source, on a [-1, 1] scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub symbol: String,
    pub google_trends: f64,
    pub twitter: f64,
    pub news: f64,
}

impl ComparisonPoint {
    fn new(symbol: &str, google_trends: f64, twitter: f64, news: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            google_trends,
            twitter,
            news,
        }
    }
}

pub trait ComparisonSource: Send + Sync {
    fn points(&self) -> Vec<ComparisonPoint>;

    /// True when the points are illustrative rather than computed from signals.
    fn is_mock(&self) -> bool;
}

/// Fixed illustrative comparison of the three signal sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockComparison;

impl ComparisonSource for MockComparison {
    fn points(&self) -> Vec<ComparisonPoint> {
        vec![
            ComparisonPoint::new("AAPL", 0.5, 0.7, 0.6),
            ComparisonPoint::new("MSFT", 0.6, 0.7, 0.5),
            ComparisonPoint::new("AMZN", 0.4, 0.3, 0.2),
            ComparisonPoint::new("GOOGL", 0.6, 0.8, 0.7),
            ComparisonPoint::new("META", -0.3, -0.2, -0.1),
            ComparisonPoint::new("TSLA", 0.3, 0.4, 0.5),
        ]
    }

    fn is_mock(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_comparison_is_fixed_and_flagged() {
        let source = MockComparison;
        assert!(source.is_mock());

        let points = source.points();
        let symbols: Vec<&str> = points.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA"]);
        assert_eq!(points, source.points());
        assert!(points
            .iter()
            .all(|p| [p.google_trends, p.twitter, p.news]
                .iter()
                .all(|v| (-1.0..=1.0).contains(v))));
    }
}
