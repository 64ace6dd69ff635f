pub mod baskets;
pub mod domain;
pub mod signals;
pub mod storage;

pub mod config {
    use anyhow::Context;

    const DEFAULT_SIGNALS_TIMEOUT_SECS: u64 = 15;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BasketBackendKind {
        Postgres,
        Memory,
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub signals_endpoint_url: Option<String>,
        pub signals_api_key: Option<String>,
        pub signals_timeout_secs: u64,
        pub basket_backend: BasketBackendKind,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let signals_timeout_secs = match std::env::var("SIGNALS_TIMEOUT_SECS") {
                Ok(s) => s
                    .parse::<u64>()
                    .with_context(|| format!("SIGNALS_TIMEOUT_SECS must be an integer (got {s})"))?,
                Err(_) => DEFAULT_SIGNALS_TIMEOUT_SECS,
            };

            let basket_backend = parse_basket_backend(std::env::var("BASKET_BACKEND").ok())?;

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                signals_endpoint_url: std::env::var("SIGNALS_ENDPOINT_URL").ok(),
                signals_api_key: std::env::var("SIGNALS_API_KEY").ok(),
                signals_timeout_secs,
                basket_backend,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_signals_endpoint_url(&self) -> anyhow::Result<&str> {
            self.signals_endpoint_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("SIGNALS_ENDPOINT_URL is required")
        }
    }

    fn parse_basket_backend(raw: Option<String>) -> anyhow::Result<BasketBackendKind> {
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(BasketBackendKind::Postgres),
            Some(s) if s.eq_ignore_ascii_case("postgres") => Ok(BasketBackendKind::Postgres),
            Some(s) if s.eq_ignore_ascii_case("memory") => Ok(BasketBackendKind::Memory),
            Some(other) => anyhow::bail!("BASKET_BACKEND must be 'postgres' or 'memory' (got {other})"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn basket_backend_defaults_to_postgres() {
            assert_eq!(parse_basket_backend(None).unwrap(), BasketBackendKind::Postgres);
            assert_eq!(
                parse_basket_backend(Some(" ".to_string())).unwrap(),
                BasketBackendKind::Postgres
            );
        }

        #[test]
        fn basket_backend_accepts_memory_case_insensitively() {
            assert_eq!(
                parse_basket_backend(Some("Memory".to_string())).unwrap(),
                BasketBackendKind::Memory
            );
        }

        #[test]
        fn basket_backend_rejects_unknown_values() {
            assert!(parse_basket_backend(Some("sqlite".to_string())).is_err());
        }
    }
}
