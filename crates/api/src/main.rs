use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use signaldash_core::baskets::{BasketError, BasketStore};
use signaldash_core::domain::basket::{MostRecentBasket, SaveBasketRequest, StockBasket, UserId};
use signaldash_core::domain::signal::Signal;
use signaldash_core::signals::render::{EMPTY_MESSAGE, LOADING_MESSAGE};
use signaldash_core::signals::{
    ComparisonPoint, ComparisonSource, HttpSignalSource, MockComparison, SignalQuery,
    SignalSource, SignalViewer, SummaryStats, ViewState,
};

const USER_HEADER: &str = "x-user-id";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = signaldash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let signals: Option<Arc<dyn SignalSource>> = match HttpSignalSource::from_settings(&settings) {
        Ok(source) => Some(Arc::new(source)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "signals source unavailable; /signals starts in degraded mode");
            None
        }
    };

    let baskets = match signaldash_core::storage::connect_basket_store(&settings).await {
        Ok(store) => Some(store),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "basket store unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        signals,
        comparison: Arc::new(MockComparison),
        baskets,
    };

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/signals", get(get_signals))
        .route("/signals/comparison", get(get_comparison))
        .route("/baskets/latest", get(get_latest_basket))
        .route("/baskets", put(put_basket))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    signals: Option<Arc<dyn SignalSource>>,
    comparison: Arc<dyn ComparisonSource>,
    baskets: Option<BasketStore>,
}

#[derive(Debug, Default, Deserialize)]
struct SignalsParams {
    sentiment: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
}

impl SignalsParams {
    fn into_query(self) -> anyhow::Result<SignalQuery> {
        let mut query = SignalQuery::default();
        if let Some(s) = self.sentiment.as_deref() {
            query.sentiment = s.parse()?;
        }
        if let Some(s) = self.search {
            query.search = s;
        }
        if let Some(s) = self.sort_by.as_deref() {
            query.sort_key = s.parse()?;
        }
        if let Some(s) = self.order.as_deref() {
            query.sort_order = s.parse()?;
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
struct SignalsResponse {
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    stats: SummaryStats,
    query: SignalQuery,
    rows: Vec<Signal>,
}

async fn get_signals(
    State(state): State<AppState>,
    Query(params): Query<SignalsParams>,
) -> Result<(StatusCode, Json<SignalsResponse>), StatusCode> {
    let Some(source) = &state.signals else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let query = params.into_query().map_err(|e| {
        tracing::debug!(error = %e, "rejecting signals query");
        StatusCode::BAD_REQUEST
    })?;

    let mut viewer = SignalViewer::with_query(query);
    viewer.load(source.as_ref()).await;

    Ok(signals_response(&viewer))
}

fn signals_response(viewer: &SignalViewer) -> (StatusCode, Json<SignalsResponse>) {
    let view = viewer.state();
    let state = view.name();
    let (status, message, rows) = match view {
        ViewState::Loading => (StatusCode::OK, Some(LOADING_MESSAGE.to_string()), Vec::new()),
        ViewState::Error(message) => (StatusCode::BAD_GATEWAY, Some(message), Vec::new()),
        ViewState::Empty => (StatusCode::OK, Some(EMPTY_MESSAGE.to_string()), Vec::new()),
        ViewState::Populated(rows) => (StatusCode::OK, None, rows),
    };

    (
        status,
        Json(SignalsResponse {
            state,
            message,
            stats: viewer.stats().clone(),
            query: viewer.query().clone(),
            rows,
        }),
    )
}

#[derive(Debug, Serialize)]
struct ComparisonResponse {
    mock: bool,
    points: Vec<ComparisonPoint>,
}

async fn get_comparison(State(state): State<AppState>) -> Json<ComparisonResponse> {
    Json(ComparisonResponse {
        mock: state.comparison.is_mock(),
        points: state.comparison.points(),
    })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    basket: Option<StockBasket>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorBody {
                error: "basket store unavailable".to_string(),
                basket: None,
            },
        }
    }
}

impl From<BasketError> for ApiError {
    fn from(err: BasketError) -> Self {
        let status = match &err {
            BasketError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            BasketError::NotFound { .. } => StatusCode::NOT_FOUND,
            BasketError::Backend { .. } | BasketError::StocksUnavailable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                basket: err.partial_basket().cloned(),
            },
        }
    }
}

/// Reports server-side basket failures to Sentry, then converts. Caller mistakes
/// (401, 404) are not reported.
fn basket_failure(err: BasketError) -> ApiError {
    if matches!(
        err,
        BasketError::Backend { .. } | BasketError::StocksUnavailable { .. }
    ) {
        tracing::error!(error = %err, "basket request failed");
        sentry::capture_error(&err);
    }
    ApiError::from(err)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Caller identity as asserted by the authenticating gateway. A missing or malformed
/// header means no authenticated user.
fn caller(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

async fn get_latest_basket(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MostRecentBasket>, ApiError> {
    let Some(store) = &state.baskets else {
        return Err(ApiError::unavailable());
    };

    let latest = store
        .get_most_recent_basket(caller(&headers))
        .await
        .map_err(basket_failure)?;
    Ok(Json(latest))
}

#[derive(Debug, Serialize)]
struct SavedBasket {
    basket_id: Uuid,
}

async fn put_basket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SaveBasketRequest>,
) -> Result<Json<SavedBasket>, ApiError> {
    let Some(store) = &state.baskets else {
        return Err(ApiError::unavailable());
    };

    let basket_id = store
        .save_basket(caller(&headers), &req.basket, &req.stocks)
        .await
        .map_err(basket_failure)?;
    Ok(Json(SavedBasket { basket_id }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &signaldash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
