use axum::{
    extract::{FromRef, Path},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::path::Path as FsPath;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::db::{RequestDb, Store};
use crate::error::Result;
use crate::sales::{self, Price, SalePoint};
use crate::views::{self, Template};

/// Header script requests must carry to reach the data endpoint
pub const REQUESTED_WITH: &str = "x-requested-with";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Shared application state
/// Holds no connection: each request opens its own through `RequestDb`
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Store {
        state.store.clone()
    }
}

/// Payload for the heat map
#[derive(Debug, Serialize)]
pub struct SalesData {
    pub data: Vec<SalePoint>,
    pub max_price: Price,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Map page with the year slider bounds
async fn map_page(mut db: RequestDb) -> Result<Html<String>> {
    let range = sales::year_range(db.conn()?)?;

    Ok(Html(views::render(
        Template::Map,
        &[
            ("min_year", range.min_year.to_string()),
            ("max_year", range.max_year.to_string()),
        ],
    )))
}

/// GET /data/:year - Sales for one year plus the table-wide max price
async fn sales_data(headers: HeaderMap, Path(raw): Path<String>, mut db: RequestDb) -> Response {
    // Only plain digit strings name a year; anything else is an unknown route
    let Some(year) = parse_year(&raw) else {
        return not_found().await;
    };

    if !is_script_request(&headers) {
        tracing::warn!(year = %raw, "rejected direct access to data endpoint");
        return error_page(StatusCode::FORBIDDEN, "Direct access not allowed.");
    }

    match load_sales(&mut db, year) {
        Ok(payload) => {
            tracing::debug!(year = %raw, sales = payload.data.len(), "serving sales data");
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => {
            tracing::error!(year = %raw, error = %e, "failed to load sales data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /game - Static game page
async fn game_page() -> Html<String> {
    Html(views::render(Template::Game, &[]))
}

async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "Page not found.")
}

/// Year segment of `/data/:year`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearParam {
    Year(i64),
    /// All digits but past `i64::MAX`; no stored year can match
    OutOfRange,
}

fn parse_year(raw: &str) -> Option<YearParam> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digits only, so overflow is the sole parse failure
    Some(raw.parse().map(YearParam::Year).unwrap_or(YearParam::OutOfRange))
}

fn load_sales(db: &mut RequestDb, year: YearParam) -> Result<SalesData> {
    let conn = db.conn()?;
    let data = match year {
        YearParam::Year(year) => sales::sales_for_year(conn, year)?,
        YearParam::OutOfRange => Vec::new(),
    };
    let max_price = sales::max_price(conn)?;

    Ok(SalesData { data, max_price })
}

fn is_script_request(headers: &HeaderMap) -> bool {
    headers
        .get(REQUESTED_WITH)
        .map(|value| value.as_bytes() == XML_HTTP_REQUEST.as_bytes())
        .unwrap_or(false)
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let page = views::render(Template::Error, &[("message", message.to_string())]);
    (status, Html(page)).into_response()
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/", get(map_page))
        .route("/data/:year", get(sales_data))
        .route("/game", get(game_page))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
