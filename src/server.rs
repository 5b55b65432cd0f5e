//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness text |
//! | `POST` | `/chat` | Answer `{"message": ...}` with `{"response": ...}` |
//!
//! Errors are returned as `{"error": "..."}` with status 400 for a missing
//! message and 500 for data or LLM failures.

use crate::analysis::{filter_by_keyword, normalize_table, summarize_table};
use crate::config::Config;
use crate::data::{load_tables, Tables};
use crate::error::ChatError;
use crate::llm::{parse_intent, LlmClient, LlmSettings};
use crate::models::Summary;
use crate::prompt::{build_insight_prompt, ADVISOR_SYSTEM_PROMPT, NO_DATA_RESPONSE};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

/// Liveness text for `GET /`.
pub const LIVENESS_TEXT: &str = "BI agent running";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration built once at startup.
    pub config: Arc<Config>,
    /// Connection pool shared by outbound calls.
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http_client: reqwest::Client::new(),
        }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/chat", post(handle_chat))
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Bodies ============

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ChatError::DataUnavailable(ref e) | ChatError::Llm(ref e) = self {
            error!("{}: {:#}", self, e);
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============ Handlers ============

async fn handle_root() -> &'static str {
    LIVENESS_TEXT
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ChatError> {
    let message = match body {
        Ok(Json(request)) => request.message.unwrap_or_default(),
        Err(rejection) => {
            debug!("Rejected chat body: {}", rejection);
            String::new()
        }
    };

    if message.trim().is_empty() {
        return Err(ChatError::MissingMessage);
    }

    let response = answer_question(&state, message.trim()).await?;
    Ok(Json(ChatReply { response }))
}

/// Run the full pipeline for one question.
///
/// adapter → normalizer → filter → aggregator → prompt → LLM.
pub async fn answer_question(state: &AppState, query: &str) -> Result<String, ChatError> {
    let start = Instant::now();
    let config = state.config.as_ref();

    let Tables { deals, work_orders } = load_tables(config, &state.http_client)
        .await
        .map_err(ChatError::DataUnavailable)?;

    if deals.is_empty() && work_orders.is_empty() {
        warn!("Data source yielded no rows");
        return Ok(NO_DATA_RESPONSE.to_string());
    }

    let deals = normalize_table(deals);
    let work_orders = normalize_table(work_orders);

    let client = LlmClient::new(LlmSettings::from_config(config), state.http_client.clone());
    let parser = config.llm.parse_queries.then_some(&client);
    let intent = parse_intent(parser, query, &config.analysis.sectors).await;
    info!(
        "Question intent: sector={:?} metric={}",
        intent.sector, intent.metric
    );

    let deals = filter_by_keyword(deals, intent.sector.as_deref());
    let work_orders = filter_by_keyword(work_orders, intent.sector.as_deref());

    let status_column = config.analysis.status_column.as_deref();
    let summary = Summary::new(
        &intent,
        summarize_table(&deals, status_column),
        summarize_table(&work_orders, status_column),
    );
    debug!("Summary: {:?}", summary);

    if summary.is_empty() {
        info!("No rows matched sector {:?}", intent.sector);
        return Ok(NO_DATA_RESPONSE.to_string());
    }

    let prompt = build_insight_prompt(query, &summary);
    let answer = client
        .complete(Some(ADVISOR_SYSTEM_PROMPT), &prompt)
        .await
        .map_err(ChatError::Llm)?;

    info!(
        "Answered with {} ({} deals, {} work orders) in {:.1}s",
        client.model_name(),
        summary.deals.rows,
        summary.work_orders.rows,
        start.elapsed().as_secs_f64()
    );

    Ok(answer)
}
