//! Query intent extraction.
//!
//! The LLM is asked for a `{"sector", "metric"}` object. When that call
//! fails or returns something unusable, local keyword detection over the
//! configured sector list takes over.

use crate::llm::client::LlmClient;
use crate::models::QueryIntent;
use crate::prompt::build_parse_prompt;
use tracing::{debug, warn};

/// Metric keywords, checked in order.
const METRIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("revenue", &["revenue", "billing", "billed", "collected", "collection"]),
    ("pipeline", &["pipeline", "deal", "funnel"]),
    ("work_orders", &["work", "order", "execution"]),
];

/// Extract the intent of a question, preferring the LLM when available.
pub async fn parse_intent(
    client: Option<&LlmClient>,
    query: &str,
    sectors: &[String],
) -> QueryIntent {
    let Some(client) = client else {
        return detect_intent(query, sectors);
    };

    match client.complete(None, &build_parse_prompt(query)).await {
        Ok(content) => match parse_intent_json(&content) {
            Some(intent) => {
                debug!("LLM intent: {:?}", intent);
                intent
            }
            None => {
                warn!("Could not parse intent from LLM reply; using keyword detection");
                detect_intent(query, sectors)
            }
        },
        Err(e) => {
            warn!("Intent extraction failed: {}; using keyword detection", e);
            detect_intent(query, sectors)
        }
    }
}

/// Parse the LLM's JSON reply, tolerating code fences and surrounding prose.
pub fn parse_intent_json(content: &str) -> Option<QueryIntent> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }

    let mut intent: QueryIntent = serde_json::from_str(&content[start..=end]).ok()?;
    intent.sector = intent
        .sector
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && s != "null" && s != "none");
    intent.metric = intent.metric.trim().to_lowercase();
    if intent.metric.is_empty() {
        intent.metric = QueryIntent::default().metric;
    }

    Some(intent)
}

/// Detect sector and metric by keyword matching.
pub fn detect_intent(query: &str, sectors: &[String]) -> QueryIntent {
    let lower = query.to_lowercase();

    let sector = sectors
        .iter()
        .map(|s| s.trim().to_lowercase())
        .find(|s| !s.is_empty() && lower.contains(s.as_str()));

    let metric = METRIC_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(metric, _)| metric.to_string())
        .unwrap_or_else(|| QueryIntent::default().metric);

    QueryIntent { sector, metric }
}
