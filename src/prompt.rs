//! Prompt assembly.
//!
//! Renders the aggregated summary and the founder's question into the
//! text sent to the LLM. Output is deterministic for a given summary.

use crate::analysis::format_status_counts;
use crate::models::{Summary, TableSummary};

/// System instructions for insight generation.
pub const ADVISOR_SYSTEM_PROMPT: &str = r#"You are a strategic business advisor for a founder.
You receive aggregated figures from the deal funnel and the work-order tracker.
Answer in concise prose. Never reproduce raw tables, row listings or CSV data."#;

/// Reply sent when the filtered tables hold no rows.
pub const NO_DATA_RESPONSE: &str =
    "No matching data found for this question. Try another sector or a broader question.";

/// Build the intent-extraction prompt.
pub fn build_parse_prompt(query: &str) -> String {
    format!(
        r#"Extract structured meaning from this founder-level business question.

Question: {}

Return ONLY valid JSON:
{{
  "sector": null or string,
  "metric": string
}}"#,
        query.trim()
    )
}

/// Build the insight prompt from the question and the computed summary.
pub fn build_insight_prompt(query: &str, summary: &Summary) -> String {
    let mut prompt = String::new();

    prompt.push_str("Founder Question:\n");
    prompt.push_str(query.trim());
    prompt.push_str("\n\n");

    prompt.push_str(&generate_summary_section(summary));

    prompt.push_str("Provide:\n");
    prompt.push_str("- Direct answer\n");
    prompt.push_str("- Strategic insight\n");
    prompt.push_str("- Risks\n");
    prompt.push_str("- Data quality caveats (mention the missing values)\n\n");
    prompt.push_str(
        "Do not dump raw tabular data; reason only from the aggregates above.\n",
    );

    prompt
}

/// Render the business data summary block.
pub fn generate_summary_section(summary: &Summary) -> String {
    let mut section = String::new();

    section.push_str("Business Data Summary:\n");
    section.push_str(&format!(
        "- Sector filter: {}\n",
        summary.sector.as_deref().unwrap_or("none")
    ));
    section.push_str(&format!("- Metric of interest: {}\n", summary.metric));
    section.push_str(&format!(
        "- Total pipeline value: {:.2}\n",
        summary.deals.numeric_total
    ));
    section.push_str(&format!(
        "- Total executed revenue: {:.2}\n",
        summary.work_orders.numeric_total
    ));
    section.push_str(&format!("- Number of deals: {}\n", summary.deals.rows));
    section.push_str(&format!(
        "- Number of work orders: {}\n",
        summary.work_orders.rows
    ));
    section.push_str(&format!(
        "- Deal status breakdown: {}\n",
        status_line(&summary.deals)
    ));
    section.push_str(&format!(
        "- Work order status breakdown: {}\n",
        status_line(&summary.work_orders)
    ));
    section.push_str(&format!(
        "- Missing values detected: {}\n\n",
        summary.missing_total()
    ));

    section
}

fn status_line(table: &TableSummary) -> String {
    format_status_counts(&table.status_counts)
}
