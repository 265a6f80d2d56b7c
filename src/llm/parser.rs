//! Extraction of SQL from completion text.
//!
//! Models are told to answer in raw JSON, but in practice wrap it in
//! markdown fences or reply with bare SQL. The parser tolerates both; a
//! completion it cannot make sense of is an error so the caller can move
//! on to the next model.

use crate::error::{QuerionError, Result};
use crate::llm::types::GeneratedQuery;
use regex::Regex;
use std::sync::OnceLock;

fn terminated_select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)SELECT\s+.*?;").expect("valid regex"))
}

fn trailing_select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)SELECT\s+.*$").expect("valid regex"))
}

/// Parses a raw completion into a [`GeneratedQuery`].
///
/// Tries the JSON envelope first (fences stripped, outermost braces
/// sliced), then falls back to lifting a SELECT statement straight out of
/// the text.
pub fn parse_completion(content: &str) -> Result<GeneratedQuery> {
    let cleaned = content.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            let json_str = &cleaned[start..=end];
            return serde_json::from_str(json_str).map_err(|e| {
                QuerionError::generation(format!("Model returned invalid JSON: {e}"))
            });
        }
    }

    let fallback = terminated_select_re()
        .find(content)
        .or_else(|| trailing_select_re().find(content));

    if let Some(matched) = fallback {
        return Ok(GeneratedQuery {
            sql: Some(matched.as_str().to_string()),
            explanation: "Generated SQL directly (non-JSON response).".to_string(),
        });
    }

    Err(QuerionError::generation(
        "Could not parse JSON or SQL from AI response.",
    ))
}
