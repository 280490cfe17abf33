//! Parsing model output into an [`AnalysisResult`]

use crate::error::{Error, Result};
use crate::types::AnalysisResult;

/// Parse raw model text into a JSON object.
///
/// Tolerates markdown code fences and prose around the object; anything that
/// is not a JSON object is an analysis error.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let body = strip_code_fence(raw.trim());

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return AnalysisResult::from_value(value);
    }

    let (start, end) = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(Error::analysis(format!(
                "model response contained no JSON object: {}",
                preview(body)
            )))
        }
    };

    let value: serde_json::Value = serde_json::from_str(&body[start..=end]).map_err(|e| {
        Error::analysis(format!("model returned invalid JSON ({}): {}", e, preview(body)))
    })?;
    AnalysisResult::from_value(value)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the optional language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
