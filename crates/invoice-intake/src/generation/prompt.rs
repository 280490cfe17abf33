//! Prompt templates for invoice analysis

/// Marker appended when invoice content is cut to fit the model input
pub const TRUNCATION_MARKER: &str = "\n[... content truncated ...]";

/// Prompt builder for structured invoice extraction
pub struct PromptBuilder;

impl PromptBuilder {
    /// System instructions shared by all backends
    pub fn system_instructions() -> &'static str {
        r#"You are a cloud cost analyst. You read cloud-billing invoices (AWS, Azure, GCP and others) and return a single JSON object summarizing spend efficiency.

Return ONLY a JSON object with these fields:
- "score": integer 0-100, preliminary efficiency score
- "currency": ISO 4217 code of the invoice, or null if unknown
- "totalSpend": number, invoice total, or null if unknown
- "spendCoverage": array of spend categories present (e.g. "Compute", "Storage", "Network", "Database", "AI/ML")
- "aiSignals": boolean, true when AI/ML services appear on the invoice
- "wasteSignals": short sentence describing idle or overprovisioned resources
- "commitmentCoverage": short sentence on reserved/committed vs on-demand usage
- "optimizationPotential": short estimate such as "Estimated: 12-28%"
- "lineItems": array of {"service": string, "amount": number} for the largest charges

If the content says the PDF appears to be scanned, base the summary on whatever is available and keep the score conservative.
Do not include any text outside the JSON object."#
    }

    /// Build the user prompt for one invoice
    pub fn build_invoice_prompt(content: &str, filename: &str, max_chars: usize) -> String {
        format!(
            "INVOICE FILE: {filename}\n\nINVOICE CONTENT:\n{content}\n\nReturn the JSON summary now:",
            filename = filename,
            content = Self::truncate(content, max_chars),
        )
    }

    /// Full single-string prompt for completion-style backends
    pub fn build_completion_prompt(content: &str, filename: &str, max_chars: usize) -> String {
        format!(
            "{}\n\n{}",
            Self::system_instructions(),
            Self::build_invoice_prompt(content, filename, max_chars)
        )
    }

    /// Cut `content` to at most `max_chars` characters, marking the cut
    pub fn truncate(content: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
        match content.char_indices().nth(max_chars) {
            None => std::borrow::Cow::Borrowed(content),
            Some((byte_idx, _)) => {
                tracing::debug!(max_chars, "Truncating invoice content for prompt");
                std::borrow::Cow::Owned(format!("{}{}", &content[..byte_idx], TRUNCATION_MARKER))
            }
        }
    }
}
