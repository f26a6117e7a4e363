//! Analysis Prompt Builder
//!
//! Renders a news snapshot and an optional focus query into the prompt sent to
//! the model. The layout and wording are stable: stored transcripts are compared
//! against it byte for byte, so any change here is a breaking change.

use std::fmt::Write;

use super::news::{Article, NewsSnapshot};

const PREAMBLE: &str = "Based on the following financial news:\n\n";

const INSTRUCTIONS: &str = "\n\nProvide a detailed analysis including:
1. Key market trends and patterns
2. Potential impact on major stock sectors
3. Risk assessment and trading considerations
4. Short-term market predictions (next 24-48 hours)
5. Long-term implications for affected sectors

";

/// Render the per-category news context block
pub fn financial_context(snapshot: &NewsSnapshot) -> String {
    let mut context = format!("Financial News Analysis for {}\n\n", snapshot.date);

    for (category, articles) in snapshot.iter_categories() {
        let _ = write!(context, "\n{} NEWS:\n", category.to_uppercase());
        for article in articles {
            push_article(&mut context, article);
        }
    }

    context
}

fn push_article(out: &mut String, article: &Article) {
    let _ = writeln!(out, "- {}", article.headline);
    if let Some(summary) = article.summary_text() {
        let _ = writeln!(out, "  Summary: {}", summary);
    }
    if !article.related_stocks.is_empty() {
        let _ = writeln!(out, "  Related Stocks: {}", article.related_stocks.join(", "));
    }
    let _ = write!(out, "  Time: {}\n\n", article.time);
}

/// Build the full analysis prompt.
///
/// An empty `query` is treated as absent; any other query is appended verbatim.
pub fn analysis_prompt(snapshot: &NewsSnapshot, query: Option<&str>) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str(&financial_context(snapshot));
    prompt.push_str(INSTRUCTIONS);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let _ = write!(prompt, "\nSpecific focus on: {}", query);
    }

    prompt
}
