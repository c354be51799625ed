use crate::prompt::common::DONT_NARRATE;

pub const INSIGHT_ROLE: &str = "You are a financial research assistant.";
pub const EXPLANATION_ROLE: &str = "You explain AI-generated insights clearly.";

/// Generate a prompt for producing a single blended narrative insight,
/// optionally grounded in previously gathered research context
pub fn insight_prompt(article_text: &str, research_context: &str) -> String {
    format!(
        r#"You are Pratiti - an advanced financial research analyst. Your job is to read the news article below and produce a single blended narrative insight.

Your insight must include:
- A one-line summary of "Why This Matters"
- Contextual summary of the article
- Historical or global comparisons if relevant
- Sector or market impact
- Forward-looking commentary with reasoning

Article:
{article}

Relevant research context:
{research}
{dont_narrate}"#,
        article = article_text,
        research = research_context,
        dont_narrate = DONT_NARRATE
    )
}

/// Generate a prompt for explaining how a finished insight was derived
pub fn explanation_prompt(insight: &str) -> String {
    format!(
        r#"Explain how the following insight was derived, focusing only on:
- Sector and market impact
- Forward-looking commentary with reasoning

For each, identify what parts of the article contributed to the conclusions, and any assumptions or signals used.

Insight:
{insight}
{dont_narrate}"#,
        insight = insight,
        dont_narrate = DONT_NARRATE
    )
}
