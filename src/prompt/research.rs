use crate::prompt::common::DONT_NARRATE;

pub const RESEARCH_ROLE: &str = "You are a research analyst helping senior executives.";

/// Generate a prompt for listing real, publicly available supporting sources
pub fn research_prompt(article_text: &str) -> String {
    format!(
        r#"You are a senior research analyst. Based on the article below, list the most relevant and credible publicly available research papers, policy briefs, or news articles from the internet that provide supporting context or critical background.

Each recommendation must include:
- Title or brief summary
- Source
- Link

Do not invent links. Only suggest links that are available publicly and are highly relevant.

Article:
{article}
{dont_narrate}"#,
        article = article_text,
        dont_narrate = DONT_NARRATE
    )
}
