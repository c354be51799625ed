use crate::prompt::common::DONT_NARRATE;

pub const SENTIMENT_ROLE: &str = "You are a sentiment classifier.";
pub const TAGGING_ROLE: &str = "You are a tagging assistant.";

/// Generate a prompt for classifying an article's overall sentiment
pub fn sentiment_prompt(article_text: &str) -> String {
    format!(
        r#"Analyze the overall sentiment of the following article. Classify it as Positive, Negative, or Neutral. Provide only the label.

Article:
{article}
{dont_narrate}"#,
        article = article_text,
        dont_narrate = DONT_NARRATE
    )
}

/// Generate a prompt for categorizing an article into business topic tags
pub fn tag_prompt(article_text: &str) -> String {
    format!(
        r#"You are a financial analyst assistant. Categorize the article below into relevant business topics or sectors such as Finance, Energy, Technology, Policy, ESG, etc.
Respond with a comma-separated list of 3 to 6 tags.

Article:
{article}
{dont_narrate}"#,
        article = article_text,
        dont_narrate = DONT_NARRATE
    )
}
