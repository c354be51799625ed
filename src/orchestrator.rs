use chrono::Local;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::highlight::{highlight, DOMAIN_KEYWORDS};
use crate::llm::{CompletionClient, LlmError};
use crate::prompt;
use crate::store::{InsightRecord, InsightStore, StoreError};
use crate::TARGET_LLM_REQUEST;

/// Placeholder stored in place of a sentiment label when the classification
/// call fails. Sentiment is never fatal to a generation cycle.
pub const SENTIMENT_ERROR_PLACEHOLDER: &str = "Error detecting sentiment.";

/// How the full-generation cycle obtains the sentiment it persists. The eager
/// preview and the generation-time value can differ when the remote model is
/// non-deterministic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SentimentPolicy {
    /// Re-run the sentiment classification as the first generation step.
    #[default]
    Recompute,
    /// Carry the eagerly computed preview value into the persisted record.
    Reuse,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("a model call failed during generation")]
    Remote(#[from] LlmError),
    #[error("failed to persist the generated insight")]
    Store(#[from] StoreError),
    #[error("generation was cancelled")]
    Cancelled,
}

/// The outcome of one full generation cycle. The record holds the un-highlighted
/// narrative; the highlighted variant and the explanation are presentation-only.
#[derive(Debug)]
pub struct GeneratedInsight {
    pub record: InsightRecord,
    pub highlighted_insight: String,
    pub explanation: String,
}

/// Sequences the prompt builders and the model client into a complete insight
/// record, then hands the finished record to the store.
pub struct InsightOrchestrator<C: CompletionClient> {
    client: C,
    store: InsightStore,
    policy: SentimentPolicy,
}

impl<C: CompletionClient> InsightOrchestrator<C> {
    pub fn new(client: C, store: InsightStore, policy: SentimentPolicy) -> Self {
        Self {
            client,
            store,
            policy,
        }
    }

    /// Eager sentiment classification, independent of full generation. A
    /// failed call is recovered into the error placeholder so the preview
    /// never blocks the rest of the tool.
    pub async fn preview_sentiment(&self, article_text: &str) -> String {
        self.sentiment_or_placeholder(article_text).await
    }

    /// Runs the full generation cycle for a non-empty article: sentiment,
    /// research, tags, narrative insight, explanation. Any failure after the
    /// sentiment step aborts the cycle; nothing is persisted on failure.
    pub async fn generate(
        &self,
        article_text: &str,
        preview_sentiment: Option<&str>,
        cancel_rx: &watch::Receiver<bool>,
    ) -> Result<GeneratedInsight, GenerateError> {
        ensure_not_cancelled(cancel_rx)?;
        let sentiment = match (self.policy, preview_sentiment) {
            (SentimentPolicy::Reuse, Some(preview)) => preview.to_string(),
            _ => self.sentiment_or_placeholder(article_text).await,
        };

        ensure_not_cancelled(cancel_rx)?;
        let research_output = self
            .client
            .complete(prompt::RESEARCH_ROLE, &prompt::research_prompt(article_text))
            .await?;

        ensure_not_cancelled(cancel_rx)?;
        let tags_response = self
            .client
            .complete(prompt::TAGGING_ROLE, &prompt::tag_prompt(article_text))
            .await?;
        let tags = split_tags(&tags_response);

        ensure_not_cancelled(cancel_rx)?;
        let insight_text = self
            .client
            .complete(
                prompt::INSIGHT_ROLE,
                &prompt::insight_prompt(article_text, &research_output),
            )
            .await?;
        let why_matters = insight_text.lines().next().unwrap_or("N/A").to_string();

        ensure_not_cancelled(cancel_rx)?;
        let explanation = self
            .client
            .complete(
                prompt::EXPLANATION_ROLE,
                &prompt::explanation_prompt(&insight_text),
            )
            .await?;

        let keywords: Vec<&str> = tags
            .iter()
            .map(String::as_str)
            .chain(DOMAIN_KEYWORDS)
            .collect();
        let highlighted_insight = highlight(&insight_text, &keywords);

        let record = InsightRecord {
            timestamp: Local::now().to_rfc3339(),
            article: article_text.to_string(),
            insight: insight_text,
            research: research_output,
            why_matters,
            tags,
            sentiment,
        };
        self.store.append(&record)?;
        info!(tags = record.tags.len(), "generated and stored insight");

        Ok(GeneratedInsight {
            record,
            highlighted_insight,
            explanation,
        })
    }

    async fn sentiment_or_placeholder(&self, article_text: &str) -> String {
        match self
            .client
            .complete(
                prompt::SENTIMENT_ROLE,
                &prompt::sentiment_prompt(article_text),
            )
            .await
        {
            Ok(label) => label,
            Err(err) => {
                warn!(
                    target: TARGET_LLM_REQUEST,
                    error = %err,
                    "sentiment classification failed, using placeholder"
                );
                SENTIMENT_ERROR_PLACEHOLDER.to_string()
            }
        }
    }
}

/// Splits a comma-separated tag response into trimmed tags, dropping empty
/// entries. No deduplication, no case normalization; order is preserved.
fn split_tags(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn ensure_not_cancelled(cancel_rx: &watch::Receiver<bool>) -> Result<(), GenerateError> {
    if *cancel_rx.borrow() {
        info!("cancellation received, stopping generation");
        return Err(GenerateError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const ARTICLE: &str = "Inflation rose 2% in Q1.";

    /// Serves scripted responses in order and records the system role of each
    /// call, so tests can assert both outputs and call sequence.
    #[derive(Clone)]
    struct ScriptedClient {
        responses: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn roles_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            system_role: &str,
            _user_prompt: &str,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(system_role.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected completion call")
        }
    }

    fn transport_error() -> LlmError {
        LlmError::Timeout(Duration::from_secs(1))
    }

    fn ok(text: &str) -> Result<String, LlmError> {
        Ok(text.to_string())
    }

    fn store_in(dir: &tempfile::TempDir) -> InsightStore {
        InsightStore::new(dir.path().join("insights.json"))
    }

    fn not_cancelled() -> watch::Receiver<bool> {
        let (_tx, rx) = watch::channel(false);
        rx
    }

    #[tokio::test]
    async fn test_full_generation_assembles_and_persists_record() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![
            ok("Positive"),
            ok("1. RBI bulletin, rbi.org.in"),
            ok("Finance, Policy, Inflation"),
            ok("Line one.\nThe market absorbed the news."),
            ok("Derived from paragraph two."),
        ]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let generated = orchestrator
            .generate(ARTICLE, None, &not_cancelled())
            .await
            .unwrap();

        assert_eq!(generated.record.article, ARTICLE);
        assert_eq!(generated.record.sentiment, "Positive");
        assert_eq!(generated.record.research, "1. RBI bulletin, rbi.org.in");
        assert_eq!(generated.record.tags, vec!["Finance", "Policy", "Inflation"]);
        assert_eq!(generated.record.why_matters, "Line one.");
        assert_eq!(
            generated.record.insight,
            "Line one.\nThe market absorbed the news."
        );
        assert_eq!(generated.explanation, "Derived from paragraph two.");
        assert!(generated.highlighted_insight.contains("**market**"));
        // The persisted narrative stays un-highlighted.
        assert!(!generated.record.insight.contains("**"));

        let stored = store_in(&dir).load_all().unwrap();
        assert_eq!(stored, vec![generated.record]);
    }

    #[tokio::test]
    async fn test_research_failure_aborts_before_tag_step_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![ok("Neutral"), Err(transport_error())]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let err = orchestrator
            .generate(ARTICLE, None, &not_cancelled())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Remote(_)));
        assert_eq!(
            client.roles_called(),
            vec![prompt::SENTIMENT_ROLE, prompt::RESEARCH_ROLE]
        );
        assert!(store_in(&dir).load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reuse_policy_persists_the_preview_sentiment() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![
            ok("research"),
            ok("Finance"),
            ok("Narrative."),
            ok("Explanation."),
        ]);
        let orchestrator = InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Reuse);

        let generated = orchestrator
            .generate(ARTICLE, Some("Negative"), &not_cancelled())
            .await
            .unwrap();

        assert_eq!(generated.record.sentiment, "Negative");
        // No second sentiment call was made.
        assert_eq!(client.roles_called()[0], prompt::RESEARCH_ROLE);
    }

    #[tokio::test]
    async fn test_reuse_policy_without_preview_falls_back_to_classifying() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![
            ok("Neutral"),
            ok("research"),
            ok("Finance"),
            ok("Narrative."),
            ok("Explanation."),
        ]);
        let orchestrator = InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Reuse);

        let generated = orchestrator
            .generate(ARTICLE, None, &not_cancelled())
            .await
            .unwrap();

        assert_eq!(generated.record.sentiment, "Neutral");
        assert_eq!(client.roles_called()[0], prompt::SENTIMENT_ROLE);
    }

    #[tokio::test]
    async fn test_sentiment_failure_is_recovered_into_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![
            Err(transport_error()),
            ok("research"),
            ok("Finance"),
            ok("Narrative."),
            ok("Explanation."),
        ]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let generated = orchestrator
            .generate(ARTICLE, None, &not_cancelled())
            .await
            .unwrap();

        assert_eq!(generated.record.sentiment, SENTIMENT_ERROR_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_empty_narrative_yields_na_why_matters() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![
            ok("Neutral"),
            ok("research"),
            ok("Finance"),
            ok(""),
            ok("Explanation."),
        ]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let generated = orchestrator
            .generate(ARTICLE, None, &not_cancelled())
            .await
            .unwrap();

        assert_eq!(generated.record.why_matters, "N/A");
        assert_eq!(generated.record.insight, "");
    }

    #[tokio::test]
    async fn test_cancellation_aborts_before_any_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let (_tx, rx) = watch::channel(true);
        let err = orchestrator.generate(ARTICLE, None, &rx).await.unwrap_err();

        assert!(matches!(err, GenerateError::Cancelled));
        assert!(client.roles_called().is_empty());
        assert!(store_in(&dir).load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_sentiment_recovers_failures() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![Err(transport_error())]);
        let orchestrator =
            InsightOrchestrator::new(client.clone(), store_in(&dir), SentimentPolicy::Recompute);

        let sentiment = orchestrator.preview_sentiment(ARTICLE).await;
        assert_eq!(sentiment, SENTIMENT_ERROR_PLACEHOLDER);
    }

    #[test]
    fn test_split_tags_trims_and_preserves_order() {
        assert_eq!(
            split_tags("Finance, Policy, Inflation"),
            vec!["Finance", "Policy", "Inflation"]
        );
    }

    #[test]
    fn test_split_tags_drops_empty_entries_but_not_duplicates() {
        assert_eq!(
            split_tags("Finance,, Finance , "),
            vec!["Finance", "Finance"]
        );
    }
}
