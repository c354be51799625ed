use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use pratiti::config::AppConfig;
use pratiti::llm::OpenRouterClient;
use pratiti::logging::configure_logging;
use pratiti::orchestrator::{InsightOrchestrator, SentimentPolicy};
use pratiti::store::InsightStore;

/// Pratiti - Business Insight Engine. Paste a business news article to
/// generate contextual insights and supporting research links.
#[derive(Debug, Parser)]
#[command(name = "pratiti", version)]
struct Args {
    /// Path to a file holding the full article text; reads stdin when omitted
    article: Option<PathBuf>,

    /// Path of the insight store file (defaults to insights.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Where to write the generated narrative insight
    #[arg(long, default_value = "pratiti_insight.txt")]
    insight_out: PathBuf,

    /// Only classify sentiment, skip full generation
    #[arg(long)]
    preview_only: bool,

    /// Persist the sentiment preview instead of re-classifying during generation
    #[arg(long)]
    reuse_sentiment: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();
    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(store_path) = args.store {
        config.store_path = store_path;
    }

    let article_text = read_article(args.article.as_deref())?;
    if article_text.trim().is_empty() {
        bail!("article text is empty: paste the full article text before generating insights");
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            error!("failed to listen for ctrl-c");
        }
        let _ = cancel_tx.send(true);
    });

    let client = OpenRouterClient::new(&config);
    let store = InsightStore::new(&config.store_path);
    let policy = if args.reuse_sentiment {
        SentimentPolicy::Reuse
    } else {
        SentimentPolicy::Recompute
    };
    let orchestrator = InsightOrchestrator::new(client, store, policy);

    info!(model = %config.model, "classifying sentiment");
    let sentiment = orchestrator.preview_sentiment(&article_text).await;

    println!("Sentiment Analysis");
    println!();
    println!("Sentiment: {sentiment}");
    println!("Sentiment is classified by an LLM based on tone, language, and economic signals in the article.");

    if args.preview_only {
        return Ok(());
    }

    info!("running research agent and generating insights");
    let generated = orchestrator
        .generate(&article_text, Some(&sentiment), &cancel_rx)
        .await
        .context("error generating research-backed insight")?;

    println!();
    println!("Why This Matters");
    println!();
    println!("{}", generated.record.why_matters);
    println!();
    println!("Full Insight");
    println!();
    println!("{}", generated.highlighted_insight);
    println!();
    println!("How This Insight Was Derived");
    println!();
    println!("{}", generated.explanation);
    println!();
    println!("Related Research & References");
    println!();
    println!("{}", generated.record.research);

    fs::write(&args.insight_out, &generated.record.insight).with_context(|| {
        format!(
            "failed to write the insight to {}",
            args.insight_out.display()
        )
    })?;
    info!(path = %args.insight_out.display(), "wrote narrative insight");

    Ok(())
}

fn read_article(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read the article from {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read the article from stdin")?;
            Ok(buffer)
        }
    }
}
