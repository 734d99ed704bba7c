use anyhow::{Context, Result};
use console::style;

use super::{spinner, Workspace, INFO, SUCCESS};
use crate::ingest::{DocSource, DocType, RepoRef, SlackMessage};

const REPOSITORY: &str = "acme/payments-api";

const CODE_SAMPLES: &[(&str, &str)] = &[
    (
        "src/auth/tokens.py",
        r#"import jwt
from datetime import datetime, timedelta, timezone

TOKEN_TTL = timedelta(hours=24)


def issue_token(user_id, secret):
    """Create a signed session token for a user."""
    now = datetime.now(timezone.utc)
    payload = {"sub": user_id, "iat": now, "exp": now + TOKEN_TTL}
    return jwt.encode(payload, secret, algorithm="HS256")


def verify_token(token, secret):
    """Return the user id inside a valid token, or None."""
    try:
        payload = jwt.decode(token, secret, algorithms=["HS256"])
    except jwt.InvalidTokenError:
        return None
    return payload["sub"]
"#,
    ),
    (
        "src/billing/retry.rs",
        r#"use std::time::Duration;

/// Backoff schedule for failed card charges.
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay * 2u32.pow(attempt))
    }
}
"#,
    ),
];

const SETUP_GUIDE: &str = r#"# Payments API Onboarding

Welcome! This guide gets a new engineer from a fresh laptop to a running service.

## Local setup

1. Install Python 3.11 and Rust stable.
2. Copy `.env.example` to `.env` and ask in #payments-dev for the sandbox keys.
3. Run `make bootstrap` to install dependencies and create the local database.

## Running tests

Run `make test` for the unit suite. Integration tests need Docker; start them with `make test-integration`.

## Deploying

Merges to `main` deploy to staging automatically. Production deploys go out with the Tuesday release train; post in #releases before merging anything risky.
"#;

fn slack_thread() -> Vec<SlackMessage> {
    let mut first = SlackMessage::new(
        "maria",
        "Charges for EU cards keep failing in staging with a 402, anyone seen this?",
        "1717430400.000100",
    );
    first.thread_ts = Some("1717430400.000100".to_string());
    vec![
        first,
        SlackMessage::new(
            "dev",
            "Yes, the sandbox needs 3-D Secure enabled. Set STRIPE_FORCE_3DS=true in your .env",
            "1717430520.000200",
        ),
        SlackMessage::new(
            "maria",
            "That fixed it, thanks! Adding it to the onboarding doc.",
            "1717430700.000300",
        ),
    ]
}

/// Seeds the store with a small sample repository, guide and chat thread.
pub async fn run_demo(workspace: &Workspace) -> Result<()> {
    let chunker = &workspace.chunker;
    let repo = RepoRef::new(Some(REPOSITORY.to_string()), Some("main".to_string()), None);

    let mut chunks = Vec::new();
    for (path, content) in CODE_SAMPLES {
        chunks.extend(chunker.chunk_code(path, content, &repo));
    }
    chunks.extend(chunker.chunk_documentation(
        SETUP_GUIDE,
        &DocSource {
            title: Some("Payments API Onboarding".to_string()),
            url: Some("https://wiki.acme.dev/payments/onboarding".to_string()),
            author: Some("platform-team".to_string()),
            doc_type: DocType::Markdown,
        },
    ));
    chunks.extend(chunker.chunk_slack(&slack_thread(), Some("payments-dev")));

    let count = chunks.len();
    let pb = spinner(format!("Loading {count} sample chunks..."));
    let result = workspace.retriever.add_documents_batch(chunks).await;
    pb.finish_and_clear();
    result.context("Failed to load demo data")?;

    let stats = workspace.retriever.stats().await?;
    println!("{}Demo knowledge base ready ({} chunks added)\n", SUCCESS, style(count).cyan());
    for (source_type, n) in &stats.source_types {
        println!("  {:<16} {}", format!("{source_type}:"), style(n).green());
    }
    println!("\n{}Try:", INFO);
    for question in [
        "How do I set up my laptop?",
        "How long are session tokens valid?",
        "Why do EU card charges fail in staging?",
    ] {
        println!("  lorekeeper query {}", style(format!("\"{question}\"")).yellow());
    }
    Ok(())
}
