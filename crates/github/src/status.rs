use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use buildhook_core::{
    config::GitHubConfig,
    models::{CommitState, CommitStatus},
};
use octocrab::{Octocrab, models::StatusState};

/// Publishes build states back to the source host.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, status: &CommitStatus) -> Result<()>;
}

/// Used when no API token is configured.
pub struct NoopStatusReporter;

#[async_trait]
impl StatusReporter for NoopStatusReporter {
    async fn report(&self, status: &CommitStatus) -> Result<()> {
        tracing::debug!(
            "Not reporting {} for {}/{}@{}: status reporting disabled",
            status.state,
            status.owner,
            status.repo,
            status.sha
        );
        Ok(())
    }
}

pub struct GitHubStatusReporter {
    client: Octocrab,
    context: String,
}

impl GitHubStatusReporter {
    pub fn new(token: &str, context: impl Into<String>) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client, context: context.into() })
    }
}

fn status_state(state: CommitState) -> StatusState {
    match state {
        CommitState::Pending => StatusState::Pending,
        CommitState::Success => StatusState::Success,
        CommitState::Failure => StatusState::Failure,
        CommitState::Error => StatusState::Error,
    }
}

#[async_trait]
impl StatusReporter for GitHubStatusReporter {
    async fn report(&self, status: &CommitStatus) -> Result<()> {
        let repos = self.client.repos(&status.owner, &status.repo);
        let mut builder = repos
            .create_status(status.sha.clone(), status_state(status.state))
            .context(self.context.clone())
            .description(status.description.clone());
        if let Some(target_url) = &status.target_url {
            builder = builder.target(target_url.to_string());
        }
        builder.send().await.with_context(|| {
            format!(
                "Failed to update commit status for {}/{}@{}",
                status.owner, status.repo, status.sha
            )
        })?;
        tracing::info!(
            "Updated commit status for {}/{}@{}: {}",
            status.owner,
            status.repo,
            status.sha,
            status.state
        );
        Ok(())
    }
}

/// Pick the reporter for the configured credentials.
pub fn reporter_from_config(config: &GitHubConfig) -> Result<Arc<dyn StatusReporter>> {
    let reporter: Arc<dyn StatusReporter> = match &config.token {
        Some(token) => Arc::new(GitHubStatusReporter::new(token, &config.status_context)?),
        None => {
            tracing::info!("No GitHub token configured, commit statuses will not be reported");
            Arc::new(NoopStatusReporter)
        }
    };
    Ok(reporter)
}
