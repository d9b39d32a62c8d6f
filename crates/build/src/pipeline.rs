use std::sync::Arc;

use buildhook_core::{
    Result,
    config::BuildConfig,
    models::{BuildOutcome, CommitState, CommitStatus, PushEvent},
};
use buildhook_github::{repo_identifier, status::StatusReporter};
use url::Url;

use crate::{classify::OutcomeClassifier, logs::BuildLogStore, workspace::RepositoryWorkspace};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BuildReport {
    pub id: u64,
    pub outcome: BuildOutcome,
}

/// Clones, builds and records a single pushed commit.
pub struct BuildPipeline {
    workspaces: RepositoryWorkspace,
    logs: Arc<BuildLogStore>,
    classifier: OutcomeClassifier,
    command: Vec<String>,
    reporter: Arc<dyn StatusReporter>,
}

impl BuildPipeline {
    pub fn new(
        workspaces: RepositoryWorkspace,
        logs: Arc<BuildLogStore>,
        classifier: OutcomeClassifier,
        command: Vec<String>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self { workspaces, logs, classifier, command, reporter }
    }

    pub fn from_config(
        config: &BuildConfig,
        logs: Arc<BuildLogStore>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self::new(
            RepositoryWorkspace::from_config(config),
            logs,
            OutcomeClassifier::from_config(config),
            config.command.clone(),
            reporter,
        )
    }

    pub fn logs(&self) -> &BuildLogStore { &self.logs }

    /// Build the pushed commit. Log links in commit statuses are resolved
    /// against `base_url` when given.
    pub async fn run(&self, event: &PushEvent, base_url: Option<&Url>) -> Result<BuildReport> {
        self.report(event, CommitState::Pending, "Build started", None).await;
        match self.build(event).await {
            Ok(report) => {
                let target_url =
                    base_url.and_then(|url| url.join(&format!("logs/{}", report.id)).ok());
                self.report(
                    event,
                    report.outcome.commit_state(),
                    report.outcome.description(),
                    target_url,
                )
                .await;
                Ok(report)
            }
            Err(e) => {
                self.report(event, CommitState::Error, "Build could not be run", None).await;
                Err(e)
            }
        }
    }

    async fn build(&self, event: &PushEvent) -> Result<BuildReport> {
        let workspace =
            self.workspaces.clone_repo(&event.repository_url, Some(&event.commit_sha)).await?;
        let output = self.workspaces.run(&self.command, &workspace).await;
        if let Err(e) = self.workspaces.destroy(workspace).await {
            tracing::warn!("Failed to remove workspace: {e}");
        }
        let output = output?;
        let outcome = self.classifier.classify(&output);
        let id = self.logs.store(&output, &event.commit_sha).await?;
        tracing::info!(
            "Build {} of {}@{} ({}): {}",
            id,
            event.repository_url,
            event.commit_sha,
            event.branch,
            outcome
        );
        Ok(BuildReport { id, outcome })
    }

    async fn report(
        &self,
        event: &PushEvent,
        state: CommitState,
        description: &str,
        target_url: Option<Url>,
    ) {
        let Some((owner, repo)) = repo_identifier(event) else {
            tracing::warn!("Cannot determine repository of {}, not reporting", event.repository_url);
            return;
        };
        let status = CommitStatus {
            owner,
            repo,
            sha: event.commit_sha.clone(),
            state,
            description: description.to_string(),
            target_url,
        };
        if let Err(e) = self.reporter.report(&status).await {
            tracing::warn!("{e:?}");
        }
    }
}
