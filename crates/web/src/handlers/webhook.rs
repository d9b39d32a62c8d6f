use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use buildhook_core::{AppError, BaseUrl, Error};
use buildhook_github::{push::parse_push_event, webhook::GitHubEvent};

use crate::AppState;

/// Webhook handler: the extractor has already verified the signature, so
/// what remains is decoding, filtering on event type and running the build.
pub async fn webhook(
    State(state): State<AppState>,
    BaseUrl(request_url): BaseUrl,
    event: GitHubEvent,
) -> Result<Response, AppError> {
    let payload: serde_json::Value =
        serde_json::from_slice(&event.body).map_err(Error::Validation)?;
    if !event.is_push() {
        tracing::info!("Ignoring {} event", event.kind.as_deref().unwrap_or("[unknown]"));
        return Ok((StatusCode::OK, "No push event received.").into_response());
    }
    let push = parse_push_event(payload)?;
    tracing::info!(
        "Received push to {} ({}) by {}: {}",
        push.branch,
        push.commit_sha,
        push.author,
        push.commit_message.lines().next().unwrap_or_default()
    );

    let base_url = state.config.server.public_url.clone().or(request_url);
    let report = state.pipeline.run(&push, base_url.as_ref()).await?;
    Ok((
        StatusCode::OK,
        format!("Push event received. Build {} finished: {}", report.id, report.outcome),
    )
        .into_response())
}
