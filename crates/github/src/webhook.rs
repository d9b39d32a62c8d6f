use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, Request},
    response::{IntoResponse, Response},
};
use buildhook_core::{AppError, config::Config};

use crate::signature::{self, SIGNATURE_HEADER};

pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Verified GitHub webhook delivery. The body is only exposed after its
/// signature has been checked against the configured secret.
#[derive(Clone)]
#[must_use]
pub struct GitHubEvent {
    pub kind: Option<String>,
    pub body: Bytes,
}

impl GitHubEvent {
    pub fn is_push(&self) -> bool { self.kind.as_deref() == Some("push") }
}

impl<S> FromRequest<S> for GitHubEvent
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync + Clone,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = req
            .headers()
            .get(EVENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let signature_header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let config = <Arc<Config>>::from_ref(state);
        let body = Bytes::from_request(req, state).await.map_err(IntoResponse::into_response)?;
        signature::verify(
            config.github.webhook_secret.as_bytes(),
            &body,
            signature_header.as_deref(),
        )
        .map_err(|e| AppError::from(e).into_response())?;
        Ok(GitHubEvent { kind, body })
    }
}
