pub mod config;
pub mod error;
pub mod models;
pub mod util;

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
pub use error::{AuthFailure, Error, ErrorKind, Result};
use url::Url;

pub enum AppError {
    Status(StatusCode),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Status(status) if status == StatusCode::NOT_FOUND => {
                (status, "Not found").into_response()
            }
            Self::Status(status) => status.into_response(),
            Self::Internal(err) => {
                let status = err
                    .downcast_ref::<Error>()
                    .map_or(StatusCode::INTERNAL_SERVER_ERROR, Error::status_code);
                if status.is_server_error() {
                    tracing::error!("{:?}", err);
                    (status, format!("Something went wrong: {}", err)).into_response()
                } else {
                    tracing::warn!("{}", err);
                    let message = err
                        .downcast_ref::<Error>()
                        .map_or_else(|| err.to_string(), Error::client_message);
                    (status, message).into_response()
                }
            }
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self { Self::Internal(err.into()) }
}

/// Extractor for the scheme and authority the request was addressed to.
/// Uses the `x-forwarded-proto` and `x-forwarded-host` headers if present.
pub struct BaseUrl(pub Option<Url>);

impl<S> FromRequestParts<S> for BaseUrl
where S: Send + Sync
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let get = |name: &str| parts.headers.get(name).and_then(|value| value.to_str().ok());
        let scheme = get("x-forwarded-proto")
            .map(str::to_string)
            .or_else(|| parts.uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());
        let mut host = get("x-forwarded-host")
            .or_else(|| get(header::HOST.as_str()))
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));
        if host.is_none()
            && let Ok(ConnectInfo(socket_addr)) =
                ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await
        {
            host = Some(socket_addr.to_string());
        }
        Ok(BaseUrl(host.and_then(|host| Url::parse(&format!("{scheme}://{host}/")).ok())))
    }
}
