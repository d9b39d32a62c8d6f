use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    routing::{MethodRouter, get, post},
};
use buildhook_core::AppError;

use crate::AppState;

mod logs;
mod webhook;

/// GitHub caps webhook payloads at 25 MB.
const WEBHOOK_BODY_LIMIT: usize = 25 * 1024 * 1024;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", webhook_route())
        .route("/webhook", webhook_route())
        .route("/logs", get(logs::list_logs))
        .route("/logs/{id}", get(logs::get_log))
        .fallback(fallback)
}

fn webhook_route() -> MethodRouter<AppState> {
    post(webhook::webhook).fallback(fallback).layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT))
}

async fn fallback(method: Method) -> AppError {
    if matches!(method, Method::GET | Method::HEAD | Method::POST) {
        AppError::Status(StatusCode::NOT_FOUND)
    } else {
        AppError::Status(StatusCode::METHOD_NOT_ALLOWED)
    }
}
