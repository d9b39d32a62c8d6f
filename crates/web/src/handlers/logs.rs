use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use buildhook_core::AppError;

use crate::AppState;

pub async fn list_logs(State(state): State<AppState>) -> Result<Response, AppError> {
    let table = state.pipeline.logs().list_all().await?;
    Ok(table.into_response())
}

pub async fn get_log(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let text = state.pipeline.logs().retrieve(&id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}
