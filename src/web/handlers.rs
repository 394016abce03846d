use axum::{
    Form, Json,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use log::{error, info};
use serde::{Deserialize, Serialize};

use super::{AppState, page};
use crate::domain::SessionRecord;
use crate::error::DraftgateError;

/// File name offered for the exported report
pub const EXPORT_FILE_NAME: &str = "verified_report.md";

#[derive(Debug, Deserialize)]
pub struct RunForm {
    #[serde(default)]
    pub task: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RunRequest {
    #[serde(default)]
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportForm {
    #[serde(default)]
    pub report: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &DraftgateError) -> StatusCode {
    if err.is_collaborator_failure() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// JSON error wrapper for the API routes
pub struct ApiError(DraftgateError);

impl From<DraftgateError> for ApiError {
    fn from(err: DraftgateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn index() -> Html<String> {
    Html(page::index_page())
}

/// Form submission from the UI. A blank task leaves the page idle.
pub async fn run_form(State(state): State<AppState>, Form(form): Form<RunForm>) -> Response {
    if form.task.trim().is_empty() {
        return Html(page::index_page()).into_response();
    }

    info!("UI run requested: {:?}", form.task);
    match state.runner.run(form.task.clone()).await {
        Ok(session) => Html(page::result_page(&session)).into_response(),
        Err(err) => {
            error!("Run failed: {}", err);
            (status_for(&err), Html(page::error_page(&form.task, &err.to_string()))).into_response()
        }
    }
}

/// JSON API: run the loop and return the full session record.
pub async fn run_api(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<SessionRecord>, ApiError> {
    info!("API run requested: {:?}", request.task);
    let session = state.runner.run(request.task).await.map_err(|err| {
        error!("Run failed: {}", err);
        err
    })?;
    Ok(Json(session))
}

/// Return the report as a downloadable Markdown file.
/// Browsers submit form text with CRLF line endings; those are folded back.
pub async fn export(Form(form): Form<ExportForm>) -> impl IntoResponse {
    let report = form.report.replace("\r\n", "\n");
    (
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        report,
    )
}
