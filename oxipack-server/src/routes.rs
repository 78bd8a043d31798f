//! Request handlers.

use crate::AppState;
use crate::error::ApiError;
use crate::jobs::{Job, JobStatus};
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use oxipack_core::entry::{InputFile, sanitize_name};
use oxipack_core::error::{ErrorKind, PackError};
use oxipack_engine::{CompressionRequest, Engine};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_ALGORITHM: &str = "huffman";
const DEFAULT_LEVEL: &str = "5";

/// Body of an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// Id to poll and download with.
    pub archive_id: String,
    /// Name the archive will be served under.
    pub filename: String,
}

struct UploadForm {
    files: Vec<InputFile>,
    algorithm: String,
    level: String,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        files: Vec::new(),
        algorithm: DEFAULT_ALGORITHM.to_string(),
        level: DEFAULT_LEVEL.to_string(),
    };

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("files") => {
                // Parts without a file name are empty form slots
                let Some(raw_name) = field.file_name().filter(|n| !n.is_empty()) else {
                    continue;
                };
                let name = sanitize_name(raw_name)?;
                let bytes = field.bytes().await?;
                form.files.push(InputFile::new(name, bytes.to_vec()));
            }
            Some("algorithm") => form.algorithm = field.text().await?.trim().to_string(),
            Some("level") => form.level = field.text().await?.trim().to_string(),
            other => debug!(field = ?other, "ignoring form field"),
        }
    }

    if form.files.is_empty() {
        return Err(PackError::invalid_request("no files provided").into());
    }
    Ok(form)
}

/// `POST /compress`: validate the upload and start a job.
pub async fn compress(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let form = read_form(&mut multipart).await?;
    let request = CompressionRequest::from_fields(form.files, &form.algorithm, &form.level)?;
    request.validate(state.engine.config().max_payload_bytes)?;

    let archive_id = Engine::new_archive_id();
    let filename = request.algorithm.output_name(&archive_id);
    let job = Arc::new(Job::new(&archive_id, &filename, request.algorithm));
    state.jobs.insert(Arc::clone(&job), state.engine.store());

    info!(
        archive_id = %archive_id,
        algorithm = %request.algorithm,
        level = request.level.level(),
        files = request.files.len(),
        "job accepted"
    );

    let engine = Arc::clone(&state.engine);
    let id = archive_id.clone();
    tokio::task::spawn_blocking(move || {
        let cancel = job.cancel_token().clone();
        if let Err(err) = engine.compress_as(id, request, job.as_ref(), &cancel) {
            job.fail(err.to_string());
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            status: "accepted",
            archive_id,
            filename,
        }),
    ))
}

fn find_job(state: &AppState, archive_id: &str) -> Result<Arc<Job>, ApiError> {
    state
        .jobs
        .get(archive_id)
        .ok_or_else(|| PackError::not_found(archive_id).into())
}

/// `GET /jobs/{id}`: current state and progress.
pub async fn job_status(
    State(state): State<AppState>,
    Path(archive_id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    Ok(Json(find_job(&state, &archive_id)?.status()))
}

/// `DELETE /jobs/{id}`: cancel a running job.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(archive_id): Path<String>,
) -> Result<(StatusCode, Json<JobStatus>), ApiError> {
    let job = find_job(&state, &archive_id)?;
    if job.state().is_terminal() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            ErrorKind::InvalidRequest,
            format!("job {archive_id} already finished"),
        ));
    }

    job.cancel_token().cancel();
    info!(archive_id = %archive_id, "job cancellation requested");
    Ok((StatusCode::ACCEPTED, Json(job.status())))
}

/// `GET /download/{id}`: hand out a finished archive, once.
pub async fn download(
    State(state): State<AppState>,
    Path(archive_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let archive = state.engine.retrieve(&archive_id).inspect_err(|err| {
        warn!(archive_id = %archive_id, error = %err, "download refused");
    })?;
    state.jobs.remove(&archive_id);

    let disposition = format!("attachment; filename=\"{}\"", archive.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    ))
}
