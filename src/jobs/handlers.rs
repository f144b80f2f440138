use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::extractors::{AuthUser, OptionalUser};
use crate::error::{ApiError, ApiResult};
use crate::jobs::dto::{
    CleanupResponse, DeleteJobResponse, JobDto, JobListResponse, JobPayload, JobResponse,
};
use crate::jobs::filter::{ListJobsParams, PaginationMeta};
use crate::jobs::sweep;
use crate::jobs::validate::validate_job_payload;
use crate::models::NewJob;
use crate::state::AppState;
use crate::store::Store;

/// A syntactically bad id is a client error, distinct from a well-formed id
/// that matches nothing.
fn parse_job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid job ID"))
}

#[instrument(skip(state, viewer, params))]
pub async fn list_jobs(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Query(params): Query<ListJobsParams>,
) -> ApiResult<Json<JobListResponse>> {
    if let Some(viewer) = &viewer {
        debug!(user_id = %viewer.id, "authenticated job listing");
    }

    let query = params.into_query().map_err(ApiError::Validation)?;
    let page = state
        .store
        .list_jobs(&query)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching jobs", e))?;
    let pagination = PaginationMeta::new(query.page, query.limit, page.total);

    // Opportunistic cleanup; the response above is already computed.
    sweep::spawn(state.store.clone());

    let now = OffsetDateTime::now_utc();
    Ok(Json(JobListResponse {
        success: true,
        data: page
            .items
            .into_iter()
            .map(|job| JobDto::from_job(job, now))
            .collect(),
        pagination,
    }))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let id = parse_job_id(&id)?;
    let job = state
        .store
        .find_job(id)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching job", e))?;

    match job {
        Some(job) if job.is_active => Ok(Json(JobResponse {
            success: true,
            message: None,
            data: JobDto::from_job(job, OffsetDateTime::now_utc()),
        })),
        _ => Err(ApiError::not_found("Job not found")),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<JobPayload>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let fields =
        validate_job_payload(&payload, OffsetDateTime::now_utc()).map_err(ApiError::Validation)?;

    let job = state
        .store
        .insert_job(NewJob {
            fields,
            created_by: user.id,
        })
        .await
        .map_err(|e| ApiError::internal("Server error while creating job", e))?;

    info!(job_id = %job.id, user_id = %user.id, "job created");
    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            success: true,
            message: Some("Job created successfully".into()),
            data: JobDto::from_job(job, OffsetDateTime::now_utc()),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<JobPayload>,
) -> ApiResult<Json<JobResponse>> {
    let fields =
        validate_job_payload(&payload, OffsetDateTime::now_utc()).map_err(ApiError::Validation)?;
    let id = parse_job_id(&id)?;

    let job = state
        .store
        .find_job(id)
        .await
        .map_err(|e| ApiError::internal("Server error while updating job", e))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.created_by != user.id {
        return Err(ApiError::forbidden("Not authorized to update this job"));
    }

    let job = state
        .store
        .update_job(id, fields)
        .await
        .map_err(|e| ApiError::internal("Server error while updating job", e))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    info!(job_id = %job.id, user_id = %user.id, "job updated");
    Ok(Json(JobResponse {
        success: true,
        message: Some("Job updated successfully".into()),
        data: JobDto::from_job(job, OffsetDateTime::now_utc()),
    }))
}

#[instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteJobResponse>> {
    let id = parse_job_id(&id)?;

    let job = state
        .store
        .find_job(id)
        .await
        .map_err(|e| ApiError::internal("Server error while deleting job", e))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.created_by != user.id {
        return Err(ApiError::forbidden("Not authorized to delete this job"));
    }

    // Deleting an already-inactive job is a no-op, not an error.
    state
        .store
        .deactivate_job(id)
        .await
        .map_err(|e| ApiError::internal("Server error while deleting job", e))?;

    info!(job_id = %id, user_id = %user.id, "job soft-deleted");
    Ok(Json(DeleteJobResponse {
        success: true,
        message: "Job deleted successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn cleanup_jobs(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    let count = state
        .store
        .deactivate_expired_jobs(OffsetDateTime::now_utc())
        .await
        .map_err(|e| ApiError::internal("Server error while cleaning expired jobs", e))?;

    info!(count, "manual expiry cleanup");
    Ok(Json(CleanupResponse {
        success: true,
        message: format!("Cleaned {} expired jobs", count),
        count,
    }))
}
