//! HTTP 路由（axum）

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::error::ApiResult;
use super::service::{
    AbortResponse, CompanyInput, HebrewNameInput, JobService, PendingHebrewNames, RetryStarted, TemplateInput,
    WorkflowQueued,
};
use crate::infrastructure::{AbortAllReport, SessionSnapshot};
use crate::models::{ActivityLog, Contact, Job, Template};
use crate::orchestrator::WorkflowOptions;

#[derive(Debug, Deserialize)]
struct CreateJobBody {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompanyNameBody {
    company_name: String,
}

#[derive(Debug, Deserialize)]
struct HebrewNamesBody {
    names: Vec<HebrewNameInput>,
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    #[serde(default = "default_activity_limit")]
    limit: usize,
}

fn default_activity_limit() -> usize {
    50
}

pub fn router(service: JobService) -> Router {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/abort", post(abort_all))
        .route("/jobs/abort/:id", post(abort_job))
        .route("/jobs/session", get(current_session))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/contacts", get(job_contacts))
        .route("/jobs/:id/activity", get(job_activity))
        .route("/jobs/:id/company", post(submit_company).put(update_company))
        .route("/jobs/:id/workflow", post(trigger_workflow))
        .route("/jobs/:id/retry", post(retry_job))
        .route("/jobs/:id/pending-hebrew-names", get(pending_hebrew_names))
        .route("/jobs/:id/hebrew-names", post(submit_hebrew_names))
        .route("/jobs/:id/done", post(mark_done))
        .route("/jobs/:id/reject", post(mark_rejected))
        .route("/jobs/:id/reset", post(reset_job))
        .route("/jobs/:id/find-more", post(find_more))
        .route("/contacts/:id/replied", put(mark_contact_replied))
        .route("/contacts/:id", delete(delete_contact))
        .route("/templates", get(list_templates).post(create_template))
        .route("/activity", get(recent_activity))
        .with_state(service)
}

async fn list_jobs(State(service): State<JobService>) -> ApiResult<Json<Vec<Job>>> {
    service.list_jobs().map(Json)
}

async fn create_job(State(service): State<JobService>, Json(body): Json<CreateJobBody>) -> ApiResult<Json<Job>> {
    service.create_job(&body.url).map(Json)
}

async fn get_job(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.get_job(id).map(Json)
}

async fn job_contacts(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Vec<Contact>>> {
    service.job_contacts(id).map(Json)
}

async fn job_activity(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Vec<ActivityLog>>> {
    service.job_activity(id).map(Json)
}

async fn recent_activity(
    State(service): State<JobService>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    service.recent_activity(query.limit).map(Json)
}

async fn submit_company(
    State(service): State<JobService>,
    Path(id): Path<i64>,
    Json(body): Json<CompanyInput>,
) -> ApiResult<Json<Job>> {
    service.submit_company(id, &body).map(Json)
}

async fn update_company(
    State(service): State<JobService>,
    Path(id): Path<i64>,
    Json(body): Json<CompanyNameBody>,
) -> ApiResult<Json<Job>> {
    service.update_company(id, &body.company_name).map(Json)
}

async fn trigger_workflow(
    State(service): State<JobService>,
    Path(id): Path<i64>,
    body: Option<Json<WorkflowOptions>>,
) -> ApiResult<Json<WorkflowQueued>> {
    let options = body.map(|Json(options)| options).unwrap_or_default();
    service.trigger_workflow(id, options).map(Json)
}

async fn retry_job(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<RetryStarted>> {
    service.retry_job(id).map(Json)
}

async fn abort_all(State(service): State<JobService>) -> Json<AbortAllReport> {
    Json(service.abort_all())
}

async fn abort_job(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<AbortResponse>> {
    service.abort_job(id).map(Json)
}

async fn current_session(State(service): State<JobService>) -> Json<SessionSnapshot> {
    Json(service.current_session())
}

async fn pending_hebrew_names(
    State(service): State<JobService>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PendingHebrewNames>> {
    service.pending_hebrew_names(id).map(Json)
}

async fn submit_hebrew_names(
    State(service): State<JobService>,
    Path(id): Path<i64>,
    Json(body): Json<HebrewNamesBody>,
) -> ApiResult<Json<WorkflowQueued>> {
    service.submit_hebrew_names(id, &body.names).map(Json)
}

async fn mark_done(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.mark_done(id).map(Json)
}

async fn mark_rejected(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.mark_rejected(id).map(Json)
}

async fn reset_job(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.reset_job(id).map(Json)
}

async fn find_more(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<WorkflowQueued>> {
    service.find_more(id).map(Json)
}

async fn mark_contact_replied(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.mark_contact_replied(id).map(Json)
}

async fn delete_contact(State(service): State<JobService>, Path(id): Path<i64>) -> ApiResult<Json<Job>> {
    service.delete_contact(id).map(Json)
}

async fn list_templates(State(service): State<JobService>) -> ApiResult<Json<Vec<Template>>> {
    service.list_templates().map(Json)
}

async fn create_template(
    State(service): State<JobService>,
    Json(body): Json<TemplateInput>,
) -> ApiResult<Json<Template>> {
    service.create_template(&body).map(Json)
}
