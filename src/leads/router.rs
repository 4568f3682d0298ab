use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{require_admin, AdminClaims, AuthGuard};
use crate::notify::Notifier;
use crate::store::StoreError;

use super::domain::{LeadId, LeadPatch, PublicLeadForm, RequestMeta, StatusChange};
use super::repository::{DedupeStore, LeadFilter, LeadRepository};
use super::scoring::LeadCategory;
use super::service::{LeadService, LeadServiceError};

/// Router builder exposing the public intake route plus the
/// JWT-guarded admin routes.
pub fn lead_router<R, D, N>(
    service: Arc<LeadService<R, D, N>>,
    guard: Arc<AuthGuard>,
) -> Router
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    let admin_routes = Router::new()
        .route("/api/v1/leads", get(list_handler::<R, D, N>))
        .route(
            "/api/v1/leads/:lead_id",
            get(get_handler::<R, D, N>)
                .patch(patch_handler::<R, D, N>)
                .delete(delete_handler::<R, D, N>),
        )
        .route(
            "/api/v1/leads/:lead_id/status",
            patch(status_handler::<R, D, N>),
        )
        .route_layer(middleware::from_fn_with_state(guard, require_admin))
        .with_state(service.clone());

    Router::new()
        .route("/api/v1/leads/public", post(submit_handler::<R, D, N>))
        .with_state(service)
        .merge(admin_routes)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    category: Option<LeadCategory>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

impl From<ListQuery> for LeadFilter {
    fn from(query: ListQuery) -> Self {
        LeadFilter {
            status: query.status,
            suburb: query.suburb,
            category: query.category,
            limit: query.limit.unwrap_or(20).clamp(1, 100),
            offset: query.offset.unwrap_or(0),
        }
    }
}

pub(crate) async fn submit_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<PublicLeadForm>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    let meta = request_meta(&headers, None);
    match service.submit(form, meta).await {
        Ok(outcome) if outcome.is_new => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    match service.list(query.into()).await {
        Ok(leads) => (StatusCode::OK, axum::Json(leads)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    match service.get(&LeadId(lead_id)).await {
        Ok(lead) => (StatusCode::OK, axum::Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    Path(lead_id): Path<String>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    match service.change_status(&LeadId(lead_id), change).await {
        Ok(lead) => (StatusCode::OK, axum::Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn patch_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    Path(lead_id): Path<String>,
    claims: Option<Extension<AdminClaims>>,
    axum::Json(mut patch): axum::Json<LeadPatch>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    // Attribute an unannotated status change to the authenticated admin.
    if let (Some(Extension(claims)), Some(status)) = (claims, patch.status.as_mut()) {
        if status.changed_by.is_none() {
            status.changed_by = Some(claims.username.clone());
        }
    }

    match service.apply_patch(&LeadId(lead_id), patch).await {
        Ok(lead) => (StatusCode::OK, axum::Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, D, N>(
    State(service): State<Arc<LeadService<R, D, N>>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    match service.soft_delete(&LeadId(lead_id)).await {
        Ok(lead) => (StatusCode::OK, axum::Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

fn request_meta(headers: &HeaderMap, acting_user_id: Option<String>) -> RequestMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    RequestMeta {
        acting_user_id,
        ip: header("x-forwarded-for"),
        user_agent: header("user-agent"),
        referrer: header("referer"),
    }
}

fn error_response(err: LeadServiceError) -> Response {
    let status = match &err {
        LeadServiceError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadServiceError::NotFound => StatusCode::NOT_FOUND,
        LeadServiceError::Storage(StoreError::Contention)
        | LeadServiceError::Storage(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LeadServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
