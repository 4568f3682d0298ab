use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{require_admin, AuthGuard};
use crate::store::StoreError;

use super::domain::{AdminId, AdminPatch, NewAdmin};
use super::repository::AdminRepository;
use super::service::{AdminService, AdminServiceError};

/// Router builder for the admin-record CRUD surface; every route is
/// JWT-guarded.
pub fn admin_router<S>(service: Arc<AdminService<S>>, guard: Arc<AuthGuard>) -> Router
where
    S: AdminRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admins",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/admins/:admin_id",
            get(get_handler::<S>)
                .patch(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route_layer(middleware::from_fn_with_state(guard, require_admin))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

impl PageQuery {
    pub(crate) fn bounds(&self) -> (usize, usize) {
        (self.limit.unwrap_or(20).clamp(1, 100), self.offset.unwrap_or(0))
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<AdminService<S>>>,
    axum::Json(new): axum::Json<NewAdmin>,
) -> Response
where
    S: AdminRepository + 'static,
{
    match service.create(new).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<AdminService<S>>>,
    Query(page): Query<PageQuery>,
) -> Response
where
    S: AdminRepository + 'static,
{
    let (limit, offset) = page.bounds();
    match service.list(limit, offset).await {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<AdminService<S>>>,
    Path(admin_id): Path<String>,
) -> Response
where
    S: AdminRepository + 'static,
{
    match service.get(&AdminId(admin_id)).await {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<AdminService<S>>>,
    Path(admin_id): Path<String>,
    axum::Json(patch): axum::Json<AdminPatch>,
) -> Response
where
    S: AdminRepository + 'static,
{
    match service.update(&AdminId(admin_id), patch).await {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<AdminService<S>>>,
    Path(admin_id): Path<String>,
) -> Response
where
    S: AdminRepository + 'static,
{
    match service.soft_delete(&AdminId(admin_id)).await {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AdminServiceError) -> Response {
    let status = match &err {
        AdminServiceError::NotFound => StatusCode::NOT_FOUND,
        AdminServiceError::UsernameTaken => StatusCode::CONFLICT,
        AdminServiceError::Storage(StoreError::Contention)
        | AdminServiceError::Storage(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AdminServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}
