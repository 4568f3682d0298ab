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

use super::domain::{MessageId, MessagePatch, NewMessage};
use super::repository::MessageRepository;
use super::service::{MessageService, MessageServiceError};

/// Router builder for the message CRUD surface; every route is
/// JWT-guarded.
pub fn message_router<S>(service: Arc<MessageService<S>>, guard: Arc<AuthGuard>) -> Router
where
    S: MessageRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/messages",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/messages/:message_id",
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

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    axum::Json(new): axum::Json<NewMessage>,
) -> Response
where
    S: MessageRepository + 'static,
{
    match service.create(new).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Query(page): Query<PageQuery>,
) -> Response
where
    S: MessageRepository + 'static,
{
    let limit = page.limit.unwrap_or(20).clamp(1, 100);
    let offset = page.offset.unwrap_or(0);
    match service.list(limit, offset).await {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Path(message_id): Path<String>,
) -> Response
where
    S: MessageRepository + 'static,
{
    match service.get(&MessageId(message_id)).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Path(message_id): Path<String>,
    axum::Json(patch): axum::Json<MessagePatch>,
) -> Response
where
    S: MessageRepository + 'static,
{
    match service.update(&MessageId(message_id), patch).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<MessageService<S>>>,
    Path(message_id): Path<String>,
) -> Response
where
    S: MessageRepository + 'static,
{
    let id = MessageId(message_id);
    match service.delete(&id).await {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(json!({ "id": id.0, "deleted": true })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: MessageServiceError) -> Response {
    let status = match &err {
        MessageServiceError::NotFound => StatusCode::NOT_FOUND,
        MessageServiceError::Storage(StoreError::Contention)
        | MessageServiceError::Storage(StoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        MessageServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}
