use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::admins::domain::NewAdmin;
use crate::admins::repository::AdminRepository;
use crate::admins::service::{AdminService, AdminServiceError};

use super::{require_admin, verify_password, AdminClaims, AuthGuard, JwtService};

/// Auth endpoints over the admins collection.
pub struct AuthApi<S> {
    admins: Arc<AdminService<S>>,
    jwt: JwtService,
    allow_registration: bool,
}

impl<S: AdminRepository + 'static> AuthApi<S> {
    pub fn new(admins: Arc<AdminService<S>>, jwt: JwtService, allow_registration: bool) -> Self {
        Self {
            admins,
            jwt,
            allow_registration,
        }
    }
}

/// Router builder for login/me/register. Login and register are public;
/// `me` sits behind the same guard as the admin routes.
pub fn auth_router<S>(api: Arc<AuthApi<S>>, guard: Arc<AuthGuard>) -> Router
where
    S: AdminRepository + 'static,
{
    let me_route = Router::new()
        .route("/api/v1/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(guard, require_admin));

    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<S>))
        .route("/api/v1/auth/register", post(register_handler::<S>))
        .with_state(api)
        .merge(me_route)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    username: String,
    password: String,
}

pub(crate) async fn login_handler<S>(
    State(api): State<Arc<AuthApi<S>>>,
    axum::Json(body): axum::Json<LoginBody>,
) -> Response
where
    S: AdminRepository + 'static,
{
    let admin = match api.admins.find_by_username(&body.username).await {
        Ok(found) => found,
        Err(err) => return error_response(err),
    };

    // Soft-deleted accounts cannot log in.
    let admin = admin.filter(|record| record.metadata.deleted_at.is_none());
    let Some(admin) = admin else {
        return invalid_credentials();
    };
    if !verify_password(&body.password, &admin.password_hash) {
        return invalid_credentials();
    }

    match api.jwt.issue(&admin) {
        Ok(token) => (
            StatusCode::OK,
            axum::Json(json!({ "token": token, "user": admin.view() })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn me_handler(Extension(claims): Extension<AdminClaims>) -> Response {
    (StatusCode::OK, axum::Json(json!({ "user": claims }))).into_response()
}

pub(crate) async fn register_handler<S>(
    State(api): State<Arc<AuthApi<S>>>,
    axum::Json(new): axum::Json<NewAdmin>,
) -> Response
where
    S: AdminRepository + 'static,
{
    if !api.allow_registration {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(json!({ "error": "REGISTRATION_DISABLED" })),
        )
            .into_response();
    }

    match api.admins.create(new).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({ "error": "INVALID_CREDENTIALS" })),
    )
        .into_response()
}

fn error_response(err: AdminServiceError) -> Response {
    let status = match &err {
        AdminServiceError::NotFound => StatusCode::NOT_FOUND,
        AdminServiceError::UsernameTaken => StatusCode::CONFLICT,
        AdminServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}
