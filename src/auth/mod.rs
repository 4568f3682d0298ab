//! Admin authentication: JWT mint/verify, password digests, and the
//! bearer-token guard applied to admin routes.

pub mod router;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::admins::domain::AdminRecord;

pub use router::{auth_router, AuthApi};

/// JWT claims issued to authenticated admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Token mint/verify service backed by a shared HS256 secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, admin: &AdminRecord) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: admin.admin_id.0.clone(),
            username: admin.username.clone(),
            email: admin.email.clone(),
            name: format!("{} {}", admin.first_name, admin.last_name)
                .trim()
                .to_string(),
            role: admin.role.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature, expiry, and issuer.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<AdminClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

/// Accept `Bearer <token>` or a bare token value.
pub fn extract_bearer(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header).trim()
}

/// Salted SHA-256 digest in `sha256$<salt>$<digest>` form.
pub fn hash_password(plain: &str) -> String {
    let salt = hex::encode(Uuid::new_v4().into_bytes());
    let digest = digest_with_salt(plain, &salt);
    format!("sha256${salt}${digest}")
}

pub fn verify_password(plain: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("sha256"), Some(salt), Some(digest), None) => digest_with_salt(plain, salt) == digest,
        _ => false,
    }
}

fn digest_with_salt(plain: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shared state for the admin-route guard.
pub struct AuthGuard {
    pub jwt: JwtService,
    /// Bypass for local and staged environments.
    pub disabled: bool,
}

/// Middleware protecting admin routes: verified claims land in request
/// extensions, anything else answers 401.
pub async fn require_admin(
    State(guard): State<Arc<AuthGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    if guard.disabled {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(extract_bearer)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return unauthenticated();
    };

    match guard.jwt.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(_) => unauthenticated(),
    }
}

fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({ "error": "UNAUTHENTICATED" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admins::domain::AdminId;
    use crate::store::DocumentMetadata;

    fn test_service() -> JwtService {
        JwtService::new("test-secret-key", "leadflow".to_string(), 24)
    }

    fn sample_admin() -> AdminRecord {
        AdminRecord {
            admin_id: AdminId("admin-1".to_string()),
            username: "jsmith".to_string(),
            password_hash: hash_password("hunter22"),
            first_name: "Jordan".to_string(),
            last_name: "Smith".to_string(),
            email: "jordan@example.com".to_string(),
            role: "admin".to_string(),
            metadata: DocumentMetadata::seed(Utc::now()),
        }
    }

    #[test]
    fn roundtrip_token() {
        let svc = test_service();
        let token = svc.issue(&sample_admin()).expect("token issues");
        let claims = svc.verify(&token).expect("token verifies");
        assert_eq!(claims.username, "jsmith");
        assert_eq!(claims.iss, "leadflow");
        assert_eq!(claims.name, "Jordan Smith");
    }

    #[test]
    fn rejects_invalid_token() {
        let svc = test_service();
        assert!(svc.verify("garbage").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let svc1 = JwtService::new("secret-a", "leadflow".to_string(), 24);
        let svc2 = JwtService::new("secret-b", "leadflow".to_string(), 24);
        let token = svc1.issue(&sample_admin()).expect("token issues");
        assert!(svc2.verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer() {
        let issuing = JwtService::new("secret", "leadflow".to_string(), 24);
        let verifying = JwtService::new("secret", "other-service".to_string(), 24);
        let token = issuing.issue(&sample_admin()).expect("token issues");
        assert!(verifying.verify(&token).is_err());
    }

    #[test]
    fn token_expiry_matches_ttl() {
        let svc = test_service();
        let token = svc.issue(&sample_admin()).expect("token issues");
        let claims = svc.verify(&token).expect("token verifies");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn bearer_extraction_accepts_both_shapes() {
        assert_eq!(extract_bearer("Bearer abc123"), "abc123");
        assert_eq!(extract_bearer("abc123"), "abc123");
    }

    #[test]
    fn password_digests_verify_and_reject() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
        assert!(!verify_password("correct horse", "not-a-digest"));
    }

    #[test]
    fn password_digests_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
