use crate::{
    error::AppError,
    models::{User, ROLE_ADMIN, ROLE_SUPERADMIN},
    utils::jwt::decode_jwt,
};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response, Extension};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Extracted user information from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

/// Bearer authentication middleware.
///
/// Verifies the JWT from the Authorization header, checks the account is
/// still active, and adds user info to request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let auth_user = resolve_token(&db, &token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_string()))?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Optional-auth variant for public read routes: a valid token populates the
/// viewer identity, a missing or bad one leaves the request anonymous.
pub async fn optional_auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_bearer_token(&headers) {
        if let Ok(Some(auth_user)) = resolve_token(&db, &token).await {
            request.extensions_mut().insert(auth_user);
        }
    }
    Ok(next.run(request).await)
}

async fn resolve_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<AuthUser>, AppError> {
    let claims = match decode_jwt(token) {
        Ok(claims) => claims,
        Err(_) => return Ok(None),
    };

    let user_id: i32 = match claims.sub.parse() {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };

    let user = match User::find_by_id(user_id).one(db).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    if !user.is_active {
        return Ok(None);
    }

    Ok(Some(AuthUser {
        user_id: claims.sub,
        role: user.role,
    }))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Parse user_id from AuthUser string to i32
pub fn parse_user_id(auth_user: &AuthUser) -> crate::error::AppResult<i32> {
    auth_user
        .user_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID".to_string()))
}

/// Require admin or superadmin role; returns the acting user id.
pub fn require_admin(auth_user: &AuthUser) -> crate::error::AppResult<i32> {
    if auth_user.role != ROLE_ADMIN && auth_user.role != ROLE_SUPERADMIN {
        return Err(AppError::Forbidden);
    }
    parse_user_id(auth_user)
}

/// Require the superadmin role; returns the acting user id.
pub fn require_superadmin(auth_user: &AuthUser) -> crate::error::AppResult<i32> {
    if auth_user.role != ROLE_SUPERADMIN {
        return Err(AppError::Forbidden);
    }
    parse_user_id(auth_user)
}

use axum::extract::FromRequestParts;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))
    }
}

/// Extractor that never rejects: `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(role: &str) -> AuthUser {
        AuthUser {
            user_id: "7".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn admin_gate_accepts_both_admin_roles() {
        assert_eq!(require_admin(&auth("admin")).unwrap(), 7);
        assert_eq!(require_admin(&auth("superadmin")).unwrap(), 7);
    }

    #[test]
    fn admin_gate_rejects_plain_user() {
        assert!(matches!(
            require_admin(&auth("user")),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn superadmin_gate_rejects_admin() {
        assert!(matches!(
            require_superadmin(&auth("admin")),
            Err(AppError::Forbidden)
        ));
        assert_eq!(require_superadmin(&auth("superadmin")).unwrap(), 7);
    }
}
