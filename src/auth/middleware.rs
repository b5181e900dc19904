//! Authentication middleware and extractors

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::SharedState;
use crate::auth::jwt::AccessClaims;
use crate::error::{Error, Result};

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("empty auth header".to_string()))?
        .to_str()
        .map_err(|_| Error::Unauthorized("auth header is not valid text".to_string()))?;

    let mut parts = header.split(' ');
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            return Err(Error::Unauthorized(
                "invalid auth header, must be like `Bearer token`".to_string(),
            ))
        }
    };

    if scheme != "Bearer" {
        return Err(Error::Unauthorized(format!(
            "invalid auth scheme {}, must be Bearer",
            scheme
        )));
    }
    if token.is_empty() {
        return Err(Error::Unauthorized("token is empty".to_string()));
    }

    Ok(token)
}

fn claims_of(req: &Request) -> Result<&AccessClaims> {
    req.extensions()
        .get::<AccessClaims>()
        .ok_or_else(|| Error::Unauthorized("request was not identified".to_string()))
}

/// Reject requests without a valid access token and a live session; on
/// success the claims are available to handlers as an extension
pub async fn identify(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let token = bearer_token(req.headers())?.to_string();
    let claims = state.auth.authenticate(&token).await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin-only routes; layer after [`identify`]
pub async fn require_admin(req: Request, next: Next) -> std::result::Result<Response, Error> {
    if !claims_of(&req)?.is_admin() {
        return Err(Error::Forbidden("user is not an admin".to_string()));
    }
    Ok(next.run(req).await)
}

/// Attach the caller's [`ContentView`](crate::auth::ContentView); layer after [`identify`]
pub async fn age_gate(mut req: Request, next: Next) -> std::result::Result<Response, Error> {
    let view = claims_of(&req)?.view();
    req.extensions_mut().insert(view);
    Ok(next.run(req).await)
}
