//! API route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::server::SharedState;
use crate::auth::models::{ContentView, TokenPair, UserInfo, UserRole, MAX_AGE};
use crate::auth::AccessClaims;
use crate::error::{Error, Result};

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]+$").expect("valid username pattern"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid name pattern"));
static PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{8,16}$").expect("valid password pattern"));

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub name: String,
    pub age: i64,
    pub password: String,
}

impl SignUpRequest {
    /// Checks input shape and returns the age as stored
    pub fn validate(&self) -> Result<u8> {
        validate_username(&self.username)?;

        if !NAME.is_match(&self.name) {
            return Err(Error::Validation(
                "invalid name: must contain only letters".to_string(),
            ));
        }

        let age = u8::try_from(self.age)
            .ok()
            .filter(|age| (1..=MAX_AGE).contains(age))
            .ok_or_else(|| {
                Error::Validation(format!("invalid age: must be between 1 and {}", MAX_AGE))
            })?;

        validate_password(&self.password)?;
        Ok(age)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

fn validate_username(username: &str) -> Result<()> {
    if !USERNAME.is_match(username) {
        return Err(Error::Validation(
            "invalid username: must contain only letters and numbers".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if !PASSWORD.is_match(password) {
        return Err(Error::Validation(
            "invalid password: must be 8 to 16 letters and numbers".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub role: UserRole,
    pub age: u8,
    pub view: ContentView,
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>)>;

// Health check

pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("healthy"))
}

// Auth routes

pub async fn sign_up(
    State(state): State<SharedState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<SignUpResponse> {
    let age = req.validate()?;
    let id = state
        .auth
        .sign_up(&req.username, &req.name, age, &req.password)
        .await?;

    tracing::info!("Registered user {}", id);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(SignUpResponse { id }))))
}

pub async fn sign_in(
    State(state): State<SharedState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<TokenPair> {
    req.validate()?;
    let tokens = state.auth.sign_in(&req.username, &req.password).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(tokens))))
}

pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let tokens = state
        .auth
        .refresh(&req.access_token, &req.refresh_token)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(tokens))))
}

pub async fn logout(
    State(state): State<SharedState>,
    Extension(claims): Extension<AccessClaims>,
) -> ApiResult<&'static str> {
    state.auth.log_out(claims.user_id()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok("logged out"))))
}

// Identified routes

pub async fn me(
    Extension(claims): Extension<AccessClaims>,
    Extension(view): Extension<ContentView>,
) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::ok(MeResponse {
        id: claims.sub,
        role: claims.role,
        age: claims.age,
        view,
    }))
}

pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<UserInfo> {
    match state.auth.user(&id).await {
        Ok(user) => Ok((StatusCode::OK, Json(ApiResponse::ok(UserInfo::from(user))))),
        Err(Error::NotFound(what)) => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("{} not found", what)),
            }),
        )),
        Err(e) => Err(e),
    }
}
