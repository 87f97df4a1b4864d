use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;
use crate::auth::hashing;
use crate::auth::models::{AuthError, TokenPayload};
use crate::domain::{NewUser, UpdateUser, User, UserId, UserRole};
use crate::errors::Error;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct UpdateUserBody {
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListUsersQuery {
    /// `(limit, offset)` for a 1-based page.
    pub fn limit_offset(&self) -> Result<(i64, i64), ApiError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page < 1 {
            return Err(ApiError::bad_request("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ApiError::bad_request(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| ApiError::bad_request("page is out of range"))?;
        Ok((limit, offset))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserList {
    pub items: Vec<User>,
    pub page: i64,
    pub limit: i64,
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("user id must be a UUID"))?;
    Ok(UserId::from(raw))
}

async fn hash_in_background(password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || hashing::hash_password(&password))
        .await
        .map_err(|err| Error::internal(format!("Password hashing task failed: {}", err)))??;
    Ok(hash)
}

/// Members may edit only their own record and never a role; admins may edit anyone.
pub fn authorize_update(
    caller: &TokenPayload,
    target: &UserId,
    body: &UpdateUserBody,
) -> Result<(), AuthError> {
    if caller.is_admin() {
        return Ok(());
    }
    if &caller.user_id != target || body.role.is_some() {
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

/// `POST /register`: create a user. Only admins may create other admins.
pub async fn register_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<TokenPayload>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let Json(body) = body.map_err(|err| ApiError::bad_request(err.body_text()))?;
    body.validate().map_err(|err| ApiError::from(Error::from(err)))?;

    if body.role == UserRole::Admin && !caller.is_admin() {
        warn!(user_id = %caller.user_id, "non-admin attempted to register an admin");
        return Err(AuthError::Forbidden.into());
    }

    let password_hash = hash_in_background(body.password).await?;

    let user = state
        .users
        .create_user(NewUser {
            id: UserId::new(),
            username: body.username,
            email: body.email,
            password_hash,
            role: body.role,
        })
        .await?;

    info!(user_id = %user.id, created_by = %caller.user_id, role = %user.role, "user registered");
    Ok(ApiResponse::created("user registered", user))
}

/// `GET /users/{id}`
pub async fn get_user_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<User>, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state.users.get_user(&id).await?.ok_or_else(|| Error::not_found("User", &id))?;
    Ok(ApiResponse::ok("user found", user))
}

/// `PUT /users/{id}`: merge the given fields into the user. A new password is rehashed.
pub async fn update_user_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<TokenPayload>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserBody>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let id = parse_user_id(&id)?;
    let Json(body) = body.map_err(|err| ApiError::bad_request(err.body_text()))?;
    body.validate().map_err(|err| ApiError::from(Error::from(err)))?;

    if let Err(err) = authorize_update(&caller, &id, &body) {
        warn!(user_id = %caller.user_id, target = %id, "user update rejected");
        return Err(err.into());
    }

    let password_hash = match body.password {
        Some(password) => Some(hash_in_background(password).await?),
        None => None,
    };
    let update = UpdateUser {
        username: body.username,
        email: body.email,
        password_hash,
        role: body.role,
    };
    let role_changed = update.role.is_some();

    let user = state.users.update_user(&id, update).await?;

    info!(user_id = %user.id, updated_by = %caller.user_id, role = %user.role, role_changed, "user updated");
    Ok(ApiResponse::ok("user updated", user))
}

/// `GET /users?page=&limit=` (admin)
pub async fn list_users_handler(
    State(state): State<ApiState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiResponse<UserList>, ApiError> {
    let (limit, offset) = query.limit_offset()?;
    let items = state.users.list_users(limit, offset).await?;
    Ok(ApiResponse::ok(
        "users listed",
        UserList { items, page: query.page.unwrap_or(1), limit },
    ))
}

/// `DELETE /users/{id}` (admin)
pub async fn delete_user_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<TokenPayload>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let id = parse_user_id(&id)?;
    state.users.delete_user(&id).await?;
    info!(user_id = %id, deleted_by = %caller.user_id, "user deleted");
    Ok(ApiResponse::new(axum::http::StatusCode::OK, "user deleted", None))
}
