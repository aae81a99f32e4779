use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::DomainError;
use crate::services::{accounts, friend_requests, friends};
use crate::web::middleware::auth::AuthenticatedUser;

pub struct FriendView {
    pub account_id: String,
    pub username: String,
}

#[derive(Template)]
#[template(path = "friend_list.html")]
pub struct FriendListTemplate {
    pub owner_id: String,
    pub owner_username: String,
    pub is_own: bool,
    pub friends: Vec<FriendView>,
}

pub async fn friend_list_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let list = match friends::get_or_create(&pool, &account_id).await {
        Ok(list) => list,
        Err(DomainError::NotFound(_)) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Friend list load failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let owner = match accounts::get(&pool, &account_id).await {
        Ok(owner) => owner,
        Err(e) => {
            warn!("Friend list owner load failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = FriendListTemplate {
        is_own: auth_user.id == list.owner_id,
        owner_id: list.owner_id,
        owner_username: owner.username,
        friends: list
            .members
            .into_iter()
            .map(|m| FriendView {
                account_id: m.id,
                username: m.username,
            })
            .collect(),
    };
    Html(template.render().unwrap()).into_response()
}

pub struct PendingRequestView {
    pub request_id: String,
    pub sender_id: String,
    pub sender_username: String,
}

#[derive(Template)]
#[template(path = "friend_requests.html")]
pub struct FriendRequestsTemplate {
    pub requests: Vec<PendingRequestView>,
}

pub async fn friend_requests_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let pending = match friend_requests::pending_for(&pool, &auth_user.id, &account_id).await {
        Ok(pending) => pending,
        Err(DomainError::Permission(_)) => {
            // You can only view your own friend requests.
            return Redirect::to(&format!(
                "/friends/{}/requests",
                auth_user.id
            ))
            .into_response();
        }
        Err(e) => {
            warn!("Friend request listing failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = FriendRequestsTemplate {
        requests: pending
            .into_iter()
            .map(|p| PendingRequestView {
                request_id: p.request.id,
                sender_id: p.sender.id,
                sender_username: p.sender.username,
            })
            .collect(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SendRequestForm {
    pub receiver_id: String,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HandleRequestForm {
    pub request_id: String,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFriendForm {
    pub friend_id: String,
    pub return_to: Option<String>,
}

pub async fn send_request_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<SendRequestForm>,
) -> Response {
    let notice = match friend_requests::send(&pool, &auth_user.id, &form.receiver_id).await {
        Ok(_) => "request-sent",
        Err(e) => {
            warn!("Friend request send failed: {}", e);
            notice_for_error(&e)
        }
    };
    let fallback = format!("/accounts/{}", form.receiver_id);
    redirect_with_notice(safe_return_to(form.return_to.as_deref(), &fallback), notice)
}

pub async fn cancel_request_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<HandleRequestForm>,
) -> Response {
    let (notice, fallback) = match friend_requests::cancel(&pool, &auth_user.id, &form.request_id).await
    {
        Ok(request) => ("request-cancelled", format!("/accounts/{}", request.receiver_id)),
        Err(e) => {
            warn!("Friend request cancel failed: {}", e);
            (notice_for_error(&e), format!("/accounts/{}", auth_user.id))
        }
    };
    redirect_with_notice(safe_return_to(form.return_to.as_deref(), &fallback), notice)
}

pub async fn accept_request_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<HandleRequestForm>,
) -> Response {
    let notice = match friend_requests::accept(&pool, &auth_user.id, &form.request_id).await {
        Ok(_) => "request-accepted",
        Err(e) => {
            warn!("Friend request accept failed: {}", e);
            notice_for_error(&e)
        }
    };
    let fallback = format!("/accounts/{}", auth_user.id);
    redirect_with_notice(safe_return_to(form.return_to.as_deref(), &fallback), notice)
}

pub async fn decline_request_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<HandleRequestForm>,
) -> Response {
    let notice = match friend_requests::decline(&pool, &auth_user.id, &form.request_id).await {
        Ok(_) => "request-declined",
        Err(e) => {
            warn!("Friend request decline failed: {}", e);
            notice_for_error(&e)
        }
    };
    let fallback = format!("/accounts/{}", auth_user.id);
    redirect_with_notice(safe_return_to(form.return_to.as_deref(), &fallback), notice)
}

pub async fn remove_friend_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<RemoveFriendForm>,
) -> Response {
    let notice = match friends::unfriend(&pool, &auth_user.id, &form.friend_id).await {
        Ok(()) => "friend-removed",
        Err(e) => {
            warn!("Unfriend failed: {}", e);
            notice_for_error(&e)
        }
    };
    let fallback = format!("/accounts/{}", form.friend_id);
    redirect_with_notice(safe_return_to(form.return_to.as_deref(), &fallback), notice)
}

fn notice_for_error(e: &DomainError) -> &'static str {
    match e {
        DomainError::NotFound(_) => "not-found",
        DomainError::Duplicate(_) => "already-pending",
        DomainError::SelfReference(_) => "self-reference",
        DomainError::InvalidState(_) => "not-active",
        DomainError::Permission(_) => "not-allowed",
        DomainError::InvalidInput(_) | DomainError::Database(_) => "error",
    }
}

fn safe_return_to<'a>(return_to: Option<&'a str>, fallback: &'a str) -> &'a str {
    return_to
        .filter(|s| s.starts_with('/') && !s.starts_with("//") && !s.contains("://"))
        .unwrap_or(fallback)
}

fn redirect_with_notice(target: &str, notice: &str) -> Response {
    let sep = if target.contains('?') { "&" } else { "?" };
    Redirect::to(&format!("{}{}notice={}", target, sep, notice)).into_response()
}
