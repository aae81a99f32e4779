use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::friend_list_repo;
use crate::error::DomainError;
use crate::services::accounts;
use crate::services::relationship::{self, RelationshipStatus};
use crate::web::middleware::auth::{AuthenticatedUser, Viewer};
use crate::web::AppState;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub account_id: String,
    pub username: String,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub profile_url: String,
    pub is_self: bool,
    pub is_friend: bool,
    pub can_send_request: bool,
    pub incoming_request_id: Option<String>,
    pub outgoing_request_id: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub async fn profile_handler(
    Extension(viewer): Extension<Viewer>,
    Path(account_id): Path<String>,
    Query(query): Query<NoticeQuery>,
    State(state): State<AppState>,
) -> Response {
    let account = match accounts::get(&state.pool, &account_id).await {
        Ok(account) => account,
        Err(DomainError::NotFound(_)) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Profile load failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let rel = match relationship::resolve(&state.pool, viewer.account_id(), &account.id).await {
        Ok(rel) => rel,
        Err(e) => {
            warn!("Relationship resolve failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let is_self = rel.is_self();
    let email = if is_self || account.hide_email == 0 {
        Some(account.email.clone())
    } else {
        None
    };
    let template = ProfileTemplate {
        profile_url: format!("{}/accounts/{}", state.base_url, account.id),
        account_id: account.id,
        username: account.username,
        email,
        profile_image: account.profile_image,
        is_self,
        is_friend: rel.status == RelationshipStatus::Friends,
        can_send_request: !is_self && rel.status == RelationshipStatus::NoRelation,
        incoming_request_id: (rel.status == RelationshipStatus::RequestSentToViewer)
            .then(|| rel.pending_request_id.clone())
            .flatten(),
        outgoing_request_id: (rel.status == RelationshipStatus::RequestSentByViewer)
            .then(|| rel.pending_request_id)
            .flatten(),
        notice: query.notice,
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Template)]
#[template(path = "edit_profile.html")]
pub struct EditProfileTemplate {
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub profile_image: String,
    pub hide_email: bool,
    pub error: Option<String>,
}

pub async fn edit_profile_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    if auth_user.id != account_id {
        return Redirect::to(&format!("/accounts/{}?notice=not-allowed", account_id))
            .into_response();
    }
    let account = match accounts::get(&pool, &account_id).await {
        Ok(account) => account,
        Err(DomainError::NotFound(_)) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Edit page load failed for {}: {}", account_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = EditProfileTemplate {
        account_id: account.id,
        email: account.email,
        username: account.username,
        profile_image: account.profile_image.unwrap_or_default(),
        hide_email: account.hide_email != 0,
        error: None,
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Deserialize)]
pub struct EditProfileForm {
    pub email: String,
    pub username: String,
    pub profile_image: Option<String>,
    // Checkbox: present when ticked, absent otherwise.
    pub hide_email: Option<String>,
}

pub async fn edit_profile_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<EditProfileForm>,
) -> Response {
    let profile_image = form
        .profile_image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let update = accounts::ProfileUpdate {
        email: form.email.clone(),
        username: form.username.clone(),
        profile_image,
        hide_email: form.hide_email.is_some(),
    };

    match accounts::update_profile(&pool, &auth_user.id, &account_id, update).await {
        Ok(()) => Redirect::to(&format!("/accounts/{}?notice=profile-updated", account_id))
            .into_response(),
        Err(e @ (DomainError::InvalidInput(_) | DomainError::Duplicate(_))) => {
            let template = EditProfileTemplate {
                account_id,
                email: form.email,
                username: form.username,
                profile_image: form.profile_image.unwrap_or_default(),
                hide_email: form.hide_email.is_some(),
                error: Some(e.to_string()),
            };
            Html(template.render().unwrap()).into_response()
        }
        Err(DomainError::Permission(_)) => {
            Redirect::to(&format!("/accounts/{}?notice=not-allowed", account_id)).into_response()
        }
        Err(e) => {
            warn!("Profile update failed for {}: {}", account_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub struct SearchResultView {
    pub account_id: String,
    pub username: String,
    pub email: Option<String>,
    pub is_friend: bool,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub results: Vec<SearchResultView>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn search_handler(
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<SearchQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    let q = query.q.unwrap_or_default();
    let hits = match accounts::search(&pool, &q).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!("Account search failed for {:?}: {}", q, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut results = Vec::with_capacity(hits.len());
    for account in hits {
        let is_friend = match viewer.account_id() {
            Some(viewer_id) => {
                match friend_list_repo::is_member(&pool, viewer_id, &account.id).await {
                    Ok(member) => member,
                    Err(e) => {
                        warn!("Friend marker lookup failed: {}", e);
                        false
                    }
                }
            }
            None => false,
        };
        let is_self = viewer.account_id() == Some(account.id.as_str());
        results.push(SearchResultView {
            email: (is_self || account.hide_email == 0).then(|| account.email.clone()),
            account_id: account.id,
            username: account.username,
            is_friend,
        });
    }

    let template = SearchResultsTemplate { query: q, results };
    Html(template.render().unwrap()).into_response()
}
