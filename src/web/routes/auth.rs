use askama::Template;
use axum::{
    extract::{Request, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use cookie::Cookie;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::services::{accounts, sessions};
use crate::web::middleware::auth::SESSION_COOKIE;

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn register_page() -> Html<String> {
    let template = RegisterTemplate { error: None };
    Html(template.render().unwrap())
}

pub async fn register_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let input = accounts::RegistrationInput {
        email: form.email,
        username: form.username,
        password: form.password,
        profile_image: None,
    };
    let account = match accounts::register(&pool, input).await {
        Ok(account) => account,
        Err(e) => {
            let template = RegisterTemplate {
                error: Some(e.to_string()),
            };
            return Html(template.render().unwrap()).into_response();
        }
    };

    open_session(&pool, &account.id).await
}

pub async fn login_page() -> Html<String> {
    let template = LoginTemplate { error: None };
    Html(template.render().unwrap())
}

pub async fn login_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<LoginForm>,
) -> Response {
    let account = match accounts::authenticate(&pool, &form.email, &form.password).await {
        Ok(account) => account,
        Err(e) => {
            let template = LoginTemplate {
                error: Some(e.to_string()),
            };
            return Html(template.render().unwrap()).into_response();
        }
    };

    open_session(&pool, &account.id).await
}

async fn open_session(pool: &SqlitePool, account_id: &str) -> Response {
    let token = match sessions::start(pool, account_id).await {
        Ok(token) => token,
        Err(e) => {
            warn!("Could not open session for {}: {}", account_id, e);
            let template = LoginTemplate {
                error: Some("login failed, please try again".to_string()),
            };
            return Html(template.render().unwrap()).into_response();
        }
    };

    let mut session_cookie = Cookie::new(SESSION_COOKIE, token);
    session_cookie.set_path("/");
    session_cookie.set_http_only(true);
    session_cookie.set_same_site(cookie::SameSite::Lax);

    let mut response = Redirect::to(&format!("/accounts/{}", account_id)).into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        session_cookie.to_string().parse().unwrap(),
    );
    response
}

pub async fn logout_handler(State(pool): State<SqlitePool>, request: Request) -> Response {
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find_map(|c| c.strip_prefix(&format!("{SESSION_COOKIE}=")))
        });
    if let Some(token) = token {
        if let Err(e) = sessions::end(&pool, token).await {
            warn!("Session teardown failed: {}", e);
        }
    }

    // Clear the cookie regardless of whether the session row existed.
    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_path("/");
    session_cookie.set_http_only(true);
    session_cookie.set_same_site(cookie::SameSite::Lax);

    let mut response = Redirect::to("/login").into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        session_cookie.to_string().parse().unwrap(),
    );
    response
}
