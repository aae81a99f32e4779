use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    Extension,
};

use crate::web::middleware::auth::Viewer;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub viewer_id: Option<String>,
    pub build_id: &'static str,
}

pub async fn home_handler(Extension(viewer): Extension<Viewer>) -> Response {
    let template = HomeTemplate {
        viewer_id: viewer.account_id().map(|s| s.to_string()),
        build_id: env!("MUTUALS_BUILD_ID"),
    };
    Html(template.render().unwrap()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_shows_the_running_build() {
        let template = HomeTemplate {
            viewer_id: None,
            build_id: env!("MUTUALS_BUILD_ID"),
        };
        let html = template.render().unwrap();
        assert!(html.contains(env!("MUTUALS_BUILD_ID")));
        assert!(html.contains("/login"));
    }
}
