use axum::{
    middleware,
    routing::{get, get_service, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use mutuals::database::schema;
use mutuals::web::middleware::auth as auth_middleware;
use mutuals::web::routes::{account, auth, friends, home};
use mutuals::web::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mutuals.db".to_string());
    info!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("could not connect to the database");
    schema::init_schema(&pool)
        .await
        .expect("could not apply the database schema");

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let base_url =
        env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

    let state = AppState {
        pool: pool.clone(),
        base_url,
    };

    // Anyone may look at profiles and search; the viewer context carries
    // the session identity when one is present.
    let public_routes = Router::new()
        .route("/", get(home::home_handler))
        .route("/accounts/:account_id", get(account::profile_handler))
        .route("/search", get(account::search_handler))
        .layer(middleware::from_fn_with_state(
            pool.clone(),
            auth_middleware::viewer_context,
        ));

    let protected_routes = Router::new()
        .route(
            "/accounts/:account_id/edit",
            get(account::edit_profile_page).post(account::edit_profile_handler),
        )
        .route("/friends/:account_id", get(friends::friend_list_handler))
        .route(
            "/friends/:account_id/requests",
            get(friends::friend_requests_handler),
        )
        .route("/friends/send", post(friends::send_request_handler))
        .route("/friends/cancel", post(friends::cancel_request_handler))
        .route("/friends/accept", post(friends::accept_request_handler))
        .route("/friends/decline", post(friends::decline_request_handler))
        .route("/friends/remove", post(friends::remove_friend_handler))
        .route("/logout", post(auth::logout_handler))
        .layer(middleware::from_fn_with_state(
            pool.clone(),
            auth_middleware::require_auth,
        ));

    let app = Router::new()
        .route(
            "/register",
            get(auth::register_page).post(auth::register_handler),
        )
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("could not parse host/port");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("could not bind the listen address");

    let bound_addr = listener.local_addr().unwrap();
    info!("Server listening on http://{}", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
