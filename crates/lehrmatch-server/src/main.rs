use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lehrmatch_api::auth::{self, AppState, AppStateInner};
use lehrmatch_api::careers;
use lehrmatch_api::feed;
use lehrmatch_api::matches;
use lehrmatch_api::messages;
use lehrmatch_api::middleware::require_auth;
use lehrmatch_api::profiles;
use lehrmatch_api::swipes;
use lehrmatch_gateway::connection;
use lehrmatch_gateway::dispatcher::Dispatcher;

#[derive(Clone)]
struct ServerState {
    app: AppState,
    dispatcher: Dispatcher,
    jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lehrmatch=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("LEHRMATCH_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("LEHRMATCH_DB_PATH").unwrap_or_else(|_| "lehrmatch.db".into());
    let host = std::env::var("LEHRMATCH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LEHRMATCH_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(lehrmatch_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: jwt_secret.clone(),
        dispatcher: dispatcher.clone(),
    });

    let state = ServerState {
        app: app_state.clone(),
        dispatcher: dispatcher.clone(),
        jwt_secret: jwt_secret.clone(),
    };

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/profiles/student", post(profiles::upsert_student_profile))
        .route("/profiles/student/traits", put(profiles::submit_traits))
        .route("/profiles/company", post(profiles::upsert_company_profile))
        .route("/feed", get(feed::get_feed))
        .route("/swipes", post(swipes::record_swipe))
        .route("/careers/matches", get(careers::get_career_matches))
        .route("/careers/favorites", get(careers::get_favorites))
        .route("/careers/{code}/favorite", post(careers::toggle_favorite))
        .route("/matches", get(matches::get_matches))
        .route("/matches/{match_id}/messages", get(messages::get_messages))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("LehrMatch server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(
            socket,
            state.dispatcher,
            state.app.db.clone(),
            state.jwt_secret,
        )
    })
}
