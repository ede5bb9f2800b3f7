use fable_server::{ai, api, config, db};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use fable_server::state::AppState;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fable_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    if settings.database.seed_demo {
        db::seed::seed_demo_data(&db).expect("Failed to seed demo data");
    }

    tracing::info!("Database initialized successfully");

    let ai_client = ai::AiClient::new(settings.ai.gemini_api_key.clone());

    // Create application state
    let state = AppState::new(db, ai_client);

    // Run initial session cleanup on startup
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) if count > 0 => {
            tracing::info!("Cleaned up {} expired sessions on startup", count);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
        }
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        // Post routes
        .route("/posts", get(api::posts::list_posts))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/:id", get(api::posts::get_post))
        .route("/posts/:id", put(api::posts::update_post))
        .route("/posts/:id", delete(api::posts::delete_post))
        .route("/posts/:id/comments", post(api::posts::create_comment))
        .route("/posts/:id/like", post(api::posts::like_post))
        // Feed
        .route("/feed", get(api::posts::followed_feed))
        // Profile routes
        .route("/profile", put(api::profile::update_profile))
        .route("/profile/:username", get(api::profile::get_profile))
        .route("/profile/:username/followers", get(api::profile::list_followers))
        .route("/profile/:username/following", get(api::profile::list_following))
        // Social graph
        .route("/follow/:username", post(api::social::follow))
        .route("/unfollow/:username", post(api::social::unfollow))
        // Notifications
        .route("/notifications", get(api::notifications::list_notifications))
        .route("/notifications", delete(api::notifications::clear_all))
        .route("/notifications/unread-count", get(api::notifications::unread_count))
        .route("/notifications/mark-read", post(api::notifications::mark_all_read))
        .route("/notifications/:id/mark-read", post(api::notifications::mark_one_read))
        .route("/notifications/:id", delete(api::notifications::delete_notification))
        // AI writing assistant
        .route("/api/ai/continue-story", post(api::ai::continue_story))
        .route("/api/ai/generate-starter", post(api::ai::generate_starter))
        .route("/api/ai/suggest-titles", post(api::ai::suggest_titles))
        .route("/api/ai/improve-writing", post(api::ai::improve_writing))
        .route("/api/ai/get-suggestions", post(api::ai::get_suggestions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn health_check() -> &'static str {
    "OK"
}
