//! Platebook server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use platebook_api::{AppState, NotificationGateway};
use platebook_common::Config;
use platebook_core::{
    DishService, EmailService, GeocodingService, LikeService, NotificationService, PostService,
    RestaurantService, TokenService, UserService, VerificationService,
};
use platebook_db::repositories::{
    DishRepository, LikeRepository, LovedRestaurantRepository, NotificationRepository,
    PostRepository, RestaurantRepository, UserRepository, VerificationCodeRepository,
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Per-request deadline for HTTP handlers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On non-Unix targets only Ctrl+C is observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "platebook=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;
    init_tracing(config.server.log_json);

    info!("Starting platebook server...");

    // Connect to database
    let db = Arc::new(platebook_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    platebook_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let restaurant_repo = RestaurantRepository::new(Arc::clone(&db));
    let dish_repo = DishRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let loved_repo = LovedRestaurantRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let code_repo = VerificationCodeRepository::new(Arc::clone(&db));

    // Live notifications go through the WebSocket gateway
    let gateway = NotificationGateway::new();
    let notification_service =
        NotificationService::new(notification_repo, Arc::new(gateway.clone()));

    // Initialize services
    let geocoding = GeocodingService::from_config(&config.geocoding)?;
    if !config.geocoding.enabled {
        info!("Geocoding disabled, restaurants will use the fallback location");
    }

    let email = EmailService::new(&config.email)?;
    if !email.is_enabled() {
        info!("SMTP not configured, verification codes will only be logged");
    }

    let user_service = UserService::new(
        user_repo.clone(),
        loved_repo,
        restaurant_repo.clone(),
        TokenService::from_config(&config.auth),
    );
    let restaurant_service = RestaurantService::new(restaurant_repo.clone(), geocoding);
    let dish_service = DishService::new(dish_repo.clone(), restaurant_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        user_repo.clone(),
        restaurant_repo,
        dish_repo,
        notification_service.clone(),
    );
    let like_service = LikeService::new(
        like_repo,
        post_repo,
        user_repo,
        notification_service.clone(),
    );
    let verification_service =
        VerificationService::new(code_repo, email, config.email.code_ttl_minutes);

    let state = AppState {
        user_service,
        restaurant_service,
        dish_service,
        post_service,
        like_service,
        notification_service,
        verification_service,
        gateway,
    };

    let app = platebook_api::app(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {} ({})", addr, config.server.url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
