pub mod api;
mod config;
mod validate;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;

#[derive(OpenApi)]
#[openapi(
    info(title = "Train Graph API", version = "0.1.0"),
    paths(api::dispatch),
    components(schemas(
        api::ErrorResponse,
        api::lines::Line,
        api::lines::CreateLine,
        api::lines::UpdateLine,
        api::stations::Station,
        api::stations::StationWithLine,
        api::stations::CreateStation,
        api::stations::UpdateStation,
        api::trains::Train,
        api::trains::CreateTrain,
        api::trains::UpdateTrain,
        api::train_stops::TrainStop,
        api::train_stops::TrainStopWithStation,
        api::train_stops::CreateTrainStop,
        api::train_stops::UpdateTrainStop,
        api::legend::LegendItem,
        api::legend::UpdateLegendItem,
        validate::TrainType,
    )),
    tags(
        (name = "graph", description = "Train schedule diagram resources")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info,sqlx=warn".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");

    let db_url = config.database_url().unwrap_or_else(default_database_url);
    tracing::info!(url = %db_url, "Connecting to database");
    let pool = SqlitePool::connect(&db_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    let migrator = sqlx::migrate!("./migrations");
    migrator.run(&pool).await.expect("Failed to run migrations");
    tracing::info!("Database migrations completed");

    // Build the app
    let app = Router::new()
        .merge(api::router(pool))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

/// Fallback when no connection string is configured: a SQLite file under
/// ./database, created on first start.
fn default_database_url() -> String {
    let cwd = std::env::current_dir().expect("Failed to get current directory");
    let db_path = cwd.join("database");
    if let Err(e) = std::fs::create_dir_all(&db_path) {
        tracing::warn!("Could not create database directory: {}", e);
    }
    let db_file = db_path.join("graph.db");
    format!("sqlite:{}?mode=rwc", db_file.display())
}
