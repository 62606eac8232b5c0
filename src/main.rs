use axum::{
    routing::{delete, get, post},
    Router,
};
use receipt_rewards::{
    api,
    api::shopping,
    create_pool,
    service::{HttpOcrRecognizer, PlainTextRecognizer, StoreCatalog, TextRecognizer},
    AppConfig, CaptureService, JobService, MfaService, PgReceiptStore, ReceiptStore,
    ShoppingService,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config.server);
    info!("Capture settings: {:?}", config.capture);

    let pool = create_pool(&config.database.url)?;
    info!("Database pool created");

    let recognizer: Arc<dyn TextRecognizer> = match &config.capture.ocr_endpoint {
        Some(endpoint) => {
            info!("Using OCR service at {}", endpoint);
            Arc::new(HttpOcrRecognizer::new(endpoint.clone())?)
        }
        None => Arc::new(PlainTextRecognizer),
    };
    let store: Arc<dyn ReceiptStore> = Arc::new(PgReceiptStore::new(pool.clone()));

    let capture_service = Arc::new(CaptureService::new(store, recognizer, config.capture.clone()));
    let shopping_service = Arc::new(ShoppingService::new(StoreCatalog::mock()));
    let mfa_service = Arc::new(MfaService::new(pool.clone(), &config.mfa));
    let job_service = Arc::new(JobService::new(pool));

    // expire idle session state
    {
        let capture = capture_service.clone();
        let shopping = shopping_service.clone();
        let mfa = mfa_service.clone();
        let idle = Duration::from_secs(config.sessions.idle_secs);
        let sweep_every = Duration::from_secs(config.sessions.sweep_interval_secs.max(1));
        let mut ticker = tokio::time::interval(sweep_every);
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let histories = capture.prune_idle_sessions(now, idle);
                let lists = shopping.prune_idle_sessions(now, idle);
                let limiter_keys = mfa.prune_limiter(now);
                if histories + lists + limiter_keys > 0 {
                    info!(
                        "Expired {} capture sessions, {} shopping lists, {} limiter keys",
                        histories, lists, limiter_keys
                    );
                }
            }
        });
    }

    let receipt_routes = Router::new()
        .route("/api/receipts/session", post(api::start_session))
        .route("/api/receipts/capture", post(api::capture_receipt))
        .route("/api/receipts/sync", post(api::sync_receipts))
        .route("/api/users/:user_id/points", get(api::points_summary))
        .route("/api/users/:user_id/points/export", get(api::export_points))
        .with_state(capture_service);

    let shopping_routes = Router::new()
        .route("/api/shopping/category", post(shopping::category))
        .route("/api/shopping/recommendations", post(shopping::recommendations))
        .route("/api/shopping/:session_id", get(shopping::get_list))
        .route("/api/shopping/:session_id/items", post(shopping::add_item))
        .route(
            "/api/shopping/:session_id/items/:item_id/toggle",
            post(shopping::toggle_item),
        )
        .route(
            "/api/shopping/:session_id/items/:item_id",
            delete(shopping::remove_item),
        )
        .with_state(shopping_service);

    let mfa_routes = Router::new()
        .route("/api/mfa/totp/setup", post(api::totp_setup))
        .route("/api/mfa/totp/verify", post(api::totp_verify))
        .with_state(mfa_service);

    let job_routes = Router::new()
        .route("/api/jobs/daily-challenges", post(api::daily_challenges))
        .route("/api/jobs/monthly-reset", post(api::monthly_reset))
        .with_state(job_service);

    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(receipt_routes)
        .merge(shopping_routes)
        .merge(mfa_routes)
        .merge(job_routes)
        .layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/receipts/capture        - capture a receipt");
    info!("  POST /api/receipts/sync           - replay offline submissions");
    info!("  GET  /api/users/:id/points        - points balance and history");
    info!("  POST /api/shopping/recommendations - store price comparison");
    info!("  POST /api/mfa/totp/setup|verify   - TOTP");
    info!("  POST /api/jobs/*                  - scheduled jobs");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
