use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use acne_risk::api::server::create_router;
use acne_risk::config::Config;
use acne_risk::handlers::PredictHandler;
use acne_risk::services::{InferenceService, LoadedModel, Predictor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (RUST_LOG may come from .env)
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting acne risk inference service...");

    let config = Config::from_env()?;

    // The model is loaded once and shared read-only by every request
    let model = LoadedModel::load(&config.model_path, config.model_sha256.as_deref())
        .with_context(|| format!("Failed to load model from {}", config.model_path.display()))?;
    let predictor: Arc<dyn Predictor> = Arc::new(model);
    log::info!("✅ Model ready");

    let predict_handler = Arc::new(PredictHandler::new(InferenceService::new(predictor)));
    let app = create_router(predict_handler);

    let listener = tokio::net::TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;

    log::info!("🌐 Listening on http://{}", config.server_addr);
    log::info!("📝 Form: http://{}/  API: POST http://{}/predict", config.server_addr, config.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
    log::info!("🛑 Shutting down...");
}
