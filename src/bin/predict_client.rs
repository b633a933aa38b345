//! Command-line counterpart of the prediction form.
//!
//! Usage: `predict-client [request.json]` (reads the request body from stdin
//! when no file is given) and posts it verbatim to `PREDICT_API_URL`.

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use std::io::Read;

use acne_risk::config::Config;
use acne_risk::services::PredictClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let raw = match env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request body from {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request body from stdin")?;
            buf
        }
    };
    let body: serde_json::Value =
        serde_json::from_str(&raw).context("Request body is not valid JSON")?;

    let client = PredictClient::new(config.predict_api_url);
    log::info!("🚀 Sending prediction request to {}", client.url());
    let outcome = client.predict(&body).await?;

    if outcome.is_success() {
        println!("{}", outcome.display_text());
        Ok(())
    } else {
        eprintln!("{}", outcome.display_text());
        std::process::exit(1);
    }
}
