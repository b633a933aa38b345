use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/acne_model.json";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_PREDICT_API_URL: &str = "http://127.0.0.1:8000/predict";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub model_path: PathBuf,
    pub model_sha256: Option<String>,
    pub server_addr: SocketAddr,
    pub predict_api_url: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model_path = get("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .with_context(|| format!("SERVER_ADDR '{}' is not a valid socket address", server_addr))?;

        let predict_api_url =
            get("PREDICT_API_URL").unwrap_or_else(|| DEFAULT_PREDICT_API_URL.to_string());

        Ok(Self {
            model_path,
            model_sha256: get("MODEL_SHA256"),
            server_addr,
            predict_api_url,
        })
    }
}
