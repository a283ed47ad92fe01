//! NutriScan Server
//!
//! Classifies an uploaded food photo and estimates its nutrients.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NUTRISCAN SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌──────────────────────┐ │
//! │  │  HTTP     │  │  Predictor   │  │  Classifier          │ │
//! │  │  (Axum)   │─▶│  validate /  │─▶│  (ONNX Runtime,      │ │
//! │  │           │  │  resolve /   │  │   one run at a time) │ │
//! │  └───────────┘  │  scale       │  └──────────────────────┘ │
//! │                 └──────┬───────┘                           │
//! │                        ▼                                    │
//! │              ┌───────────────────┐                          │
//! │              │  Reference data   │                          │
//! │              │  labels+nutrients │                          │
//! │              └───────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod classifier;
mod models;
mod reference;
mod predictor;
mod render;
mod handlers;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    extract::DefaultBodyLimit,
    http::Method,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::classifier::{Classifier, OnnxClassifier};
use crate::config::{Config, LogFormat};
use crate::predictor::Predictor;
use crate::reference::ReferenceData;
use crate::render::PageContext;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize logging
    init_tracing(LogFormat::from_env());

    let config = Config::from_env();

    tracing::info!("NutriScan Server starting...");
    tracing::info!("Labels: {}", config.labels_path.display());
    tracing::info!("Nutrients: {}", config.nutrients_path.display());
    tracing::info!("Model: {} (input scale {})", config.model_path.display(), config.input_scale);

    let reference = ReferenceData::load(
        &config.labels_path,
        &config.nutrients_path,
        &config.nutrients_template_path,
    );
    tracing::debug!("Known labels: {:?}", reference.labels());
    let classifier = load_classifier(&config);

    if !reference.is_ready() || classifier.is_none() {
        tracing::warn!("Starting degraded: /predict will answer with a configuration error");
    }

    // Build application state
    let state = AppState {
        config: Arc::new(config),
        reference: Arc::new(reference),
        classifier,
    };

    let port = state.config.port;
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nutriscan_server=debug,tower_http=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

/// A missing or broken model leaves the server up but not ready
fn load_classifier(config: &Config) -> Option<Arc<dyn Classifier>> {
    if !config.model_path.exists() {
        tracing::warn!("Model file not found: {}", config.model_path.display());
        return None;
    }

    match OnnxClassifier::load(&config.model_path, config.input_spec()) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            tracing::warn!("Model could not be loaded: {}", e);
            None
        }
    }
}

/// Shared application state, immutable after startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub reference: Arc<ReferenceData>,
    pub classifier: Option<Arc<dyn Classifier>>,
}

impl AppState {
    pub fn predictor(&self) -> Predictor {
        Predictor::new(self.reference.clone(), self.classifier.clone())
    }

    pub fn page_context(&self) -> PageContext {
        PageContext {
            labels_count: self.reference.labels_count(),
            nutrients_loaded: self.reference.nutrients_loaded(),
            inference: self.classifier.as_ref().map(|c| c.describe()),
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index::page))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
        )
        .with_state(state)
}
