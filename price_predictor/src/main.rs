use anyhow::Context;
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use car_model::PricePipeline;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod model;
mod render;
mod types;

use error::ServiceError;
use render::Templates;
use types::PredictForm;

// ---------- Server state ----------

/// Read-only state shared by every handler once the artifact is loaded.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<PricePipeline>,
    templates: Arc<Templates>,
}

impl AppState {
    fn new(pipeline: PricePipeline) -> anyhow::Result<Self> {
        Ok(Self {
            pipeline: Arc::new(pipeline),
            templates: Arc::new(Templates::new()?),
        })
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .with_state(state)
}

// ---------- Handlers ----------

async fn index(State(state): State<AppState>) -> Result<Html<String>, ServiceError> {
    Ok(Html(state.templates.index()?))
}

async fn predict(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ServiceError> {
    let details = PredictForm::from_pairs(pairs).resolve()?;

    let raw = model::predict_one(&state.pipeline, details.clone())?;
    let pred_price = model::round_to_thousand(raw);
    tracing::debug!(
        "predicted make={} model={} year={} raw={:.1} shown={}",
        details.make, details.model, details.year, raw, pred_price
    );

    Ok(Html(state.templates.result(pred_price, &details)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = config::ServiceConfig::from_env();

    let pipeline = model::load_pipeline(&cfg.model_path)?;
    tracing::info!(
        "loaded model {}: {} trees, {} features, trained on {} rows",
        cfg.model_path.display(),
        pipeline.forest().trees().len(),
        pipeline.forest().n_features(),
        pipeline.training().n_train
    );

    let app = router(AppState::new(pipeline)?);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on http://{}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
