mod health;
mod labels;
mod metrics;
mod predict;

use crate::{model_service::ModelService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

pub use health::{healthcheck, Status};
pub use labels::{level_labels, LevelLabels};
pub use metrics::metrics_handler;
pub use predict::{predict, ErrorResponse, PredictError, PredictRequest};

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/predict", post(predict::<M>))
        .route("/labels", get(level_labels::<M>))
        .route("/metrics", get(metrics_handler::<M>))
        .route("/health", get(healthcheck::<M>))
}
