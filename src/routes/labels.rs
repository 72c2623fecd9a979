use crate::{model_service::ModelService, server::SharedState, state::State as _};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct LevelLabels {
    pub labels: Vec<String>,
}

pub async fn level_labels<M: ModelService>(
    State(state): State<SharedState<M>>,
) -> Json<LevelLabels> {
    Json(LevelLabels {
        labels: state.service_state.get_labels().clone(),
    })
}
