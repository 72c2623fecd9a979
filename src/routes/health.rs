use crate::{model_service::ModelService, server::SharedState};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub model_input: String,
}

pub async fn healthcheck<M: ModelService>(State(state): State<SharedState<M>>) -> Json<Status> {
    Json(Status {
        status: "Available".into(),
        model_input: state.classifier.model_input_name().to_string(),
    })
}
