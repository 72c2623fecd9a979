pub mod batching;
pub mod classifier;
pub mod config;
pub mod error;
pub mod formatter;
pub mod model_service;
pub mod ort_service;
pub mod preprocessing;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use classifier::FocusClassifier;
pub use formatter::ClassificationResult;
pub use server::start_server;
