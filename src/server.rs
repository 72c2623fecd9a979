use crate::{
    classifier::FocusClassifier,
    config::{Config, ServerConfig},
    model_service::ModelService,
    ort_service::OrtModelService,
    routes::api_routes,
    state::{ServiceState, State},
    telemetry::Metrics,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct SharedState<M: ModelService> {
    pub classifier: FocusClassifier<M>,
    pub service_state: Arc<dyn State>,
    pub metrics: Arc<Metrics>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<M: ModelService>(
        shared_state: SharedState<M>,
        server_config: &ServerConfig,
    ) -> anyhow::Result<Self> {
        let router = build_router(shared_state, server_config);
        let listener = TcpListener::bind(server_config.get_address()).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Focus prediction service listening on {}", self.listener.local_addr()?);

        let shutdown = async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown")
        };

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

pub fn build_router<M: ModelService>(
    shared_state: SharedState<M>,
    server_config: &ServerConfig,
) -> Router {
    Router::new()
        .merge(api_routes())
        .with_state(shared_state)
        .layer(DefaultBodyLimit::max(server_config.max_body_bytes))
        .layer(cors_layer(&server_config.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid allowed origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let ort_model_service = OrtModelService::new(&config.model)?;
    let service_state = ServiceState::new(&config.labels)?;
    let metrics = Metrics::new()?;

    let shared_state = SharedState {
        classifier: FocusClassifier::new(ort_model_service, &config),
        service_state: Arc::new(service_state),
        metrics: Arc::new(metrics),
    };

    let http_server = HttpServer::new(shared_state, &config.server).await?;
    http_server.run().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
