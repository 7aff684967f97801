use crate::error::{AppError, AppResult};
use crate::proxy::config::RelayConfig;
use crate::proxy::upstream::client::UpstreamClient;
use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        let upstream = UpstreamClient::new(config.upstream.clone(), &config.upstream_proxy)?;
        Ok(Self {
            upstream: Arc::new(upstream),
        })
    }
}

/// Every path lands on the chat handler; CORS is outermost so that
/// rejections from inner layers carry the headers too.
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers;
    use crate::proxy::middleware;

    Router::new()
        .fallback(handlers::chat::handle_chat)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(config: &RelayConfig) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let state = AppState::new(config)?;
        let app = build_router(state);

        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            AppError::Config(format!("Failed to bind address {}: {}", addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Chat relay started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Chat relay stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_stop_on_ephemeral_port() {
        let mut config = RelayConfig::default();
        config.port = 0;
        config.upstream.api_key = "k".to_string();

        let (server, handle) = AxumServer::start(&config).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);

        let addr = server.local_addr();
        let stream = tokio::net::TcpStream::connect(addr).await;
        assert!(stream.is_ok());

        server.stop();
        handle.await.unwrap();
    }
}
