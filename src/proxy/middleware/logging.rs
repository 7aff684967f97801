// Request logging middleware
use axum::{extract::Request, middleware::Next, response::Response};

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    // Log the request method and URI
    tracing::info!("Request: {} {}", request.method(), request.uri());
    let response = next.run(request).await;
    tracing::debug!("Response status: {}", response.status());
    response
}
