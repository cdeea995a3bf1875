use actix_web::HttpResponse;

/// GET /health_check: 200 with an empty body while the process is serving.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check requested");
    HttpResponse::Ok().finish()
}
