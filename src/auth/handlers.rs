use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::AppState;

// Absent JSON fields deserialize as empty strings and are rejected by the
// service, not by the extractor.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);

    match state
        .auth_service
        .register(&req.username, &req.email, &req.password)
        .await
    {
        Ok(_) => {
            info!("Registration successful for email: {}", req.email);
            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "User registered"
            })))
        }
        Err(e) => {
            warn!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);

    match state.auth_service.login(&req.email, &req.password).await {
        Ok(token) => Ok(HttpResponse::Ok().json(AuthResponse { token })),
        Err(e) => {
            warn!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// Resolves the token in the `Authorization` header. The header value is the
/// token itself; no scheme prefix is stripped.
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("No token".into()))?;

    let account = state.auth_service.resolve_identity(token).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// Health check endpoint handler
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let report = state.auth_service.health().await;

    if report.is_healthy() {
        return HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "auth-service",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    let message = if !report.database {
        "Database connection failed"
    } else {
        "Session store connection failed"
    };
    error!("Health check failed: {}", message);

    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "status": "unhealthy",
        "service": "auth-service",
        "error": message,
        "database": report.database,
        "session_store": report.session_store,
    }))
}

/// Registers the service's routes. Unsupported methods on these paths get 405.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid JSON: {}", err)).into()
    });

    cfg.app_data(json_config)
        .service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/auth/register").route(web::post().to(register)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/me").route(web::get().to(me)));
}
