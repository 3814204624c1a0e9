// server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use lem_auth::{LoginRequest, RefreshRequest};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(
    name = "handler::login",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
  let request = req_payload.into_inner();
  if request.email.trim().is_empty() || request.password.is_empty() {
    return Err(AppError::Validation("email and password are required".to_string()));
  }

  let tokens = app_state.login_service.login(request).await?;
  info!("Login request served.");
  Ok(HttpResponse::Ok().json(tokens))
}

#[instrument(name = "handler::refresh", skip_all)]
pub async fn refresh_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
  let request = req_payload.into_inner();
  if request.refresh_token.trim().is_empty() {
    return Err(AppError::Validation("refresh_token is required".to_string()));
  }

  let refreshed = app_state.login_service.refresh(request).await?;
  Ok(HttpResponse::Ok().json(refreshed))
}
