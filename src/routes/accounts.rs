/// Account Routes
///
/// The same handlers serve `/students`, `/instructors` and `/admins`; the
/// scope's [`AccountService`] decides which role they act on.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::Claims;
use crate::domain::{NewPrincipal, PrincipalChanges, PrincipalView};
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::AccountService;

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /{role}/register
///
/// # Errors
/// - 400: Validation errors (names, email, password, unsupported field)
/// - 409: Email already registered for this role
pub async fn register(
    form: web::Json<NewPrincipal>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let principal = service.register(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(PrincipalView::from(principal)))
}

/// POST /{role}/login
///
/// Returns a bearer token and the public profile.
///
/// # Errors
/// - 401: Invalid credentials (email not found or wrong password, same response)
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();
    let session = service.login(&email, &password).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /{role}
pub async fn list(
    params: web::Query<ListParams>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let page = service.list(&params).await?;
    Ok(HttpResponse::Ok().json(page.map(PrincipalView::from)))
}

/// GET /{role}/{id}
pub async fn get(
    path: web::Path<i64>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let principal = service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PrincipalView::from(principal)))
}

/// GET /{role}/me
///
/// Requires the bearer middleware to have injected the claims.
pub async fn me(
    claims: web::ReqData<Claims>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let principal = service.current(&claims).await?;
    Ok(HttpResponse::Ok().json(PrincipalView::from(principal)))
}

/// PATCH /{role}/me
///
/// Partial update of the token's own account.
pub async fn update_me(
    claims: web::ReqData<Claims>,
    form: web::Json<PrincipalChanges>,
    service: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let id = service.subject_of(&claims)?;
    let principal = service.update(id, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PrincipalView::from(principal)))
}
