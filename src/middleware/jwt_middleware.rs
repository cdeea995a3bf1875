/// Bearer token middleware
///
/// Verifies the session token from the Authorization header, checks its role
/// claim against the roles allowed on the wrapped routes, and injects the
/// claims into request extensions for the handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Claims, SessionIssuer};
use crate::domain::Role;
use crate::error::{AppError, AuthError};

/// Protects the routes it wraps.
///
/// With `allow_anonymous_reads`, GET and HEAD requests pass through without
/// a token and without claims.
pub struct JwtMiddleware {
    sessions: SessionIssuer,
    allowed_roles: Rc<[Role]>,
    anonymous_reads: bool,
}

impl JwtMiddleware {
    pub fn new(sessions: SessionIssuer, allowed_roles: &[Role]) -> Self {
        Self {
            sessions,
            allowed_roles: allowed_roles.into(),
            anonymous_reads: false,
        }
    }

    pub fn allow_anonymous_reads(mut self) -> Self {
        self.anonymous_reads = true;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
            allowed_roles: self.allowed_roles.clone(),
            anonymous_reads: self.anonymous_reads,
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    sessions: SessionIssuer,
    allowed_roles: Rc<[Role]>,
    anonymous_reads: bool,
}

impl<S> JwtMiddlewareService<S> {
    fn authorize(&self, req: &ServiceRequest) -> Result<Claims, AuthError> {
        let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
        let claims = self.sessions.verify(token)?;

        if !self.allowed_roles.contains(&claims.role) {
            tracing::warn!(
                role = %claims.role,
                path = %req.path(),
                "Token role not allowed on this route"
            );
            return Err(AuthError::RoleNotAllowed);
        }
        Ok(claims)
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_read = req.method() == Method::GET || req.method() == Method::HEAD;
        if self.anonymous_reads && is_read {
            let service = self.service.clone();
            return Box::pin(async move { service.call(req).await });
        }

        match self.authorize(&req) {
            Ok(claims) => {
                tracing::debug!(
                    account_id = %claims.sub,
                    role = %claims.role,
                    "Session token validated"
                );
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), "Request rejected: {}", e);
                Box::pin(async move { Err(AppError::Auth(e).into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionSubject;
    use crate::configuration::JwtSettings;
    use actix_web::{test, web, App, HttpResponse};

    fn sessions() -> SessionIssuer {
        SessionIssuer::new(&JwtSettings {
            secret: "middleware-test-secret-middleware".to_string(),
            session_ttl_seconds: 60,
        })
    }

    fn token_for(sessions: &SessionIssuer, role: Role) -> String {
        sessions
            .issue(&SessionSubject {
                subject_id: 9,
                email: "a@b.com".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                role,
            })
            .unwrap()
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    #[actix_web::test]
    async fn test_token_of_allowed_role_reaches_handler() {
        let sessions = sessions();
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(sessions.clone(), &[Role::Student]))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token_for(&sessions, Role::Student))))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, "9");
    }

    #[actix_web::test]
    async fn test_rejections() {
        let sessions = sessions();
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(sessions.clone(), &[Role::Student]))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let missing = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, missing).await.unwrap_err();
        assert_eq!(err.error_response().status().as_u16(), 401);

        let garbage = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not.a.token"))
            .to_request();
        let err = test::try_call_service(&app, garbage).await.unwrap_err();
        assert_eq!(err.error_response().status().as_u16(), 401);

        let wrong_role = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token_for(&sessions, Role::Admin))))
            .to_request();
        let err = test::try_call_service(&app, wrong_role).await.unwrap_err();
        assert_eq!(err.error_response().status().as_u16(), 403);
    }
}
