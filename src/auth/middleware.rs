use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::token::TokenService;
use crate::error::{AppError, AuthError};

pub const LOGIN_PATH: &str = "/login";

/// Identity admitted by [`AuthGate`]. Handlers behind the gate take it as
/// an extractor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or_else(|| {
            error!("Handler for {} expects AuthGate but none ran", req.path());
            AppError::InternalError("authenticated identity missing from request".into())
        }))
    }
}

/// Middleware admitting requests that carry a valid session cookie and
/// redirecting everything else to the login page.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    cookie_name: Arc<str>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, cookie_name: &str) -> Self {
        Self {
            tokens,
            cookie_name: Arc::from(cookie_name),
        }
    }
}

fn authenticate(
    tokens: &TokenService,
    cookie_name: &str,
    req: &ServiceRequest,
) -> Result<AuthenticatedUser, AuthError> {
    let cookie = req.cookie(cookie_name).ok_or(AuthError::MissingToken)?;
    let claims = tokens.verify(cookie.value())?;
    Ok(AuthenticatedUser {
        username: claims.username,
    })
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            tokens: self.tokens.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    tokens: Arc<TokenService>,
    cookie_name: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&self.tokens, &self.cookie_name, &req) {
            Ok(user) => {
                debug!("Admitted {} to {}", user.username, req.path());
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(reason) => {
                debug!("Redirecting {} to login: {:?}", req.path(), reason);
                let response = HttpResponse::Found()
                    .insert_header((header::LOCATION, LOGIN_PATH))
                    .finish()
                    .map_into_right_body();
                let (request, _payload) = req.into_parts();
                Box::pin(async move { Ok(ServiceResponse::new(request, response)) })
            }
        }
    }
}
