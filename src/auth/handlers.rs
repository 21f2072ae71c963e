use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::middleware::{AuthenticatedUser, LOGIN_PATH};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::AppState;

pub const DASHBOARD_PATH: &str = "/dashboard";

/// Missing fields read as empty so they fail the same checks as bad input.
#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub new_username: String,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Host the request was addressed to, without the port.
fn cookie_domain(req: &HttpRequest) -> String {
    let info = req.connection_info();
    let host = info.host();
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (name.ends_with(']') || !name.contains(':')) =>
        {
            name.to_string()
        }
        _ => host.to_string(),
    }
}

fn session_cookie(config: &AuthConfig, req: &HttpRequest, token: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), token)
        .path("/")
        .domain(cookie_domain(req))
        .http_only(true)
        .secure(config.cookie_secure)
        .max_age(CookieDuration::hours(config.token_expiry_hours))
        .finish()
}

fn cleared_cookie(config: &AuthConfig, req: &HttpRequest) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), "")
        .path("/")
        .domain(cookie_domain(req))
        .http_only(true)
        .secure(config.cookie_secure)
        .finish();
    cookie.make_removal();
    cookie
}

pub async fn register(
    form: web::Form<CredentialsForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for username: {}", form.username);

    match state.auth_service.register(&form.username, &form.password).await {
        Ok(_) => Ok(redirect(LOGIN_PATH)),
        Err(e) => {
            warn!("Registration failed for username: {}: {}", form.username, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: HttpRequest,
    form: web::Form<CredentialsForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for username: {}", form.username);

    let token = match state.auth_service.authenticate(&form.username, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            warn!("Login failed for username: {}: {}", form.username, e);
            return Err(e);
        }
    };

    let cookie = session_cookie(&state.config.auth, &req, token);
    info!(
        "Login successful for username: {}, cookie domain {}",
        form.username,
        cookie.domain().unwrap_or_default()
    );

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, DASHBOARD_PATH))
        .cookie(cookie)
        .finish())
}

pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cleared_cookie(&state.config.auth, &req))
        .json(serde_json::json!({
            "message": "Successfully logged out"
        }))
}

pub async fn dashboard(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "username": user.username
    }))
}

pub async fn update_username(
    user: AuthenticatedUser,
    body: web::Json<UpdateUsernameRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Username change requested by {}", user.username);

    match state
        .auth_service
        .update_username(&user.username, &body.new_username)
        .await
    {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Username updated successfully"
        }))),
        Err(e) => {
            warn!("Username change failed for {}: {}", user.username, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_cookie_domain_strips_port() {
        let req = TestRequest::default()
            .insert_header((header::HOST, "example.com:8080"))
            .to_http_request();
        assert_eq!(cookie_domain(&req), "example.com");

        let req = TestRequest::default()
            .insert_header((header::HOST, "example.com"))
            .to_http_request();
        assert_eq!(cookie_domain(&req), "example.com");

        let req = TestRequest::default()
            .insert_header((header::HOST, "[::1]:8080"))
            .to_http_request();
        assert_eq!(cookie_domain(&req), "[::1]");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = AuthConfig {
            jwt_secret: "s".into(),
            token_expiry_hours: 24,
            bcrypt_cost: 4,
            cookie_name: "token".into(),
            cookie_secure: false,
        };
        let req = TestRequest::default()
            .insert_header((header::HOST, "localhost:8080"))
            .to_http_request();

        let cookie = session_cookie(&config, &req, "abc".into());
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("localhost"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(86400)));

        let cleared = cleared_cookie(&config, &req);
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(CookieDuration::ZERO));
        assert_eq!(cleared.path(), Some("/"));
    }
}
