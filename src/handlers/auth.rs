//! HTTP handlers for login, the current-account endpoints and bearer authentication

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::http::header::{HeaderValue, WWW_AUTHENTICATE};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::auth::token::extract_bearer_token;
use crate::auth::{CredentialService, User};
use crate::error::AuthError;
use crate::security::AuthTimer;

/// Largest accepted form or JSON body
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Options for the HTTP surface that do not belong to the credential service
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Login responses are padded to at least this duration
    pub auth_min_duration: Duration,
    /// Expose `POST /api/create-user`
    pub allow_registration: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUsernameForm {
    pub new_username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

/// Rejections raised by the auth filters
#[derive(Debug)]
pub enum ApiRejection {
    /// Wrong username or password on the login endpoint
    LoginFailed,
    Auth(AuthError),
}

impl warp::reject::Reject for ApiRejection {}

impl From<AuthError> for ApiRejection {
    fn from(err: AuthError) -> Self {
        ApiRejection::Auth(err)
    }
}

fn reject(err: AuthError) -> Rejection {
    warp::reject::custom(ApiRejection::from(err))
}

/// Extract token from an optional Authorization header value
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<String> {
    auth_header.and_then(extract_bearer_token)
}

fn with_service(
    service: Arc<CredentialService>,
) -> impl Filter<Extract = (Arc<CredentialService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// Resolves the bearer token of the request to the authenticated account
pub fn with_auth(
    service: Arc<CredentialService>,
) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_service(service))
        .and_then(|header: Option<String>, service: Arc<CredentialService>| async move {
            let token = match extract_token_from_header(header.as_deref()) {
                Some(token) => token,
                None => {
                    log::debug!("Request without bearer token rejected");
                    return Err(reject(AuthError::MalformedToken(
                        "missing bearer token".to_string(),
                    )));
                }
            };
            service.authenticate(&token).await.map_err(reject)
        })
}

async fn login_handler(
    form: LoginForm,
    service: Arc<CredentialService>,
    min_duration: Duration,
) -> Result<impl Reply, Rejection> {
    let timer = AuthTimer::new(min_duration);
    let result = service.login(&form.username, &form.password).await;
    timer.wait().await;

    match result {
        Ok(token) => Ok(warp::reply::json(&token)),
        Err(AuthError::InvalidCredential) => Err(warp::reject::custom(ApiRejection::LoginFailed)),
        Err(e) => Err(reject(e)),
    }
}

async fn change_password_handler(
    user: User,
    form: ChangePasswordForm,
    service: Arc<CredentialService>,
) -> Result<impl Reply, Rejection> {
    service
        .change_secret(&user.username, &form.current_password, &form.new_password)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&MessageBody {
        message: "Password changed successfully",
    }))
}

async fn change_username_handler(
    user: User,
    form: ChangeUsernameForm,
    service: Arc<CredentialService>,
) -> Result<impl Reply, Rejection> {
    service
        .change_identity(&user.username, &form.new_username, &form.password)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&MessageBody {
        message: "Username changed successfully",
    }))
}

async fn create_user_handler(
    request: CreateUserRequest,
    service: Arc<CredentialService>,
) -> Result<impl Reply, Rejection> {
    let user = service
        .register(&request.username, &request.password)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&user))
}

async fn health_handler(service: Arc<CredentialService>) -> Result<warp::reply::Response, Rejection> {
    match service.health_check().await {
        Ok(true) => Ok(warp::reply::with_status("OK", StatusCode::OK).into_response()),
        Ok(false) => Ok(error_reply(StatusCode::SERVICE_UNAVAILABLE, "Credential store unavailable", false)),
        Err(e) => {
            log::error!("Credential store health check failed: {}", e);
            Ok(error_reply(StatusCode::SERVICE_UNAVAILABLE, "Credential store unavailable", false))
        }
    }
}

/// All authentication routes, with rejections rendered as JSON errors
pub fn auth_routes(
    service: Arc<CredentialService>,
    options: HandlerOptions,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let min_duration = options.auth_min_duration;
    let registration_enabled = options.allow_registration;

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::form())
        .and(with_service(service.clone()))
        .and(warp::any().map(move || min_duration))
        .and_then(login_handler);

    let user_info = warp::path!("api" / "admin" / "user-info")
        .and(warp::get())
        .and(with_auth(service.clone()))
        .map(|user: User| {
            warp::reply::json(&UserInfo {
                username: user.username,
                id: user.id,
            })
        });

    let change_password = warp::path!("api" / "admin" / "change-password")
        .and(warp::post())
        .and(with_auth(service.clone()))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::form())
        .and(with_service(service.clone()))
        .and_then(change_password_handler);

    let change_username = warp::path!("api" / "admin" / "change-username")
        .and(warp::post())
        .and(with_auth(service.clone()))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::form())
        .and(with_service(service.clone()))
        .and_then(change_username_handler);

    let create_user = warp::path!("api" / "create-user")
        .and(warp::post())
        .and_then(move || async move {
            if registration_enabled {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(create_user_handler);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_service(service))
        .and_then(health_handler);

    login
        .or(user_info)
        .or(change_password)
        .or(change_username)
        .or(create_user)
        .or(health)
        .recover(handle_rejection)
}

fn error_reply(status: StatusCode, detail: &str, challenge: bool) -> warp::reply::Response {
    let mut response =
        warp::reply::with_status(warp::reply::json(&ErrorBody { detail }), status).into_response();
    if challenge {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}

/// Convert rejections into generic JSON errors. Internal detail stays in the log.
pub async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    if let Some(rejection) = err.find::<ApiRejection>() {
        let response = match rejection {
            ApiRejection::LoginFailed => {
                error_reply(StatusCode::UNAUTHORIZED, "Incorrect username or password", true)
            }
            ApiRejection::Auth(e) => {
                if e.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
                    log::error!("Request failed: {}", e);
                } else {
                    log::debug!("Request rejected: {}", e);
                }
                error_reply(e.status_code(), e.public_message(), e.is_token_failure())
            }
        };
        return Ok(response);
    }

    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found", false));
    }
    if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        return Ok(error_reply(StatusCode::UNPROCESSABLE_ENTITY, "Invalid request body", false));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large", false));
    }
    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_reply(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type", false));
    }
    if err.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(error_reply(StatusCode::LENGTH_REQUIRED, "Content-Length header is required", false));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", false));
    }

    log::error!("Unhandled rejection: {:?}", err);
    Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred", false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc")),
            Some("abc".to_string())
        );
        assert_eq!(extract_token_from_header(Some("Token abc")), None);
        assert_eq!(extract_token_from_header(None), None);
    }

    #[test]
    fn test_error_reply_challenge_header() {
        let response = error_reply(StatusCode::UNAUTHORIZED, "x", true);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = error_reply(StatusCode::BAD_REQUEST, "x", false);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
