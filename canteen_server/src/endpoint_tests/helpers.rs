use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use canteen_engine::db_types::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenValidator},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Shared secret for issuing test tokens. DO NOT re-use it anywhere.
pub const TEST_JWT_SECRET: &str = "endpoint-tests-only-2b7c9e41d5";

pub fn claims(user_id: &str, role: Role) -> JwtClaims {
    JwtClaims {
        user_id: user_id.parse().unwrap(),
        username: format!("{user_id}-name"),
        email: Some(format!("{user_id}@example.com")),
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    }
}

pub fn issue_token(claims: &JwtClaims) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub fn user_token(user_id: &str) -> String {
    issue_token(&claims(user_id, Role::User))
}

pub fn admin_token() -> String {
    issue_token(&claims("canteen-admin", Role::Admin))
}

/// Sends the request through the JWT middleware and the routes added by `configure`.
///
/// Middleware rejections come back as `Err` with the error message. Handler errors come back as a normal response.
pub async fn send_request(
    req: TestRequest,
    token: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header((AUTHORIZATION, format!("Bearer {token}")));
    }
    let config = AuthConfig::new(TEST_JWT_SECRET).unwrap();
    let app = App::new().wrap(JwtMiddlewareFactory::new(TokenValidator::new(&config))).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::get().uri(path), token, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::post().uri(path).set_json(body), token, configure).await
}

pub async fn put_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::put().uri(path).set_json(body), token, configure).await
}

pub async fn patch_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::patch().uri(path), token, configure).await
}

pub async fn delete_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(TestRequest::delete().uri(path), token, configure).await
}
