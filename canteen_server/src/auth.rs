use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use canteen_engine::db_types::{Customer, Role, UserId};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The claims carried by the identity provider's access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    pub exp: i64,
}

impl JwtClaims {
    /// The customer details that get copied onto a new order.
    pub fn customer(&self) -> Customer {
        Customer::new(self.user_id.clone(), self.username.as_str(), self.email.clone().unwrap_or_default())
    }

    /// Users may only touch their own carts. The user id in the request path must match the token.
    pub fn ensure_is(&self, user_id: &UserId) -> Result<(), ServerError> {
        if &self.user_id == user_id {
            Ok(())
        } else {
            warn!("🔐️ {} tried to act on behalf of {user_id}", self.user_id);
            Err(ServerError::InsufficientPermissions(format!("You may not act on behalf of {user_id}")))
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ No JWT claims found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

/// Checks the signature and expiry of access tokens.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidToken => AuthError::PoorlyFormattedToken(e.to_string()),
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        let claims = data.claims;
        // The id ends up in database keys, so it gets the same checks as any other user id
        claims
            .user_id
            .as_str()
            .parse::<UserId>()
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        trace!("🔐️ Access token validated for {} ({})", claims.user_id, claims.role);
        Ok(claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}
