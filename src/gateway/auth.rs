//! Bearer token verification, grounded on `gateway/auth.py`'s `verify_token`: same secret/algorithm
//! pair, same distinction between an expired signature and any other decode failure.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::MoniflowError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn parse_algorithm(name: &str) -> Result<Algorithm, MoniflowError> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(MoniflowError::ServiceUnavailable(format!(
            "unsupported JWT algorithm: {other}"
        ))),
    }
}

/// Decode and verify a bearer token's signature and expiry.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, MoniflowError> {
    let algorithm = parse_algorithm(&config.algorithm)?;
    let validation = Validation::new(algorithm);
    let key = DecodingKey::from_secret(config.secret_key.as_bytes());

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(err) => match err.kind() {
            ErrorKind::ExpiredSignature => Err(MoniflowError::AuthExpired),
            _ => Err(MoniflowError::AuthInvalid),
        },
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, MoniflowError> {
    let header_value = header_value.ok_or(MoniflowError::AuthMissing)?;
    header_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(MoniflowError::AuthMalformed)
}
