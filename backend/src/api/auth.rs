//! Bearer token issuing and verification (HS256 JWT).

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ServerResult;

/// Token lifetime in seconds
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Subject name put in every issued token
pub const CLIENT_NAME: &str = "FMUClient";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens with a shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token valid for [`TOKEN_TTL_SECS`] from now.
    pub fn issue(&self, name: &str) -> ServerResult<String> {
        self.issue_at(name, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    pub fn issue_at(&self, name: &str, now: i64) -> ServerResult<String> {
        let claims = Claims {
            name: name.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> ServerResult<Claims> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("segredo");
        let token = issuer.issue(CLIENT_NAME).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.name, CLIENT_NAME);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("segredo").issue(CLIENT_NAME).unwrap();
        assert!(TokenIssuer::new("outro").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("segredo");
        let two_hours_ago = chrono::Utc::now().timestamp() - 2 * TOKEN_TTL_SECS;
        let token = issuer.issue_at(CLIENT_NAME, two_hours_ago).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
