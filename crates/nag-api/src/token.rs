use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use nag_types::api::Claims;

/// Used when no secret is configured. Insecure; the server warns at startup.
pub const DEV_SECRET: &str = "dev-secret-change-me";

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("bad token signature")]
    BadSignature,
}

/// Issues and verifies HS256 bearer tokens. Stateless: a token stays valid
/// until it expires.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: i64, username: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> anyhow::Result<String> {
        let expires_at = issued_at + Duration::days(TOKEN_LIFETIME_DAYS);
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: issued_at.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret")
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = service();
        let token = tokens.issue(7, "alice").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(
            claims.exp - claims.iat,
            (TOKEN_LIFETIME_DAYS * 24 * 60 * 60) as usize
        );
    }

    #[test]
    fn flipped_signature_byte_is_rejected() {
        let tokens = service();
        let token = tokens.issue(1, "alice").unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let signature = &mut parts[2];
        let first = signature.remove(0);
        signature.insert(0, if first == 'A' { 'B' } else { 'A' });
        let tampered = parts.join(".");

        assert_eq!(tokens.verify(&tampered).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS + 1);
        let token = tokens.issue_at(1, "alice", issued_at).unwrap();

        assert_eq!(tokens.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenService::new("someone-else").issue(1, "alice").unwrap();
        assert_eq!(service().verify(&token).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(service().verify("not-a-token").unwrap_err(), TokenError::Malformed);
        assert_eq!(service().verify("").unwrap_err(), TokenError::Malformed);
    }
}
