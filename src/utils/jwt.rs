use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::user::User;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Could not validate credentials".to_string()))
    }

    pub fn jti(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.jti)
            .map_err(|_| Error::Unauthorized("Could not validate credentials".to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

fn issue_token(user: &User, token_type: &str, ttl: Duration) -> Result<String> {
    let config = get_config();
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token encoding failed: {}", e)))
}

pub fn create_access_token(user: &User) -> Result<String> {
    let config = get_config();
    issue_token(
        user,
        TOKEN_TYPE_ACCESS,
        Duration::minutes(config.access_token_expire_minutes),
    )
}

pub fn create_refresh_token(user: &User) -> Result<String> {
    let config = get_config();
    issue_token(
        user,
        TOKEN_TYPE_REFRESH,
        Duration::days(config.refresh_token_expire_days),
    )
}

/// Decodes and verifies a token. Expired, malformed, and tampered tokens
/// are all rejected uniformly as unauthorized.
pub fn decode_token(token: &str) -> Result<Claims> {
    let config = get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("Could not validate credentials".to_string()))
}

/// Decodes a token and additionally checks its `type` claim.
pub fn decode_token_of_type(token: &str, expected_type: &str) -> Result<Claims> {
    let claims = decode_token(token)?;
    if claims.token_type != expected_type {
        return Err(Error::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, CONFIG};

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            role: "user".into(),
            status: "active".into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn ensure_config() {
        let _ = CONFIG.set(Config {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/test".into(),
            jwt_secret: "test_secret_key".into(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
        });
    }

    #[test]
    fn access_token_round_trips() {
        ensure_config();
        let user = test_user();
        let token = create_access_token(&user).unwrap();
        let claims = decode_token_of_type(&token, TOKEN_TYPE_ACCESS).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.role, "user");
        assert!(claims.jti().is_ok());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        ensure_config();
        let user = test_user();
        let token = create_refresh_token(&user).unwrap();
        assert!(decode_token_of_type(&token, TOKEN_TYPE_ACCESS).is_err());
        assert!(decode_token_of_type(&token, TOKEN_TYPE_REFRESH).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        ensure_config();
        let user = test_user();
        let mut token = create_access_token(&user).unwrap();
        token.push('x');
        assert!(decode_token(&token).is_err());
    }
}
