use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::user_dto::{
    LoginResponse, RefreshTokenResponse, RegisterPayload, UpdateUserPayload, UserResponse,
};
use crate::error::{Error, Result};
use crate::models::token_blacklist::BlacklistedToken;
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::jwt::{self, Claims, TOKEN_TYPE_REFRESH};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, status, is_active, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a new user. A soft-deleted user holding the same email is
    /// reactivated in place instead of producing a uniqueness error; an
    /// active user with that email is rejected.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(&payload.email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            if existing.is_active {
                return Err(Error::BadRequest("Email already registered".to_string()));
            }
            let user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users
                 SET name = $2, password_hash = $3, role = $4,
                     status = 'active', is_active = TRUE, created_at = NOW()
                 WHERE id = $1
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(existing.id)
            .bind(&payload.name)
            .bind(hash_password(&payload.password)?)
            .bind(&payload.role)
            .fetch_one(&self.pool)
            .await?;
            info!("Reactivated user {} on registration", user.id);
            return Ok(user);
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role, status, is_active)
             VALUES ($1, $2, $3, $4, 'active', TRUE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(hash_password(&payload.password)?)
        .bind(&payload.role)
        .fetch_one(&self.pool)
        .await?;
        info!("User registered: {}", user.id);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut user) = user else {
            warn!("Failed login attempt for {}", email);
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        };
        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login attempt for {}", email);
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        // A previous logout flips status to inactive; a successful login
        // flips it back.
        if user.status != "active" {
            user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET status = 'active' WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(user.id)
            .fetch_one(&self.pool)
            .await?;
        }

        let access_token = jwt::create_access_token(&user)?;
        let refresh_token = jwt::create_refresh_token(&user)?;
        info!("User logged in: {}", user.id);
        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(user),
        })
    }

    /// Revokes both tokens by jti and marks the user logged out.
    pub async fn logout(&self, user: &User, access: &Claims, refresh_token: &str) -> Result<()> {
        let refresh = jwt::decode_token_of_type(refresh_token, TOKEN_TYPE_REFRESH)?;
        if refresh.user_id()? != user.id {
            return Err(Error::Unauthorized(
                "Refresh token does not belong to this user".to_string(),
            ));
        }

        for claims in [access, &refresh] {
            // Returns no row when the jti was already revoked.
            let entry = sqlx::query_as::<_, BlacklistedToken>(
                "INSERT INTO token_blacklist (jti, token_type, user_id, expires_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (jti) DO NOTHING
                 RETURNING jti, token_type, user_id, expires_at, created_at",
            )
            .bind(claims.jti()?)
            .bind(&claims.token_type)
            .bind(user.id)
            .bind(claims.expires_at())
            .fetch_optional(&self.pool)
            .await?;
            if let Some(entry) = entry {
                info!("Revoked {} token {} for user {}", entry.token_type, entry.jti, entry.user_id);
            }
        }

        sqlx::query("UPDATE users SET status = 'inactive' WHERE id = $1")
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        info!("User logged out: {}", user.id);
        Ok(())
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshTokenResponse> {
        let claims = jwt::decode_token_of_type(refresh_token, TOKEN_TYPE_REFRESH)?;
        let jti = claims.jti()?;

        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        if revoked {
            return Err(Error::Unauthorized(
                "Refresh token has been revoked".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(claims.user_id()?)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid refresh token".to_string()))?;

        Ok(RefreshTokenResponse {
            access_token: jwt::create_access_token(&user)?,
            refresh_token: jwt::create_refresh_token(&user)?,
            token_type: "bearer".to_string(),
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>> {
        let limit = limit.clamp(1, 100);
        let skip = skip.max(0);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User> {
        self.get_by_id(id).await?;

        let password_hash = match &payload.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(payload.name)
        .bind(payload.email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        info!("User updated: {}", id);
        Ok(user)
    }

    /// Soft delete: the row stays behind (bookings and reviews keep their
    /// references) and the email becomes reusable via reactivation.
    pub async fn soft_delete(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = FALSE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let user = user.ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        info!("User soft-deleted: {}", id);
        Ok(user)
    }
}
