use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A revoked token, keyed by its JWT id. Rows past `expires_at` are
/// harmless and can be purged at leisure.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlacklistedToken {
    pub jti: Uuid,
    pub token_type: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
