use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::dto::service_dto::{AdminServiceListQuery, CreateServicePayload, UpdateServicePayload};
use crate::error::{Error, Result};
use crate::models::service::Service;

const SERVICE_COLUMNS: &str =
    "id, title, description, price, duration_minutes, is_active, owner_id, created_at";

/// Admin-owned catalog of bookable services. Services are soft-deleted:
/// an inactive service disappears from public reads but stays a valid
/// target for its historical bookings and reviews.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateServicePayload, owner_id: Uuid) -> Result<Service> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (title, description, price, duration_minutes, is_active, owner_id)
             VALUES ($1, $2, $3, $4, TRUE, $5)
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        info!("Service created: {} by owner {}", service.id, owner_id);
        Ok(service)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Service> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        service.ok_or_else(|| Error::NotFound("Service not found".to_string()))
    }

    /// Public lookup: a missing service and an inactive one are
    /// indistinguishable to the caller.
    pub async fn get_active_by_id(&self, id: Uuid) -> Result<Service> {
        let service = self.get_by_id(id).await?;
        if !service.is_active {
            return Err(Error::NotFound("Service not found".to_string()));
        }
        Ok(service)
    }

    pub async fn list(&self, query: AdminServiceListQuery) -> Result<Vec<Service>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 100);
        let skip = query.skip.unwrap_or(0).max(0);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE 1=1"
        ));
        if let Some(q) = &query.q {
            let pattern = format!("%{}%", q);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(price_min) = query.price_min {
            builder.push(" AND price >= ");
            builder.push_bind(price_min);
        }
        if let Some(price_max) = query.price_max {
            builder.push(" AND price <= ");
            builder.push_bind(price_max);
        }
        if let Some(active) = query.active {
            builder.push(" AND is_active = ");
            builder.push_bind(active);
        }
        if let Some(owner_id) = query.owner_id {
            builder.push(" AND owner_id = ");
            builder.push_bind(owner_id);
        }
        builder.push(" ORDER BY created_at DESC, id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(skip);

        let services = builder
            .build_query_as::<Service>()
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateServicePayload) -> Result<Service> {
        self.get_by_id(id).await?;

        let service = sqlx::query_as::<_, Service>(&format!(
            "UPDATE services
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 duration_minutes = COALESCE($5, duration_minutes)
             WHERE id = $1
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .fetch_one(&self.pool)
        .await?;
        info!("Service updated: {}", id);
        Ok(service)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<Service> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "UPDATE services SET is_active = FALSE WHERE id = $1 RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let service = service.ok_or_else(|| Error::NotFound("Service not found".to_string()))?;
        info!("Service soft-deleted: {}", id);
        Ok(service)
    }
}
