//! # Postgres Repository
//!
//! `sqlx` implementation of the repository contracts. Queries are built at
//! runtime (`query_as` + `QueryBuilder`), so the crate compiles without a live
//! database. Tags, metadata and policy conditions are stored as JSONB.

use super::errors::{PersistenceError, PersistenceResult};
use super::traits::{
    PolicyFilter, PolicyRepository, ResourceFilter, ResourceRepository, ScanFilter,
    ScanRepository,
};
use crate::config::DatabaseConfig;
use crate::models::{
    CloudProvider, Policy, PolicyAction, PolicyConditions, Resource, ResourceType, Scan, Tags,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Rows per multi-VALUES insert; keeps bind parameters well under the protocol limit
const UPSERT_CHUNK_SIZE: usize = 1000;

const RESOURCE_COLUMNS: &str = "id, organization_id, provider, resource_type, resource_id, region, name, \
     status, tags, metadata, monthly_cost, carbon_footprint, last_seen_at, created_at, updated_at";

const SCAN_COLUMNS: &str = "id, organization_id, provider, regions, resource_types, status, \
     resources_found, unused_found, estimated_savings, carbon_savings, error_message, \
     started_at, completed_at, created_at, updated_at";

const POLICY_COLUMNS: &str = "id, organization_id, name, description, provider, resource_types, \
     conditions, actions, is_enabled, schedule, created_at, updated_at";

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> PersistenceResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> PersistenceResult<()> {
        MIGRATOR.run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_enum<T: FromStr<Err = String>>(entity: &'static str, raw: &str) -> PersistenceResult<T> {
    raw.parse().map_err(|e: String| PersistenceError::decode(entity, e))
}

fn parse_all<T: FromStr<Err = String>>(
    entity: &'static str,
    raw: &[String],
) -> PersistenceResult<Vec<T>> {
    raw.iter().map(|s| parse_enum(entity, s)).collect()
}

fn to_strings<T: ToString>(items: &[T]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: Uuid,
    organization_id: Uuid,
    provider: String,
    resource_type: String,
    resource_id: String,
    region: String,
    name: String,
    status: String,
    tags: Json<Tags>,
    metadata: Json<HashMap<String, Value>>,
    monthly_cost: f64,
    carbon_footprint: f64,
    last_seen_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = PersistenceError;

    fn try_from(row: ResourceRow) -> PersistenceResult<Self> {
        Ok(Resource {
            id: row.id,
            organization_id: row.organization_id,
            provider: parse_enum("resource", &row.provider)?,
            resource_type: parse_enum("resource", &row.resource_type)?,
            resource_id: row.resource_id,
            region: row.region,
            name: row.name,
            status: parse_enum("resource", &row.status)?,
            tags: row.tags.0,
            metadata: row.metadata.0,
            monthly_cost: row.monthly_cost,
            carbon_footprint: row.carbon_footprint,
            last_seen_at: row.last_seen_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ScanRow {
    id: Uuid,
    organization_id: Uuid,
    provider: String,
    regions: Vec<String>,
    resource_types: Vec<String>,
    status: String,
    resources_found: i32,
    unused_found: i32,
    estimated_savings: f64,
    carbon_savings: f64,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScanRow> for Scan {
    type Error = PersistenceError;

    fn try_from(row: ScanRow) -> PersistenceResult<Self> {
        Ok(Scan {
            id: row.id,
            organization_id: row.organization_id,
            provider: parse_enum("scan", &row.provider)?,
            regions: row.regions,
            resource_types: parse_all::<ResourceType>("scan", &row.resource_types)?,
            status: parse_enum("scan", &row.status)?,
            resources_found: row.resources_found,
            unused_found: row.unused_found,
            estimated_savings: row.estimated_savings,
            carbon_savings: row.carbon_savings,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    description: String,
    provider: String,
    resource_types: Vec<String>,
    conditions: Json<PolicyConditions>,
    actions: Vec<String>,
    is_enabled: bool,
    schedule: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PolicyRow> for Policy {
    type Error = PersistenceError;

    fn try_from(row: PolicyRow) -> PersistenceResult<Self> {
        Ok(Policy {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            provider: parse_enum::<CloudProvider>("policy", &row.provider)?,
            resource_types: parse_all::<ResourceType>("policy", &row.resource_types)?,
            conditions: row.conditions.0,
            actions: parse_all::<PolicyAction>("policy", &row.actions)?,
            is_enabled: row.is_enabled,
            schedule: row.schedule,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_resource_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ResourceFilter) {
    query.push(" WHERE TRUE");
    if let Some(org) = filter.organization_id {
        query.push(" AND organization_id = ").push_bind(org);
    }
    if let Some(provider) = filter.provider {
        query.push(" AND provider = ").push_bind(provider.as_str());
    }
    if let Some(resource_type) = filter.resource_type {
        query
            .push(" AND resource_type = ")
            .push_bind(resource_type.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(region) = &filter.region {
        query.push(" AND region = ").push_bind(region.clone());
    }
    if filter.exclude_deleted {
        query.push(" AND status <> 'deleted'");
    }
}

fn push_page(query: &mut QueryBuilder<'_, Postgres>, limit: Option<i64>, offset: Option<i64>) {
    if let Some(limit) = limit {
        query.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = offset {
        query.push(" OFFSET ").push_bind(offset);
    }
}

#[async_trait]
impl ResourceRepository for PgRepository {
    async fn create(&self, resource: &Resource) -> PersistenceResult<()> {
        let sql = format!(
            "INSERT INTO resources ({RESOURCE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );
        let result = sqlx::query(&sql)
            .bind(resource.id)
            .bind(resource.organization_id)
            .bind(resource.provider.as_str())
            .bind(resource.resource_type.as_str())
            .bind(&resource.resource_id)
            .bind(&resource.region)
            .bind(&resource.name)
            .bind(resource.status.as_str())
            .bind(Json(&resource.tags))
            .bind(Json(&resource.metadata))
            .bind(resource.monthly_cost)
            .bind(resource.carbon_footprint)
            .bind(resource.last_seen_at)
            .bind(resource.created_at)
            .bind(resource.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(PersistenceError::Conflict {
                    entity: "resource",
                    key: format!("{}/{}", resource.provider, resource.resource_id),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, resource: &Resource) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE resources SET name = $2, region = $3, status = $4, tags = $5, metadata = $6, \
             monthly_cost = $7, carbon_footprint = $8, last_seen_at = $9, updated_at = $10 \
             WHERE id = $1",
        )
        .bind(resource.id)
        .bind(&resource.name)
        .bind(&resource.region)
        .bind(resource.status.as_str())
        .bind(Json(&resource.tags))
        .bind(Json(&resource.metadata))
        .bind(resource.monthly_cost)
        .bind(resource.carbon_footprint)
        .bind(resource.last_seen_at)
        .bind(resource.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("resource", resource.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Resource>> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1");
        sqlx::query_as::<_, ResourceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn list(&self, filter: &ResourceFilter) -> PersistenceResult<Vec<Resource>> {
        let mut query = QueryBuilder::new(format!("SELECT {RESOURCE_COLUMNS} FROM resources"));
        push_resource_filter(&mut query, filter);
        query.push(" ORDER BY created_at ASC, id ASC");
        push_page(&mut query, filter.limit, filter.offset);

        query
            .build_query_as::<ResourceRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Resource::try_from)
            .collect()
    }

    async fn count(&self, filter: &ResourceFilter) -> PersistenceResult<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM resources");
        push_resource_filter(&mut query, filter);
        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn bulk_upsert(&self, resources: &[Resource]) -> PersistenceResult<()> {
        if resources.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in resources.chunks(UPSERT_CHUNK_SIZE) {
            let mut query = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO resources ({RESOURCE_COLUMNS}) "
            ));
            query.push_values(chunk, |mut row, r| {
                row.push_bind(r.id)
                    .push_bind(r.organization_id)
                    .push_bind(r.provider.as_str())
                    .push_bind(r.resource_type.as_str())
                    .push_bind(r.resource_id.clone())
                    .push_bind(r.region.clone())
                    .push_bind(r.name.clone())
                    .push_bind(r.status.as_str())
                    .push_bind(Json(r.tags.clone()))
                    .push_bind(Json(r.metadata.clone()))
                    .push_bind(r.monthly_cost)
                    .push_bind(r.carbon_footprint)
                    .push_bind(r.last_seen_at)
                    .push_bind(r.created_at)
                    .push_bind(r.updated_at);
            });
            // Only an active row may move, and only to active/unused
            query.push(
                " ON CONFLICT (organization_id, provider, resource_id) DO UPDATE SET \
                 name = EXCLUDED.name, region = EXCLUDED.region, tags = EXCLUDED.tags, \
                 metadata = EXCLUDED.metadata, monthly_cost = EXCLUDED.monthly_cost, \
                 carbon_footprint = EXCLUDED.carbon_footprint, \
                 status = CASE WHEN resources.status = 'active' \
                     AND EXCLUDED.status IN ('active', 'unused') \
                     THEN EXCLUDED.status ELSE resources.status END, \
                 last_seen_at = EXCLUDED.last_seen_at, updated_at = NOW()",
            );
            query.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(count = resources.len(), "Upserted resources");
        Ok(())
    }

    async fn bulk_update(&self, resources: &[Resource]) -> PersistenceResult<()> {
        let mut tx = self.pool.begin().await?;
        for resource in resources {
            let result = sqlx::query(
                "UPDATE resources SET status = $2, tags = $3, metadata = $4, monthly_cost = $5, \
                 carbon_footprint = $6, updated_at = $7 WHERE id = $1",
            )
            .bind(resource.id)
            .bind(resource.status.as_str())
            .bind(Json(&resource.tags))
            .bind(Json(&resource.metadata))
            .bind(resource.monthly_cost)
            .bind(resource.carbon_footprint)
            .bind(resource.updated_at)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(PersistenceError::not_found("resource", resource.id));
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ScanRepository for PgRepository {
    async fn create(&self, scan: &Scan) -> PersistenceResult<()> {
        let sql = format!(
            "INSERT INTO scans ({SCAN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );
        sqlx::query(&sql)
            .bind(scan.id)
            .bind(scan.organization_id)
            .bind(scan.provider.as_str())
            .bind(&scan.regions)
            .bind(to_strings(&scan.resource_types))
            .bind(scan.status.as_str())
            .bind(scan.resources_found)
            .bind(scan.unused_found)
            .bind(scan.estimated_savings)
            .bind(scan.carbon_savings)
            .bind(&scan.error_message)
            .bind(scan.started_at)
            .bind(scan.completed_at)
            .bind(scan.created_at)
            .bind(scan.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, scan: &Scan) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE scans SET status = $2, resources_found = $3, unused_found = $4, \
             estimated_savings = $5, carbon_savings = $6, error_message = $7, started_at = $8, \
             completed_at = $9, updated_at = $10 WHERE id = $1",
        )
        .bind(scan.id)
        .bind(scan.status.as_str())
        .bind(scan.resources_found)
        .bind(scan.unused_found)
        .bind(scan.estimated_savings)
        .bind(scan.carbon_savings)
        .bind(&scan.error_message)
        .bind(scan.started_at)
        .bind(scan.completed_at)
        .bind(scan.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("scan", scan.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Scan>> {
        let sql = format!("SELECT {SCAN_COLUMNS} FROM scans WHERE id = $1");
        sqlx::query_as::<_, ScanRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Scan::try_from)
            .transpose()
    }

    async fn list(&self, filter: &ScanFilter) -> PersistenceResult<Vec<Scan>> {
        let mut query = QueryBuilder::new(format!("SELECT {SCAN_COLUMNS} FROM scans WHERE TRUE"));
        if let Some(org) = filter.organization_id {
            query.push(" AND organization_id = ").push_bind(org);
        }
        if let Some(provider) = filter.provider {
            query.push(" AND provider = ").push_bind(provider.as_str());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC");
        push_page(&mut query, filter.limit, filter.offset);

        query
            .build_query_as::<ScanRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Scan::try_from)
            .collect()
    }

    async fn latest(
        &self,
        organization_id: Uuid,
        provider: Option<CloudProvider>,
    ) -> PersistenceResult<Option<Scan>> {
        let filter = ScanFilter {
            provider,
            limit: Some(1),
            ..ScanFilter::for_organization(organization_id)
        };
        Ok(ScanRepository::list(self, &filter).await?.into_iter().next())
    }
}

#[async_trait]
impl PolicyRepository for PgRepository {
    async fn create(&self, policy: &Policy) -> PersistenceResult<()> {
        let sql = format!(
            "INSERT INTO policies ({POLICY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(policy.id)
            .bind(policy.organization_id)
            .bind(&policy.name)
            .bind(&policy.description)
            .bind(policy.provider.as_str())
            .bind(to_strings(&policy.resource_types))
            .bind(Json(&policy.conditions))
            .bind(to_strings(&policy.actions))
            .bind(policy.is_enabled)
            .bind(&policy.schedule)
            .bind(policy.created_at)
            .bind(policy.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, policy: &Policy) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE policies SET name = $2, description = $3, provider = $4, resource_types = $5, \
             conditions = $6, actions = $7, is_enabled = $8, schedule = $9, updated_at = $10 \
             WHERE id = $1",
        )
        .bind(policy.id)
        .bind(&policy.name)
        .bind(&policy.description)
        .bind(policy.provider.as_str())
        .bind(to_strings(&policy.resource_types))
        .bind(Json(&policy.conditions))
        .bind(to_strings(&policy.actions))
        .bind(policy.is_enabled)
        .bind(&policy.schedule)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("policy", policy.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("policy", id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Policy>> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM policies WHERE id = $1");
        sqlx::query_as::<_, PolicyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Policy::try_from)
            .transpose()
    }

    async fn list(&self, filter: &PolicyFilter) -> PersistenceResult<Vec<Policy>> {
        let mut query =
            QueryBuilder::new(format!("SELECT {POLICY_COLUMNS} FROM policies WHERE TRUE"));
        if let Some(org) = filter.organization_id {
            query.push(" AND organization_id = ").push_bind(org);
        }
        if let Some(provider) = filter.provider {
            query.push(" AND provider = ").push_bind(provider.as_str());
        }
        if let Some(enabled) = filter.is_enabled {
            query.push(" AND is_enabled = ").push_bind(enabled);
        }
        query.push(" ORDER BY created_at ASC, id ASC");
        push_page(&mut query, filter.limit, filter.offset);

        query
            .build_query_as::<PolicyRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Policy::try_from)
            .collect()
    }

    async fn enabled_for_organization(&self, organization_id: Uuid) -> PersistenceResult<Vec<Policy>> {
        let filter = PolicyFilter {
            is_enabled: Some(true),
            ..PolicyFilter::for_organization(organization_id)
        };
        PolicyRepository::list(self, &filter).await
    }
}
