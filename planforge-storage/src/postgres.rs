//! PostgreSQL document store.
//!
//! Connection pooling uses deadpool-postgres. A session is a pooled
//! connection with an open `BEGIN`; it is returned to the pool after
//! `COMMIT`/`ROLLBACK`. A session dropped while its transaction is still
//! open detaches the connection from the pool and closes it, which makes
//! the server roll the transaction back.

use crate::{DocumentStore, LinkOutcome, ProjectDocument, StoreSession};
use ::async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use planforge_core::{
    ActivityRecord, EntityIdType, EntityKind, FloorPlan, FloorPlanId, FloorPlanStatus, Location,
    ProjectId, StorageError, UserId,
};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

const PROJECT_COLUMNS: &str = "project_id, building_type, land_area, land_area_unit, budget, \
     currency, location_state, location_country, bedrooms, bathrooms, linked_artifact_ids";

const FLOOR_PLAN_COLUMNS: &str =
    "floor_plan_id, project_id, user_id, image_url, requirements, status, created_at";

// Push-with-default: a missing or non-array value is replaced by an empty
// array before the append. The RETURNING flag reports whether the row now
// contains the id.
const LINK_SQL: &str = "UPDATE projects \
     SET linked_artifact_ids = \
         (CASE WHEN jsonb_typeof(linked_artifact_ids) = 'array' \
               THEN linked_artifact_ids ELSE '[]'::jsonb END) \
         || jsonb_build_array($2::text) \
     WHERE project_id = $1 \
     RETURNING linked_artifact_ids @> jsonb_build_array($2::text)";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection wait timeout
    pub timeout: Duration,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "planforge".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("PLANFORGE_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("PLANFORGE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("PLANFORGE_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("PLANFORGE_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("PLANFORGE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PLANFORGE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("PLANFORGE_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> Result<Pool, StorageError> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| backend(format!("failed to create pool: {e}")))
    }
}

// ============================================================================
// STORE
// ============================================================================

/// PostgreSQL-backed [`DocumentStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> Result<Self, StorageError> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Create the tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL).await.map_err(backend)?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    /// Create or replace a project row.
    pub async fn upsert_project(&self, document: &ProjectDocument) -> Result<(), StorageError> {
        let conn = self.get_conn().await?;
        let bedrooms = document.bedrooms.map(count_to_db).transpose()?;
        let bathrooms = document.bathrooms.map(count_to_db).transpose()?;
        conn.execute(
            "INSERT INTO projects (project_id, building_type, land_area, land_area_unit, budget, \
                 currency, location_state, location_country, bedrooms, bathrooms, linked_artifact_ids) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (project_id) DO UPDATE SET \
                 building_type = EXCLUDED.building_type, land_area = EXCLUDED.land_area, \
                 land_area_unit = EXCLUDED.land_area_unit, budget = EXCLUDED.budget, \
                 currency = EXCLUDED.currency, location_state = EXCLUDED.location_state, \
                 location_country = EXCLUDED.location_country, bedrooms = EXCLUDED.bedrooms, \
                 bathrooms = EXCLUDED.bathrooms, linked_artifact_ids = EXCLUDED.linked_artifact_ids",
            &[
                &document.project_id.as_uuid(),
                &document.building_type,
                &document.land_area,
                &document.land_area_unit,
                &document.budget,
                &document.currency,
                &document.location.state,
                &document.location.country,
                &bedrooms,
                &bathrooms,
                &document.linked_artifact_ids,
            ],
        )
        .await
        .map_err(|e| StorageError::InsertFailed {
            entity: EntityKind::Project,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Number of activity rows referencing `floor_plan_id`.
    pub async fn count_activities(&self, floor_plan_id: FloorPlanId) -> Result<i64, StorageError> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM activities WHERE floor_plan_id = $1",
                &[&floor_plan_id.as_uuid()],
            )
            .await
            .map_err(backend)?;
        row.try_get(0).map_err(backend)
    }

    async fn get_conn(&self) -> Result<Object, StorageError> {
        self.pool.get().await.map_err(backend)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<ProjectDocument>, StorageError> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = $1");
        let row = conn
            .query_opt(sql.as_str(), &[&project_id.as_uuid()])
            .await
            .map_err(backend)?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn list_floor_plans(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<FloorPlan>, StorageError> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {FLOOR_PLAN_COLUMNS} FROM floor_plans WHERE project_id = $1 ORDER BY created_at"
        );
        let rows = conn
            .query(sql.as_str(), &[&project_id.as_uuid()])
            .await
            .map_err(backend)?;
        rows.iter().map(floor_plan_from_row).collect()
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        let conn = self.get_conn().await?;
        conn.simple_query("SELECT 1").await.map_err(backend)?;
        Ok(())
    }

    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StorageError> {
        let conn = self.get_conn().await?;
        conn.batch_execute("BEGIN")
            .await
            .map_err(|e| StorageError::TransactionFailed {
                reason: e.to_string(),
            })?;
        Ok(Box::new(PgSession { conn: Some(conn) }))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

// ============================================================================
// SESSION
// ============================================================================

struct PgSession {
    /// `Some` while the transaction is open.
    conn: Option<Object>,
}

impl PgSession {
    fn conn(&self) -> Result<&Object, StorageError> {
        self.conn.as_ref().ok_or_else(|| StorageError::TransactionFailed {
            reason: "session already closed".to_string(),
        })
    }

    async fn finish(mut self: Box<Self>, statement: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        match conn.batch_execute(statement).await {
            Ok(()) => {
                // Transaction closed; the connection may go back to the pool.
                self.conn.take();
                Ok(())
            }
            Err(e) => Err(StorageError::TransactionFailed {
                reason: format!("{statement} failed: {e}"),
            }),
        }
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Session dropped with an open transaction; discarding connection");
            drop(Object::take(conn));
        }
    }
}

#[async_trait]
impl StoreSession for PgSession {
    async fn insert_floor_plan(&mut self, plan: &FloorPlan) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let sql = format!(
            "INSERT INTO floor_plans ({FLOOR_PLAN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        conn.execute(
            sql.as_str(),
            &[
                &plan.floor_plan_id.as_uuid(),
                &plan.project_id.as_uuid(),
                &plan.user_id.as_str(),
                &plan.image_url,
                &plan.requirements,
                &plan.status.as_db_str(),
                &plan.created_at,
            ],
        )
        .await
        .map_err(|e| StorageError::InsertFailed {
            entity: EntityKind::FloorPlan,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn push_linked_artifact(
        &mut self,
        project_id: ProjectId,
        floor_plan_id: FloorPlanId,
    ) -> Result<LinkOutcome, StorageError> {
        let conn = self.conn()?;
        let rows = conn
            .query(LINK_SQL, &[&project_id.as_uuid(), &floor_plan_id.to_string()])
            .await
            .map_err(|e| StorageError::UpdateFailed {
                entity: EntityKind::Project,
                id: project_id.to_string(),
                reason: e.to_string(),
            })?;

        let mut modified = 0;
        for row in &rows {
            let contains: Option<bool> = row.try_get(0).map_err(backend)?;
            if contains.unwrap_or(false) {
                modified += 1;
            }
        }
        Ok(LinkOutcome::new(rows.len() as u64, modified))
    }

    async fn insert_activity(&mut self, record: &ActivityRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activities (activity_id, user_id, action, floor_plan_id, project_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &record.activity_id.as_uuid(),
                &record.user_id.as_str(),
                &record.action.as_db_str(),
                &record.floor_plan_id.as_uuid(),
                &record.project_id.as_uuid(),
                &record.created_at,
            ],
        )
        .await
        .map_err(|e| StorageError::InsertFailed {
            entity: EntityKind::Activity,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.finish("COMMIT").await
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        self.finish("ROLLBACK").await
    }
}

// ============================================================================
// ROW CONVERSION
// ============================================================================

fn project_from_row(row: &Row) -> Result<ProjectDocument, StorageError> {
    let project_id: Uuid = row.try_get("project_id").map_err(malformed_project)?;
    let bedrooms: Option<i32> = row.try_get("bedrooms").map_err(malformed_project)?;
    let bathrooms: Option<i32> = row.try_get("bathrooms").map_err(malformed_project)?;
    let linked_artifact_ids: Option<JsonValue> =
        row.try_get("linked_artifact_ids").map_err(malformed_project)?;

    Ok(ProjectDocument {
        project_id: ProjectId::new(project_id),
        building_type: row.try_get("building_type").map_err(malformed_project)?,
        land_area: row.try_get("land_area").map_err(malformed_project)?,
        land_area_unit: row.try_get("land_area_unit").map_err(malformed_project)?,
        budget: row.try_get("budget").map_err(malformed_project)?,
        currency: row.try_get("currency").map_err(malformed_project)?,
        location: Location {
            state: row.try_get("location_state").map_err(malformed_project)?,
            country: row.try_get("location_country").map_err(malformed_project)?,
        },
        // Negative counts are treated as absent.
        bedrooms: bedrooms.and_then(|n| u32::try_from(n).ok()),
        bathrooms: bathrooms.and_then(|n| u32::try_from(n).ok()),
        linked_artifact_ids,
    })
}

fn floor_plan_from_row(row: &Row) -> Result<FloorPlan, StorageError> {
    let floor_plan_id: Uuid = row.try_get("floor_plan_id").map_err(malformed_floor_plan)?;
    let project_id: Uuid = row.try_get("project_id").map_err(malformed_floor_plan)?;
    let user_id: String = row.try_get("user_id").map_err(malformed_floor_plan)?;
    let status: String = row.try_get("status").map_err(malformed_floor_plan)?;

    Ok(FloorPlan {
        floor_plan_id: FloorPlanId::new(floor_plan_id),
        project_id: ProjectId::new(project_id),
        user_id: UserId::new(user_id),
        image_url: row.try_get("image_url").map_err(malformed_floor_plan)?,
        requirements: row.try_get("requirements").map_err(malformed_floor_plan)?,
        status: FloorPlanStatus::from_db_str(&status).map_err(malformed_floor_plan)?,
        created_at: row.try_get("created_at").map_err(malformed_floor_plan)?,
    })
}

fn count_to_db(count: u32) -> Result<i32, StorageError> {
    i32::try_from(count).map_err(|_| StorageError::InsertFailed {
        entity: EntityKind::Project,
        reason: format!("room count {count} out of range"),
    })
}

fn malformed_project(err: impl fmt::Display) -> StorageError {
    StorageError::Malformed {
        entity: EntityKind::Project,
        reason: err.to_string(),
    }
}

fn malformed_floor_plan(err: impl fmt::Display) -> StorageError {
    StorageError::Malformed {
        entity: EntityKind::FloorPlan,
        reason: err.to_string(),
    }
}

fn backend(err: impl fmt::Display) -> StorageError {
    StorageError::Backend {
        reason: err.to_string(),
    }
}
