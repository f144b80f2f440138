use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{
    Job, JobFields, JobQuery, NewJob, NewUser, Page, ProfileUpdate, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

/// Persistence backend. One implementation is selected at startup and used
/// for the lifetime of the process; durable and ephemeral stores are never
/// mixed at the request level.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn update_user_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>>;
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()>;
    async fn touch_last_login(&self, id: Uuid) -> Result<()>;
    async fn deactivate_user(&self, id: Uuid) -> Result<()>;

    async fn insert_job(&self, new: NewJob) -> Result<Job>;
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;
    async fn list_jobs(&self, query: &JobQuery) -> Result<Page<Job>>;
    async fn jobs_by_owner(&self, owner: Uuid) -> Result<Vec<Job>>;
    async fn update_job(&self, id: Uuid, fields: JobFields) -> Result<Option<Job>>;
    async fn deactivate_job(&self, id: Uuid) -> Result<()>;
    /// Flips `is_active` for every job whose deadline has passed. Returns the
    /// number of jobs deactivated; a repeat call under an unchanged clock
    /// finds nothing left to do.
    async fn deactivate_expired_jobs(&self, now: OffsetDateTime) -> Result<u64>;
}

/// Pick the backing store once at startup: Postgres when `DATABASE_URL` is
/// set and reachable, otherwise the ephemeral in-memory store.
pub async fn connect(config: &AppConfig) -> Arc<dyn Store> {
    match &config.database_url {
        Some(url) => match PgStore::connect(url).await {
            Ok(store) => {
                info!("connected to postgres");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "database unreachable; falling back to the in-memory store");
                Arc::new(MemStore::new())
            }
        },
        None => {
            warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemStore::new())
        }
    }
}
