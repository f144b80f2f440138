use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    CompanyInfo, Job, JobFields, JobQuery, NewJob, NewUser, Page, ProfileUpdate, Role, SortOrder,
    User, UserProfile,
};
use crate::store::Store;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, profile, company, is_active, last_login, created_at, updated_at";

const JOB_COLUMNS: &str = "id, title, company, location, city, job_type, experience, salary, \
     monthly_salary, description, deadline, is_active, created_by, created_at, updated_at";

/// Durable store backed by Postgres.
pub struct PgStore {
    pool: PgPool,
}

/// Raw user row; profile and company live in JSONB columns.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    profile: Json<UserProfile>,
    company: Json<CompanyInfo>,
    is_active: bool,
    last_login: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            profile: row.profile.0,
            company: row.company.0,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            warn!(error = %e, "migration failed; continuing with the existing schema");
        }

        Ok(Self { pool })
    }
}

/// Appends the WHERE clause shared by the listing and count queries.
fn push_job_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &JobQuery) {
    qb.push(" WHERE is_active = TRUE");

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = query.location {
        qb.push(" AND location = ").push_bind(location);
    }
    if let Some(city) = &query.city {
        qb.push(" AND city ILIKE ").push_bind(format!("%{}%", city));
    }
    if let Some(job_type) = query.job_type {
        qb.push(" AND job_type = ").push_bind(job_type);
    }
    if let Some(pattern) = query.salary_pattern() {
        qb.push(" AND salary ~* ").push_bind(pattern);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_user_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.find_user_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(patch) = update.profile {
            user.profile.merge(patch);
        }
        if let Some(patch) = update.company {
            user.company.merge(patch);
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = $2, profile = $3, company = $4, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&user.name)
        .bind(Json(&user.profile))
        .bind(Json(&user.company))
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(row.into()))
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate_user(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let f = new.fields;
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, company, location, city, job_type, experience,
                              salary, monthly_salary, description, deadline, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(&f.title)
        .bind(&f.company)
        .bind(f.location)
        .bind(&f.city)
        .bind(f.job_type)
        .bind(&f.experience)
        .bind(&f.salary)
        .bind(&f.monthly_salary)
        .bind(&f.description)
        .bind(f.deadline)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Page<Job>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
        push_job_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        push_job_filters(&mut qb, query);
        // Sort column comes from the SortField whitelist, never from raw input;
        // the id tiebreak keeps pagination stable.
        qb.push(" ORDER BY ")
            .push(query.sort.column())
            .push(match query.order {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            })
            .push(", id ASC");
        qb.push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = qb.build_query_as::<Job>().fetch_all(&self.pool).await?;
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn jobs_by_owner(&self, owner: Uuid) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE created_by = $1 ORDER BY created_at DESC, id ASC",
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn update_job(&self, id: Uuid, fields: JobFields) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = $2, company = $3, location = $4, city = $5, job_type = $6,
                experience = $7, salary = $8, monthly_salary = $9, description = $10,
                deadline = $11, updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.company)
        .bind(fields.location)
        .bind(&fields.city)
        .bind(fields.job_type)
        .bind(&fields.experience)
        .bind(&fields.salary)
        .bind(&fields.monthly_salary)
        .bind(&fields.description)
        .bind(fields.deadline)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn deactivate_job(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE jobs SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate_expired_jobs(&self, now: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET is_active = FALSE, updated_at = now() \
             WHERE is_active = TRUE AND deadline IS NOT NULL AND deadline < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
