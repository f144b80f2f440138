use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    CompanyInfo, Job, JobFields, JobQuery, NewJob, NewUser, Page, ProfileUpdate, SortField,
    SortOrder, User, UserProfile,
};
use crate::store::Store;

/// Ephemeral in-process store, selected when no database is reachable.
/// Mirrors the Postgres filter semantics so a degraded deployment behaves
/// the same, minus durability.
#[derive(Default)]
pub struct MemStore {
    users: RwLock<HashMap<Uuid, User>>,
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(job: &Job, query: &JobQuery) -> bool {
    if !job.is_active {
        return false;
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let hit = job.title.to_lowercase().contains(&needle)
            || job.company.to_lowercase().contains(&needle)
            || job.description.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }
    if let Some(location) = query.location {
        if job.location != location {
            return false;
        }
    }
    if let Some(city) = &query.city {
        if !job.city.to_lowercase().contains(&city.to_lowercase()) {
            return false;
        }
    }
    if let Some(job_type) = query.job_type {
        if job.job_type != job_type {
            return false;
        }
    }
    if let Some(pattern) = query.salary_pattern() {
        // Same character-class pattern Postgres applies with `~*`.
        if let Ok(re) = Regex::new(&format!("(?i){}", pattern)) {
            if !re.is_match(&job.salary) {
                return false;
            }
        }
    }
    true
}

/// Missing deadlines sort after any set deadline, matching Postgres'
/// default NULLS LAST (the direction flip below then reproduces NULLS
/// FIRST for descending sorts).
fn cmp_deadline(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

fn sort_jobs(items: &mut [Job], sort: SortField, order: SortOrder) {
    items.sort_by(|a, b| {
        let primary = match sort {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Company => a.company.cmp(&b.company),
            SortField::Salary => a.salary.cmp(&b.salary),
            SortField::Deadline => cmp_deadline(a.deadline, b.deadline),
        };
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            profile: UserProfile::default(),
            company: CompanyInfo::default(),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_user_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
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
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.password_hash = hash.to_string();
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.last_login = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn deactivate_user(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.is_active = false;
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn insert_job(&self, new: NewJob) -> Result<Job> {
        let now = OffsetDateTime::now_utc();
        let f = new.fields;
        let job = Job {
            id: Uuid::new_v4(),
            title: f.title,
            company: f.company,
            location: f.location,
            city: f.city,
            job_type: f.job_type,
            experience: f.experience,
            salary: f.salary,
            monthly_salary: f.monthly_salary,
            description: f.description,
            deadline: f.deadline,
            is_active: true,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Page<Job>> {
        let jobs = self.jobs.read().await;
        let mut items: Vec<Job> = jobs.values().filter(|j| matches(j, query)).cloned().collect();
        sort_jobs(&mut items, query.sort, query.order);

        let total = items.len() as u64;
        let start = (query.offset() as usize).min(items.len());
        let end = (start + query.limit as usize).min(items.len());
        Ok(Page {
            items: items[start..end].to_vec(),
            total,
        })
    }

    async fn jobs_by_owner(&self, owner: Uuid) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut items: Vec<Job> = jobs.values().filter(|j| j.created_by == owner).cloned().collect();
        sort_jobs(&mut items, SortField::CreatedAt, SortOrder::Desc);
        Ok(items)
    }

    async fn update_job(&self, id: Uuid, fields: JobFields) -> Result<Option<Job>> {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(None);
        };
        job.title = fields.title;
        job.company = fields.company;
        job.location = fields.location;
        job.city = fields.city;
        job.job_type = fields.job_type;
        job.experience = fields.experience;
        job.salary = fields.salary;
        job.monthly_salary = fields.monthly_salary;
        job.description = fields.description;
        job.deadline = fields.deadline;
        job.updated_at = OffsetDateTime::now_utc();
        Ok(Some(job.clone()))
    }

    async fn deactivate_job(&self, id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.is_active = false;
            job.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn deactivate_expired_jobs(&self, now: OffsetDateTime) -> Result<u64> {
        let mut jobs = self.jobs.write().await;
        let mut count = 0;
        for job in jobs.values_mut() {
            if job.is_active && job.deadline.map(|d| d < now).unwrap_or(false) {
                job.is_active = false;
                job.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobLocation;
    use crate::models::JobType;
    use time::Duration;

    fn fields(title: &str, company: &str, salary: &str) -> JobFields {
        JobFields {
            title: title.into(),
            company: company.into(),
            location: JobLocation::Remote,
            city: "Bangalore".into(),
            job_type: JobType::FullTime,
            experience: "2-4 years".into(),
            salary: salary.into(),
            monthly_salary: "1.5L".into(),
            description: "Build and ship product features.".into(),
            deadline: None,
        }
    }

    async fn seed(store: &MemStore, owner: Uuid, jobs: &[(&str, &str, &str)]) {
        for (title, company, salary) in jobs {
            store
                .insert_job(NewJob {
                    fields: fields(title, company, salary),
                    created_by: owner,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn search_matches_title_company_or_description_case_insensitively() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        seed(
            &store,
            owner,
            &[
                ("React Developer", "Acme", "18LPA"),
                ("Backend Engineer", "ReactiveWorks", "20LPA"),
                ("Data Analyst", "Crunch", "12LPA"),
            ],
        )
        .await;

        let query = JobQuery {
            search: Some("react".into()),
            ..JobQuery::default()
        };
        let page = store.list_jobs(&query).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn city_filter_is_substring_and_location_is_exact() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        let mut onsite = fields("Ops Engineer", "Acme", "10LPA");
        onsite.location = JobLocation::Onsite;
        onsite.city = "New Delhi".into();
        store
            .insert_job(NewJob { fields: onsite, created_by: owner })
            .await
            .unwrap();
        seed(&store, owner, &[("Remote Engineer", "Acme", "10LPA")]).await;

        let query = JobQuery {
            city: Some("delhi".into()),
            ..JobQuery::default()
        };
        assert_eq!(store.list_jobs(&query).await.unwrap().total, 1);

        let query = JobQuery {
            location: Some(JobLocation::Onsite),
            ..JobQuery::default()
        };
        assert_eq!(store.list_jobs(&query).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn min_salary_uses_the_lexical_prefix_pattern() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        seed(
            &store,
            owner,
            &[("A", "X", "18LPA"), ("B", "Y", "9LPA"), ("C", "Z", "4LPA")],
        )
        .await;

        // `^[5-9]` keeps salaries whose first character is 5-9; "18LPA" drops
        // out even though 18 > 5. The display-string storage makes this
        // lexical, not numeric.
        let query = JobQuery {
            min_salary: Some("5".into()),
            ..JobQuery::default()
        };
        let page = store.list_jobs(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].salary, "9LPA");
    }

    #[tokio::test]
    async fn pagination_is_stable_across_pages_without_writes() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        seed(
            &store,
            owner,
            &[
                ("J1", "C", "1LPA"),
                ("J2", "C", "1LPA"),
                ("J3", "C", "1LPA"),
                ("J4", "C", "1LPA"),
                ("J5", "C", "1LPA"),
            ],
        )
        .await;

        let mut seen = Vec::new();
        for page_no in 1..=3 {
            let query = JobQuery {
                page: page_no,
                limit: 2,
                ..JobQuery::default()
            };
            let page = store.list_jobs(&query).await.unwrap();
            assert_eq!(page.total, 5);
            seen.extend(page.items.into_iter().map(|j| j.id));
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5, "no duplicates or skips across pages");
    }

    #[tokio::test]
    async fn expiry_sweep_deactivates_once_and_is_idempotent() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let mut expired = fields("Old", "Acme", "5LPA");
        expired.deadline = Some(now - Duration::days(1));
        let mut live = fields("New", "Acme", "5LPA");
        live.deadline = Some(now + Duration::days(7));
        store
            .insert_job(NewJob { fields: expired, created_by: owner })
            .await
            .unwrap();
        store
            .insert_job(NewJob { fields: live, created_by: owner })
            .await
            .unwrap();
        seed(&store, owner, &[("NoDeadline", "Acme", "5LPA")]).await;

        assert_eq!(store.deactivate_expired_jobs(now).await.unwrap(), 1);
        assert_eq!(store.deactivate_expired_jobs(now).await.unwrap(), 0);

        // Deactivated, not deleted.
        let page = store.list_jobs(&JobQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        let all = store.jobs_by_owner(owner).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn soft_deleted_jobs_stay_out_of_listings() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        seed(&store, owner, &[("Role", "Acme", "5LPA")]).await;
        let id = store.jobs_by_owner(owner).await.unwrap()[0].id;

        store.deactivate_job(id).await.unwrap();
        store.deactivate_job(id).await.unwrap();

        assert_eq!(store.list_jobs(&JobQuery::default()).await.unwrap().total, 0);
        assert!(!store.find_job(id).await.unwrap().unwrap().is_active);
    }
}
