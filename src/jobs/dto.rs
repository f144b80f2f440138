use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::jobs::filter::PaginationMeta;
use crate::models::{Job, JobLocation, JobType};

/// Job create/update body. Categorical fields arrive as raw strings so that
/// validation can report every problem at once instead of failing on the
/// first bad enum value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub monthly_salary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Wire shape of a job. `postedDate` and `isExpired` are recomputed from the
/// stored timestamps on every response; they are presentation facts, not
/// stored ones.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDto {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: JobLocation,
    pub city: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub experience: String,
    pub salary: String,
    pub monthly_salary: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub is_active: bool,
    pub is_expired: bool,
    pub posted_date: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl JobDto {
    pub fn from_job(job: Job, now: OffsetDateTime) -> Self {
        let is_expired = job.is_expired(now);
        Self {
            id: job.id,
            title: job.title,
            company: job.company,
            location: job.location,
            city: job.city,
            job_type: job.job_type,
            experience: job.experience,
            salary: job.salary,
            monthly_salary: job.monthly_salary,
            description: job.description,
            deadline: job.deadline,
            is_active: job.is_active,
            is_expired,
            posted_date: posted_label(job.created_at, now),
            created_by: job.created_by,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

fn posted_label(created_at: OffsetDateTime, now: OffsetDateTime) -> String {
    let minutes = (now - created_at).whole_minutes();
    if minutes < 1 {
        "Just posted".to_string()
    } else if minutes < 60 {
        format!("{}m Ago", minutes)
    } else if minutes < 1440 {
        format!("{}h Ago", minutes / 60)
    } else {
        format!("{}d Ago", minutes / 1440)
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub success: bool,
    pub data: Vec<JobDto>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: JobDto,
}

#[derive(Debug, Serialize)]
pub struct DeleteJobResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn posted_label_buckets() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(posted_label(now, now), "Just posted");
        assert_eq!(posted_label(now - Duration::minutes(5), now), "5m Ago");
        assert_eq!(posted_label(now - Duration::hours(3), now), "3h Ago");
        assert_eq!(posted_label(now - Duration::days(2), now), "2d Ago");
    }
}
