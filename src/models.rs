use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. Self-registration may only claim `job-seeker` or `employer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::JobSeeker => "job-seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job-seeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_location")]
pub enum JobLocation {
    Onsite,
    Remote,
    Hybrid,
}

impl FromStr for JobLocation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Onsite" => Ok(JobLocation::Onsite),
            "Remote" => Ok(JobLocation::Remote),
            "Hybrid" => Ok(JobLocation::Hybrid),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type")]
pub enum JobType {
    Internship,
    #[serde(rename = "Full-time")]
    #[sqlx(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[sqlx(rename = "Part-time")]
    PartTime,
    Contract,
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Internship" => Ok(JobType::Internship),
            "Full-time" => Ok(JobType::FullTime),
            "Part-time" => Ok(JobType::PartTime),
            "Contract" => Ok(JobType::Contract),
            _ => Err(()),
        }
    }
}

/// Job-seeker facing part of the user document, stored as JSONB.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

/// Employer facing part of the user document, stored as JSONB.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: UserProfile,
    pub company: CompanyInfo,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Field-wise patch for the nested profile object. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub resume: Option<String>,
    pub portfolio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl UserProfile {
    pub fn merge(&mut self, patch: ProfilePatch) {
        if let Some(v) = patch.avatar {
            self.avatar = v;
        }
        if let Some(v) = patch.bio {
            self.bio = Some(v);
        }
        if let Some(v) = patch.skills {
            self.skills = v;
        }
        if let Some(v) = patch.experience {
            self.experience = Some(v);
        }
        if let Some(v) = patch.location {
            self.location = Some(v);
        }
        if let Some(v) = patch.resume {
            self.resume = Some(v);
        }
        if let Some(v) = patch.portfolio {
            self.portfolio = Some(v);
        }
        if let Some(v) = patch.linkedin {
            self.linkedin = Some(v);
        }
        if let Some(v) = patch.github {
            self.github = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub website: Option<String>,
    pub size: Option<String>,
    pub industry: Option<String>,
}

impl CompanyInfo {
    pub fn merge(&mut self, patch: CompanyPatch) {
        if let Some(v) = patch.name {
            self.name = Some(v);
        }
        if let Some(v) = patch.website {
            self.website = Some(v);
        }
        if let Some(v) = patch.size {
            self.size = Some(v);
        }
        if let Some(v) = patch.industry {
            self.industry = Some(v);
        }
    }
}

/// Partial profile update: only the allowed top-level keys, nested objects merged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile: Option<ProfilePatch>,
    pub company: Option<CompanyPatch>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: JobLocation,
    pub city: String,
    pub job_type: JobType,
    pub experience: String,
    pub salary: String,
    pub monthly_salary: String,
    pub description: String,
    pub deadline: Option<OffsetDateTime>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Job {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.deadline.map(|d| now > d).unwrap_or(false)
    }
}

/// Validated job fields; used verbatim for create and as the full overwrite
/// set for update.
#[derive(Debug, Clone)]
pub struct JobFields {
    pub title: String,
    pub company: String,
    pub location: JobLocation,
    pub city: String,
    pub job_type: JobType,
    pub experience: String,
    pub salary: String,
    pub monthly_salary: String,
    pub description: String,
    pub deadline: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub fields: JobFields,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Title,
    Company,
    Salary,
    Deadline,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Company => "company",
            SortField::Salary => "salary",
            SortField::Deadline => "deadline",
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "title" => Ok(SortField::Title),
            "company" => Ok(SortField::Company),
            "salary" => Ok(SortField::Salary),
            "deadline" => Ok(SortField::Deadline),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated listing query. Filters combine with AND; `is_active = true` is
/// always implied.
#[derive(Debug, Clone)]
pub struct JobQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub location: Option<JobLocation>,
    pub city: Option<String>,
    pub job_type: Option<JobType>,
    pub min_salary: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl JobQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Lexical character-class pattern matched against the salary display
    /// string, e.g. minSalary=18 becomes `^[18-9]`. The salary column is
    /// free text, so this is prefix matching, not numeric comparison.
    pub fn salary_pattern(&self) -> Option<String> {
        self.min_salary.as_ref().map(|min| format!("^[{}-9]", min))
    }
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: crate::jobs::filter::DEFAULT_PAGE_SIZE,
            search: None,
            location: None,
            city: None,
            job_type: None,
            min_salary: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// One page of store results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
