use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::jobs::dto::JobDto;
use crate::models::{CompanyInfo, CompanyPatch, ProfilePatch, ProfileUpdate, Role, User, UserProfile};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Validated registration data; email normalized to lowercase.
#[derive(Debug)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<RegisterData, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        } else if name.chars().count() > 50 {
            errors.push(FieldError::new("name", "Name cannot exceed 50 characters"));
        }

        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }

        if self.password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }

        // Admin accounts are never self-registered.
        let role = match self.role.as_deref() {
            None => Role::JobSeeker,
            Some(raw) => match Role::from_str(raw) {
                Ok(role) if role != Role::Admin => role,
                _ => {
                    errors.push(FieldError::new("role", "Role must be job-seeker or employer"));
                    Role::JobSeeker
                }
            },
        };

        if errors.is_empty() {
            Ok(RegisterData {
                name,
                email,
                password: self.password,
                role,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        if errors.is_empty() {
            Ok((email, self.password))
        } else {
            Err(errors)
        }
    }
}

/// Partial profile update; only these top-level keys are writable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub profile: Option<ProfilePatch>,
    pub company: Option<CompanyPatch>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            if name.chars().count() > 50 {
                errors.push(FieldError::new("name", "Name cannot exceed 50 characters"));
            }
        }
        if let Some(profile) = &self.profile {
            if profile.bio.as_ref().map(|b| b.chars().count() > 500).unwrap_or(false) {
                errors.push(FieldError::new("profile.bio", "Bio cannot exceed 500 characters"));
            }
            if profile
                .experience
                .as_ref()
                .map(|e| e.chars().count() > 100)
                .unwrap_or(false)
            {
                errors.push(FieldError::new(
                    "profile.experience",
                    "Experience cannot exceed 100 characters",
                ));
            }
            if profile
                .location
                .as_ref()
                .map(|l| l.chars().count() > 100)
                .unwrap_or(false)
            {
                errors.push(FieldError::new(
                    "profile.location",
                    "Location cannot exceed 100 characters",
                ));
            }
        }

        if errors.is_empty() {
            Ok(ProfileUpdate {
                name,
                profile: self.profile,
                company: self.company,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.current_password.is_empty() {
            errors.push(FieldError::new(
                "currentPassword",
                "Current password is required",
            ));
        }
        if self.new_password.chars().count() < 6 {
            errors.push(FieldError::new(
                "newPassword",
                "New password must be at least 6 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Client-facing user; the password hash never leaves the store layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile: UserProfile,
    pub company: CompanyInfo,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            profile: user.profile,
            company: user.company,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(flatten)]
    pub user: UserDto,
    pub posted_jobs: Vec<JobDto>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: ProfileData,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub message: String,
    pub data: UserDto,
}

#[derive(Debug, Serialize)]
pub struct AccountMessageResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_dto_never_carries_the_password_hash() {
        let now = OffsetDateTime::now_utc();
        let dto = UserDto::from(User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: "$argon2id$supersecret".into(),
            role: Role::JobSeeker,
            profile: UserProfile::default(),
            company: CompanyInfo::default(),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("supersecret"));
        assert!(!json.contains("password"));
        assert!(json.contains("asha@example.com"));
        assert!(json.contains("job-seeker"));
    }

    #[test]
    fn register_validation_normalizes_email_and_collects_errors() {
        let ok = RegisterRequest {
            name: "  Asha  ".into(),
            email: "  Asha@Example.COM ".into(),
            password: "secret123".into(),
            role: Some("employer".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Asha");
        assert_eq!(ok.email, "asha@example.com");
        assert_eq!(ok.role, Role::Employer);

        let errors = RegisterRequest {
            name: String::new(),
            email: "not-an-email".into(),
            password: "123".into(),
            role: Some("admin".into()),
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "email", "password", "role"]);
    }

    #[test]
    fn missing_role_defaults_to_job_seeker() {
        let data = RegisterRequest {
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            password: "secret123".into(),
            role: None,
        }
        .validate()
        .unwrap();
        assert_eq!(data.role, Role::JobSeeker);
    }

    #[test]
    fn profile_update_limits_are_enforced() {
        let errors = UpdateProfileRequest {
            name: Some("x".repeat(51)),
            profile: Some(ProfilePatch {
                bio: Some("b".repeat(501)),
                ..ProfilePatch::default()
            }),
            company: None,
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "profile.bio"]);
    }
}
