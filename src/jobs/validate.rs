use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::FieldError;
use crate::jobs::dto::JobPayload;
use crate::models::{JobFields, JobLocation, JobType};

fn check_required(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: &str,
    max: usize,
    required_msg: &str,
    too_long_msg: &str,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, required_msg));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(field, too_long_msg));
    }
    value.to_string()
}

/// Validates a create/update body, collecting every field problem rather than
/// stopping at the first.
pub fn validate_job_payload(
    payload: &JobPayload,
    now: OffsetDateTime,
) -> Result<JobFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = check_required(
        &mut errors,
        "title",
        &payload.title,
        100,
        "Job title is required",
        "Job title cannot exceed 100 characters",
    );
    let company = check_required(
        &mut errors,
        "company",
        &payload.company,
        50,
        "Company name is required",
        "Company name cannot exceed 50 characters",
    );
    let city = check_required(
        &mut errors,
        "city",
        &payload.city,
        50,
        "City is required",
        "City name cannot exceed 50 characters",
    );
    let experience = check_required(
        &mut errors,
        "experience",
        &payload.experience,
        20,
        "Experience level is required",
        "Experience cannot exceed 20 characters",
    );
    let salary = check_required(
        &mut errors,
        "salary",
        &payload.salary,
        20,
        "Salary is required",
        "Salary cannot exceed 20 characters",
    );
    let monthly_salary = check_required(
        &mut errors,
        "monthlySalary",
        &payload.monthly_salary,
        20,
        "Monthly salary is required",
        "Monthly salary cannot exceed 20 characters",
    );
    let description = check_required(
        &mut errors,
        "description",
        &payload.description,
        2000,
        "Job description is required",
        "Description cannot exceed 2000 characters",
    );

    let location = match JobLocation::from_str(&payload.location) {
        Ok(l) => l,
        Err(_) => {
            errors.push(FieldError::new(
                "location",
                "Location must be Onsite, Remote, or Hybrid",
            ));
            JobLocation::Onsite
        }
    };
    let job_type = match JobType::from_str(&payload.job_type) {
        Ok(t) => t,
        Err(_) => {
            errors.push(FieldError::new("type", "Invalid job type"));
            JobType::FullTime
        }
    };

    let deadline = match payload.deadline.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
            Ok(deadline) if deadline > now => Some(deadline),
            Ok(_) => {
                errors.push(FieldError::new(
                    "deadline",
                    "Application deadline must be in the future",
                ));
                None
            }
            Err(_) => {
                errors.push(FieldError::new("deadline", "Invalid deadline date format"));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(JobFields {
        title,
        company,
        location,
        city,
        job_type,
        experience,
        salary,
        monthly_salary,
        description,
        deadline,
    })
}
