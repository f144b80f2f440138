use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FieldError;
use crate::models::{JobLocation, JobQuery, JobType, SortField, SortOrder};

/// Clients that send no `limit` see a large first page.
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw listing query parameters. Everything is optional and arrives as text;
/// `into_query` validates the lot and reports every bad value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub min_salary: Option<String>,
    pub max_salary: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListJobsParams {
    pub fn into_query(self) -> Result<JobQuery, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut query = JobQuery::default();

        if let Some(page) = self.page {
            match page.parse::<i64>() {
                Ok(p) if p >= 1 => query.page = p,
                _ => errors.push(FieldError::new("page", "Page must be a positive integer")),
            }
        }
        if let Some(limit) = self.limit {
            match limit.parse::<i64>() {
                Ok(l) if (1..=MAX_PAGE_SIZE).contains(&l) => query.limit = l,
                _ => errors.push(FieldError::new("limit", "Limit must be between 1 and 100")),
            }
        }
        if let Some(location) = self.location {
            match JobLocation::from_str(&location) {
                Ok(l) => query.location = Some(l),
                Err(_) => errors.push(FieldError::new("location", "Invalid location filter")),
            }
        }
        if let Some(job_type) = self.job_type {
            match JobType::from_str(&job_type) {
                Ok(t) => query.job_type = Some(t),
                Err(_) => errors.push(FieldError::new("type", "Invalid job type filter")),
            }
        }
        if let Some(min) = self.min_salary {
            let min = min.trim().to_string();
            if min.parse::<f64>().is_ok() {
                query.min_salary = Some(min);
            } else {
                errors.push(FieldError::new("minSalary", "Min salary must be a number"));
            }
        }
        // maxSalary is validated for shape but not applied: salary is a
        // display string, so there is no upper bound to compare against.
        if let Some(max) = self.max_salary {
            if max.trim().parse::<f64>().is_err() {
                errors.push(FieldError::new("maxSalary", "Max salary must be a number"));
            }
        }
        if let Some(sort_by) = self.sort_by {
            match SortField::from_str(&sort_by) {
                Ok(f) => query.sort = f,
                Err(_) => errors.push(FieldError::new("sortBy", "Invalid sort field")),
            }
        }
        if let Some(order) = self.sort_order {
            // Anything that is not "desc" sorts ascending.
            query.order = if order == "desc" {
                SortOrder::Desc
            } else {
                SortOrder::Asc
            };
        }

        query.search = self.search;
        query.city = self.city;

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(errors)
        }
    }
}

/// Page arithmetic for the listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_jobs: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: u64) -> Self {
        let skip = (page - 1) * limit;
        Self {
            current_page: page,
            total_pages: (total as i64 + limit - 1) / limit,
            total_jobs: total,
            has_next: skip + limit < total as i64,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_first_page_newest_first() {
        let query = ListJobsParams::default().into_query().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert!(query.search.is_none());
    }

    #[test]
    fn bad_values_are_all_reported() {
        let params = ListJobsParams {
            page: Some("0".into()),
            limit: Some("500".into()),
            location: Some("Moon".into()),
            job_type: Some("Gig".into()),
            min_salary: Some("lots".into()),
            ..ListJobsParams::default()
        };
        let errors = params.into_query().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["page", "limit", "location", "type", "minSalary"]);
    }

    #[test]
    fn sort_order_quirk_treats_unknown_as_ascending() {
        let params = ListJobsParams {
            sort_order: Some("sideways".into()),
            ..ListJobsParams::default()
        };
        assert_eq!(params.into_query().unwrap().order, SortOrder::Asc);

        let params = ListJobsParams {
            sort_order: Some("desc".into()),
            ..ListJobsParams::default()
        };
        assert_eq!(params.into_query().unwrap().order, SortOrder::Desc);
    }

    #[test]
    fn valid_filters_pass_through() {
        let params = ListJobsParams {
            page: Some("3".into()),
            limit: Some("10".into()),
            search: Some("React".into()),
            location: Some("Remote".into()),
            city: Some("Pune".into()),
            job_type: Some("Full-time".into()),
            min_salary: Some("12".into()),
            max_salary: Some("30".into()),
            sort_by: Some("title".into()),
            sort_order: Some("asc".into()),
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 10);
        assert_eq!(query.location, Some(JobLocation::Remote));
        assert_eq!(query.job_type, Some(JobType::FullTime));
        assert_eq!(query.salary_pattern().as_deref(), Some("^[12-9]"));
        assert_eq!(query.sort, SortField::Title);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn has_next_iff_skip_plus_limit_below_total() {
        let meta = PaginationMeta::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = PaginationMeta::new(3, 10, 25);
        assert!(!meta.has_next);
        assert!(meta.has_prev);

        let meta = PaginationMeta::new(2, 10, 20);
        assert!(!meta.has_next, "skip + limit == total leaves no next page");
        assert!(meta.has_prev);
    }

    #[test]
    fn empty_result_set_has_zero_pages() {
        let meta = PaginationMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
