use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info};

use crate::store::Store;

/// Fire-and-forget expiry sweep. Listing responses never wait on it, and a
/// failed sweep only leaves expired jobs visible until the next attempt.
pub fn spawn(store: Arc<dyn Store>) {
    tokio::spawn(async move {
        match store.deactivate_expired_jobs(OffsetDateTime::now_utc()).await {
            Ok(0) => {}
            Ok(count) => info!(count, "deactivated expired jobs"),
            Err(e) => error!(error = %e, "expiry sweep failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobFields, JobLocation, JobQuery, JobType, NewJob};
    use crate::store::MemStore;
    use std::time::Duration;
    use time::Duration as TimeDuration;
    use uuid::Uuid;

    #[tokio::test]
    async fn spawned_sweep_eventually_deactivates_expired_jobs() {
        let store: Arc<dyn Store> = Arc::new(MemStore::new());
        store
            .insert_job(NewJob {
                fields: JobFields {
                    title: "Old Posting".into(),
                    company: "Acme".into(),
                    location: JobLocation::Remote,
                    city: "Pune".into(),
                    job_type: JobType::Contract,
                    experience: "any".into(),
                    salary: "8LPA".into(),
                    monthly_salary: "66K".into(),
                    description: "Expired already.".into(),
                    deadline: Some(OffsetDateTime::now_utc() - TimeDuration::days(3)),
                },
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap();

        spawn(store.clone());

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if store.list_jobs(&JobQuery::default()).await.unwrap().total == 0 {
                return;
            }
        }
        panic!("sweep never ran");
    }
}
