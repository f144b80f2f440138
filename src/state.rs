use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{self, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = store::connect(&config).await;
        Ok(Self { store, config })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;
        use crate::store::MemStore;

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_days: 30,
            },
        });
        Self {
            store: Arc::new(MemStore::new()),
            config,
        }
    }
}
