use std::{sync::Arc, time::Instant};

use db::{DBService, DbErr};

use crate::config::ServerConfig;

/// Shared request state: the pooled database handle plus the immutable
/// configuration, both injected at startup.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<ServerConfig>,
    started_at: Instant,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Result<Self, DbErr> {
        let db = DBService::new(&config.database_url).await?;
        Ok(Self {
            db,
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Seconds since the server process came up, reported by `/health`.
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
