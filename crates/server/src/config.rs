/// Runtime mode, read from `MINDBOARD_ENV`. Anything other than
/// `production` counts as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match std::env::var("MINDBOARD_ENV") {
            Ok(value) if value.trim().eq_ignore_ascii_case("production") => {
                Environment::Production
            }
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Server configuration loaded from environment variables, with defaults
/// suitable for local development. Injected into [`crate::AppState`] rather
/// than read from module globals.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub environment: Environment,
}

impl ServerConfig {
    /// | Env var         | Default                              |
    /// |-----------------|--------------------------------------|
    /// | `HOST`          | `127.0.0.1`                          |
    /// | `PORT`          | `3001`                               |
    /// | `DATABASE_URL`  | sqlite file under the asset dir      |
    /// | `CORS_ORIGINS`  | `http://localhost:3000`              |
    /// | `MINDBOARD_ENV` | development                          |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(3001);

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}?mode=rwc",
                utils::assets::db_path().to_string_lossy()
            )
        });

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );

        Self {
            host,
            port,
            database_url,
            cors_origins,
            environment: Environment::from_env(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
