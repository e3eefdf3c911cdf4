use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables. Configuration is
/// read exactly once at startup; business logic receives it through
/// `AppState` and never touches the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, to cover the
    /// synchronous generation poll budget).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Shared secret the cron scheduler presents as a Bearer token.
    pub cron_secret: String,
    /// Synchronous poll budget per generation request, seconds.
    pub poll_timeout_secs: u64,
    /// Delay between operation fetches, seconds.
    pub poll_interval_secs: u64,
    /// Run the sweeper inside this process as well as via cron.
    pub sweep_task_enabled: bool,
    /// In-process sweep interval, seconds.
    pub sweep_interval_secs: u64,
    pub storage: StorageConfig,
}

/// Bucket and endpoint settings for the primary store and the
/// provider-side mirror.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub primary_endpoint: String,
    pub primary_region: String,
    pub primary_bucket: String,
    pub primary_access_key_id: String,
    pub primary_secret_access_key: String,
    pub mirror_endpoint: String,
    pub mirror_region: String,
    pub mirror_bucket: String,
    pub mirror_access_key_id: String,
    pub mirror_secret_access_key: String,
    /// Bucket the provider writes generated videos into.
    pub output_bucket: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `HOST`                 | `0.0.0.0`   |
    /// | `PORT`                 | `3000`      |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `300`       |
    /// | `CRON_SECRET`          | (required)  |
    /// | `POLL_TIMEOUT_SECS`    | `240`       |
    /// | `POLL_INTERVAL_SECS`   | `6`         |
    /// | `SWEEP_TASK_ENABLED`   | `false`     |
    /// | `SWEEP_INTERVAL_SECS`  | `60`        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cron_secret =
            std::env::var("CRON_SECRET").expect("CRON_SECRET must be set in the environment");
        assert!(!cron_secret.is_empty(), "CRON_SECRET must not be empty");

        let poll_timeout_secs: u64 = std::env::var("POLL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "240".into())
            .parse()
            .expect("POLL_TIMEOUT_SECS must be a valid u64");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "6".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let sweep_task_enabled = std::env::var("SWEEP_TASK_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            cron_secret,
            poll_timeout_secs,
            poll_interval_secs,
            sweep_task_enabled,
            sweep_interval_secs,
            storage: StorageConfig::from_env(),
        }
    }
}

impl StorageConfig {
    /// Load storage settings. All variables are required; startup fails
    /// fast on a missing one.
    pub fn from_env() -> Self {
        let required = |name: &str| -> String {
            std::env::var(name)
                .unwrap_or_else(|_| panic!("{name} must be set in the environment"))
        };

        Self {
            primary_endpoint: required("PRIMARY_STORAGE_ENDPOINT"),
            primary_region: std::env::var("PRIMARY_STORAGE_REGION")
                .unwrap_or_else(|_| "auto".into()),
            primary_bucket: required("PRIMARY_STORAGE_BUCKET"),
            primary_access_key_id: required("PRIMARY_STORAGE_ACCESS_KEY_ID"),
            primary_secret_access_key: required("PRIMARY_STORAGE_SECRET_ACCESS_KEY"),
            mirror_endpoint: std::env::var("MIRROR_STORAGE_ENDPOINT")
                .unwrap_or_else(|_| "https://storage.googleapis.com".into()),
            mirror_region: std::env::var("MIRROR_STORAGE_REGION")
                .unwrap_or_else(|_| "auto".into()),
            mirror_bucket: required("MIRROR_STORAGE_BUCKET"),
            mirror_access_key_id: required("MIRROR_STORAGE_ACCESS_KEY_ID"),
            mirror_secret_access_key: required("MIRROR_STORAGE_SECRET_ACCESS_KEY"),
            output_bucket: required("OUTPUT_STORAGE_BUCKET"),
        }
    }
}
