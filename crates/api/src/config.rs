/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `90`). Must stay above
    /// the long-poll timeout or every poll is cut short.
    pub request_timeout_secs: u64,
    /// How long a long-poll read waits for a newer version before
    /// answering with the current state (default: `30000` ms).
    pub poll_timeout_ms: u64,
    /// Dispatcher tick interval in seconds (default: `60`).
    pub dispatch_interval_secs: u64,
    /// Timeout for one outbound station POST in seconds (default: `10`).
    pub dispatch_timeout_secs: u64,
    /// Public base URL of this coordinator, substituted into the
    /// callback locations handed to stations.
    pub callback_root: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                   |
    /// |--------------------------|---------------------------|
    /// | `HOST`                   | `0.0.0.0`                 |
    /// | `PORT`                   | `3000`                    |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`   | `90`                      |
    /// | `POLL_TIMEOUT_MS`        | `30000`                   |
    /// | `DISPATCH_INTERVAL_SECS` | `60`                      |
    /// | `DISPATCH_TIMEOUT_SECS`  | `10`                      |
    /// | `CALLBACK_ROOT`          | `http://localhost:3000`   |
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
            .unwrap_or_else(|_| "90".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let poll_timeout_ms: u64 = std::env::var("POLL_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .expect("POLL_TIMEOUT_MS must be a valid u64");

        let dispatch_interval_secs: u64 = std::env::var("DISPATCH_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("DISPATCH_INTERVAL_SECS must be a valid u64");

        let dispatch_timeout_secs: u64 = std::env::var("DISPATCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DISPATCH_TIMEOUT_SECS must be a valid u64");

        let callback_root =
            std::env::var("CALLBACK_ROOT").unwrap_or_else(|_| "http://localhost:3000".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            poll_timeout_ms,
            dispatch_interval_secs,
            dispatch_timeout_secs,
            callback_root,
        }
    }
}
