use keelson_core::plan::{LeadWindow, DEFAULT_LEAD_WINDOW_DAYS, DEFAULT_LEAD_WINDOW_HOURS};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Scheduler sweep configuration.
    pub sweep: SweepConfig,
}

/// Configuration for the periodic maintenance sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// How often the sweep runs, in seconds (default: `3600`).
    pub interval_secs: u64,
    /// Lead window in days for date-based plans (default: `30`).
    pub lead_window_days: i64,
    /// Lead window in running hours for hour-based plans (default: `500`).
    pub lead_window_hours: f64,
}

impl SweepConfig {
    /// Project the policy slice consumed by the core evaluator.
    pub fn lead_window(&self) -> LeadWindow {
        LeadWindow {
            days: self.lead_window_days,
            hours: self.lead_window_hours,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SWEEP_INTERVAL_SECS`  | `3600`                     |
    /// | `LEAD_WINDOW_DAYS`     | `30`                       |
    /// | `LEAD_WINDOW_HOURS`    | `500`                      |
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
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        let lead_window_days: i64 = std::env::var("LEAD_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEAD_WINDOW_DAYS);

        let lead_window_hours: f64 = std::env::var("LEAD_WINDOW_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEAD_WINDOW_HOURS);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            sweep: SweepConfig {
                interval_secs,
                lead_window_days,
                lead_window_hours,
            },
        }
    }
}
