use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub https: bool,
    /// Sliding lifetime of the visitor-identity cookie.
    pub visitor_cookie_days: u32,
    /// Budget for one fire-and-forget analytics write; writes that cannot
    /// complete within it are abandoned, not retried.
    pub write_timeout_ms: u64,
    /// Window applied to GET /stats when `days` is absent.
    pub default_stats_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("PAGEPULSE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("PAGEPULSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("PAGEPULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            https: std::env::var("PAGEPULSE_HTTPS")
                .map(|v| v == "true")
                .unwrap_or(true),
            visitor_cookie_days: std::env::var("PAGEPULSE_VISITOR_COOKIE_DAYS")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .unwrap_or(90),
            write_timeout_ms: std::env::var("PAGEPULSE_WRITE_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            default_stats_days: std::env::var("PAGEPULSE_STATS_DEFAULT_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
