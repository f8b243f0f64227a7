//! Names and defaults shared across the store, the HTTP layer and the CLI.

// Store layout
pub const MAPPINGS_BUCKET: &str = "urls";

/// Fixed path segment between the base IRI and the sequence part of a prefixed key.
pub const SHORT_PATH_SEGMENT: &str = "s/";

// Defaults; the listener stays on loopback unless configured otherwise
pub const DEFAULT_CONFIG_PATH: &str = "urlshare.toml";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_IRI: &str = "http://localhost:8080/";
pub const DEFAULT_DB_PATH: &str = "urlshare.db";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LOG_FILE: &str = "urlshare.log";

// Routes
pub const ADMIN_PATH: &str = "/admin";
pub const ADMIN_MAPPINGS_PATH: &str = "/admin/mappings";
pub const ADMIN_HEALTH_PATH: &str = "/admin/health";
pub const ADMIN_METRICS_PATH: &str = "/admin/metrics";
pub const STATIC_PATH: &str = "/static";

