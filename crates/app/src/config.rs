//! Application configuration loaded from environment variables.

/// Runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CART_ID` — identity of the demo cart stream (default: `"cart-1"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub log_filter: String,
    pub cart_id: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            log_filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cart_id: std::env::var("CART_ID").unwrap_or_else(|_| "cart-1".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            cart_id: "cart-1".to_string(),
        }
    }
}
