use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub bill_service_url: String,
    pub log_level: String,
    pub identity_secret: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("bill_service_url", &self.bill_service_url)
            .field("log_level", &self.log_level)
            .field("identity_secret", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            bill_service_url: env::var("BILL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            identity_secret: env::var("IDENTITY_SECRET").unwrap_or_else(|_| "secret".to_string()), // set a real secret outside development
            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
