use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub public_url: String,
    pub ai_delay_ms: u64,
    pub queue_max_retries: u32,
    pub queue_process_delay_ms: u64,
    pub queue_retry_backoff_ms: u64,
    pub queue_failure_rate: f64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            port,
            public_url: public_url(std::env::var("PUBLIC_URL").ok(), port)?,
            ai_delay_ms: env_or("AI_DELAY_MS", 1500)?,
            queue_max_retries: env_or("QUEUE_MAX_RETRIES", 3)?,
            queue_process_delay_ms: env_or("QUEUE_PROCESS_DELAY_MS", 2000)?,
            queue_retry_backoff_ms: env_or("QUEUE_RETRY_BACKOFF_MS", 1000)?,
            queue_failure_rate: env_or("QUEUE_FAILURE_RATE", 0.1).and_then(|rate: f64| {
                if !(0.0..=1.0).contains(&rate) {
                    anyhow::bail!("QUEUE_FAILURE_RATE must be between 0 and 1");
                }
                Ok(rate)
            })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "AI delay: {}ms, queue: max_retries={}, process_delay={}ms, backoff={}ms, failure_rate={}",
            config.ai_delay_ms,
            config.queue_max_retries,
            config.queue_process_delay_ms,
            config.queue_retry_backoff_ms,
            config.queue_failure_rate
        );

        Ok(config)
    }
}

/// Server URL advertised in the OpenAPI document.
///
/// # Arguments
///
/// * `raw` - the `PUBLIC_URL` value, if set.
/// * `port` - listen port, used for the `http://localhost:{port}` fallback
///   when `raw` is unset or blank.
///
/// # Returns
///
/// The URL without trailing slashes, or an error when it is not http(s).
pub fn public_url(raw: Option<String>, port: u16) -> anyhow::Result<String> {
    match raw.map(|url| url.trim().to_string()).filter(|url| !url.is_empty()) {
        Some(url) => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("PUBLIC_URL must start with http:// or https://");
            }
            Ok(url.trim_end_matches('/').to_string())
        }
        None => Ok(format!("http://localhost:{}", port)),
    }
}

/// Reads an optional numeric variable, falling back to `default` when unset or blank.
fn env_or<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: {:?}", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_numbers() {
        let value: u64 = parse_value("AI_DELAY_MS", " 250 ").unwrap();
        assert_eq!(value, 250);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_value::<u32>("QUEUE_MAX_RETRIES", "three").unwrap_err();
        assert!(err.to_string().contains("QUEUE_MAX_RETRIES"));
    }

    #[test]
    fn public_url_falls_back_to_localhost() {
        assert_eq!(public_url(None, 8080).unwrap(), "http://localhost:8080");
        assert_eq!(
            public_url(Some("  ".to_string()), 3000).unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn public_url_drops_trailing_slashes() {
        let url = public_url(Some("https://api.example.com//".to_string()), 3000).unwrap();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn public_url_requires_http_scheme() {
        let err = public_url(Some("api.example.com".to_string()), 3000).unwrap_err();
        assert!(err.to_string().contains("PUBLIC_URL"));
    }

    #[test]
    fn unset_variable_uses_default() {
        let value: u32 = env_or("SALESPAD_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
