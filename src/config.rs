use std::env;

/// Application configuration, loaded once at startup from the environment
/// (a `.env` file is read first when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploaded files are stored under.
    pub root: String,
    /// Public URL prefix that maps onto `root`.
    pub base_url: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 8080),
            db: DbConfig {
                endpoint: env_or("SURREAL_ENDPOINT", "localhost:8000"),
                username: env_or("SURREAL_USER", "root"),
                password: env_or("SURREAL_PASS", "root"),
                namespace: env_or("SURREAL_NS", "vidtube"),
                database: env_or("SURREAL_DB", "vidtube"),
            },
            jwt: JwtConfig {
                access_secret: env_or("ACCESS_TOKEN_SECRET", "dev-access-secret"),
                refresh_secret: env_or("REFRESH_TOKEN_SECRET", "dev-refresh-secret"),
                access_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", 15 * 60),
                refresh_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", 10 * 24 * 3600),
            },
            media: MediaConfig {
                root: env_or("MEDIA_ROOT", "media"),
                base_url: env_or("MEDIA_BASE_URL", "http://localhost:8080/media"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_missing() {
        let cfg = Config::from_env();
        assert!(cfg.port > 0);
        assert!(!cfg.jwt.access_secret.is_empty());
        assert!(cfg.jwt.access_ttl_secs < cfg.jwt.refresh_ttl_secs);
    }
}
