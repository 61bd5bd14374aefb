use std::env;

use thiserror::Error;

/// Connection string used when `DATABASE_URL` is not set outside production.
pub const DEFAULT_DB_URL: &str = "postgres://localhost/restful_blog_app";

/// Session signing secret used when `SESSION_SECRET` is not set outside production.
pub const DEFAULT_SESSION_SECRET: &str = "I will use this statement now";

/// Sessions last a week unless `SESSION_TTL_SECS` says otherwise.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted `SESSION_TTL_SECS`: one year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once in `main`,
/// never mutated afterwards, and pulled into handlers through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret fallbacks.
    pub env: Env,
    // Address the HTTP listener binds to (`IP`).
    pub host: String,
    // Port the HTTP listener binds to (`PORT`).
    pub port: u16,
    // Document store connection string. `memory` selects the in-process store.
    pub db_url: String,
    // HMAC secret used to sign session tokens.
    pub session_secret: String,
    // Lifetime of an issued session token, in seconds.
    pub session_ttl_secs: u64,
}

/// Env
///
/// Defines the runtime context. Local runs tolerate missing secrets by falling back
/// to the built-in constants; production refuses to start without them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Raised by [`AppConfig::load`] when the environment cannot produce a usable configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// Provides a non-panicking local configuration, mostly used for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_url: DEFAULT_DB_URL.to_string(),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables. Listener settings come from
    /// `IP` and `PORT`; the store and session secret come from `DATABASE_URL` and
    /// `SESSION_SECRET`, which are mandatory only when `APP_ENV=production`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let host = env::var("IP").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3000)?;
        let session_ttl_secs = parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if !(1..=MAX_SESSION_TTL_SECS).contains(&session_ttl_secs) {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
            });
        }

        let db_url = required_in_production(&env, "DATABASE_URL", DEFAULT_DB_URL)?;
        let session_secret =
            required_in_production(&env, "SESSION_SECRET", DEFAULT_SESSION_SECRET)?;

        Ok(Self {
            env,
            host,
            port,
            db_url,
            session_secret,
            session_ttl_secs,
        })
    }

    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_in_production(
    env: &Env,
    name: &'static str,
    fallback: &str,
) -> Result<String, ConfigError> {
    match (env::var(name), env) {
        (Ok(value), _) => Ok(value),
        (Err(_), Env::Production) => Err(ConfigError::Missing(name)),
        (Err(_), Env::Local) => Ok(fallback.to_string()),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, fallback: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(fallback),
    }
}
