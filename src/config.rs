use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::store::RetryPolicy;

/// Application configuration, read from the environment (a `.env` file is loaded
/// first by the binary).
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// CORS lists. Unless `enforce_origins` is set, any request `Origin` is echoed back
/// and `allowed_origins` is informational only.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub enforce_origins: bool,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Per-request timeout for outbound store calls.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase(SupabaseConfig),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL including scheme, without the `/rest/v1` suffix.
    pub base_url: String,
    pub service_role_key: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `env_logger` filter directive, e.g. `info` or `info,todo_api::store=debug`.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "{} has invalid value {:?}: {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server = ServerConfig {
            host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "SERVER_PORT", 8080)?,
        };

        let cors = CorsConfig {
            allowed_origins: list_or(&get, "CORS_ALLOWED_ORIGINS", "*"),
            allowed_methods: list_or(&get, "CORS_ALLOWED_METHODS", "GET,POST,PUT,DELETE,OPTIONS"),
            allowed_headers: list_or(
                &get,
                "CORS_ALLOWED_HEADERS",
                "Origin,Content-Type,Accept,Authorization",
            ),
            enforce_origins: parse_or(&get, "CORS_ENFORCE_ORIGINS", false)?,
        };

        let backend = match get("STORE_BACKEND").as_deref().unwrap_or("supabase") {
            "memory" => StoreBackend::Memory,
            "supabase" => StoreBackend::Supabase(SupabaseConfig {
                base_url: supabase_url(&get)?,
                service_role_key: get("SUPABASE_SERVICE_ROLE_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
                table: get("SUPABASE_TABLE").unwrap_or_else(|| "todos".to_string()),
            }),
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected `supabase` or `memory`".to_string(),
                })
            }
        };

        let defaults = RetryPolicy::default();
        let store = StoreConfig {
            backend,
            timeout: Duration::from_secs(parse_or(&get, "STORE_TIMEOUT_SECS", 10)?),
            retry: RetryPolicy {
                max_attempts: parse_or(&get, "STORE_MAX_ATTEMPTS", defaults.max_attempts)?,
                base_delay: Duration::from_millis(parse_or(
                    &get,
                    "STORE_RETRY_DELAY_MS",
                    defaults.base_delay.as_millis() as u64,
                )?),
            },
        };
        if store.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "STORE_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let auth = AuthConfig {
            jwt_secret: get("SUPABASE_JWT_SECRET").ok_or(ConfigError::Missing("SUPABASE_JWT_SECRET"))?,
            audience: get("JWT_AUDIENCE"),
            leeway_secs: parse_or(&get, "JWT_LEEWAY_SECS", 0)?,
        };

        let log = LogConfig {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: match get("LOG_FORMAT").as_deref().unwrap_or("text") {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "LOG_FORMAT",
                        value: other.to_string(),
                        reason: "expected `text` or `json`".to_string(),
                    })
                }
            },
        };

        Ok(Self {
            server,
            cors,
            store,
            auth,
            log,
        })
    }
}

impl ServerConfig {
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                value: raw,
                reason: e.to_string(),
            })
        }
    }
}

fn list_or<G>(get: &G, key: &str, default: &str) -> Vec<String>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .unwrap_or_else(|| default.to_string())
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `SUPABASE_URL` wins; otherwise the URL is derived from `SUPABASE_PROJECT_ID`.
/// A URL given without a scheme is assumed to be https.
fn supabase_url<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let url = match (get("SUPABASE_URL"), get("SUPABASE_PROJECT_ID")) {
        (Some(url), _) => url,
        (None, Some(project_id)) => format!("{}.supabase.co", project_id.trim()),
        (None, None) => return Err(ConfigError::Missing("SUPABASE_URL")),
    };
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{}", url))
    }
}
