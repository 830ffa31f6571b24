/// Configuration management for the API server
///
/// Loads configuration from environment variables (and a `.env` file when
/// present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT` or `SERVER_PORT`: Port to bind to (default: 9000)
/// - `CORS_ORIGINS` or `CORS_ORIGIN`: Comma-separated allowed origins, `*` for any
///   (default: http://localhost:5173)
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_EXPIRATION_DAYS`: Token lifetime (default: 7)
/// - `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS`, `ARGON2_PARALLELISM`: Hash cost
///   (default: 65536, 3, 4)
/// - `ENFORCE_PROJECT_OWNERSHIP`: Restrict projects to their owner (default: false)
/// - `RUST_LOG`, `LOG_FORMAT`: Read by the binary when installing the subscriber
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, fmt, str::FromStr};

use taskboard_shared::{auth::password::HashParams, db::pool::DatabaseConfig};

/// Default bind port
pub const DEFAULT_PORT: u16 = 9000;

/// Default allowed origin (the Vite dev server)
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Minimum JWT secret length in characters
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Longest accepted token lifetime (days)
pub const MAX_JWT_EXPIRATION_DAYS: i64 = 3650;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Which store backs the API
    pub storage: StorageBackend,

    /// Pool settings; present when `storage` is `Postgres`
    pub database: Option<DatabaseConfig>,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Argon2 cost for new password hashes
    pub password: HashParams,

    /// Authorization switches
    pub authz: AuthzConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}', expected 'postgres' or 'memory'", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in days
    pub expiration_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_days", &self.expiration_days)
            .finish()
    }
}

/// Authorization configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthzConfig {
    /// Only a project's owner may read or modify it
    pub enforce_project_ownership: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = first_var(&["API_PORT", "SERVER_PORT"])
            .map(|v| v.parse::<u16>())
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let cors_origins = parse_origins(
            &first_var(&["CORS_ORIGINS", "CORS_ORIGIN"]).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        );

        let storage = env::var("STORAGE_BACKEND")
            .map(|v| v.parse::<StorageBackend>())
            .unwrap_or(Ok(StorageBackend::Postgres))?;

        let database = match storage {
            StorageBackend::Postgres => {
                let url = env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

                Some(DatabaseConfig {
                    url,
                    max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
                    ..Default::default()
                })
            }
            StorageBackend::Memory => None,
        };

        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.chars().count() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LENGTH);
        }

        let expiration_days = check_expiration_days(parse_var("JWT_EXPIRATION_DAYS", 7)?)?;

        let defaults = HashParams::default();
        let password = HashParams {
            memory_kib: parse_var("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var("ARGON2_PARALLELISM", defaults.parallelism)?,
        };
        password
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid ARGON2_* settings: {}", e))?;

        let enforce_project_ownership = parse_flag(env::var("ENFORCE_PROJECT_OWNERSHIP").ok().as_deref())?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage,
            database,
            jwt: JwtConfig {
                secret,
                expiration_days,
            },
            password,
            authz: AuthzConfig {
                enforce_project_ownership,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn check_expiration_days(days: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_JWT_EXPIRATION_DAYS).contains(&days) {
        anyhow::bail!(
            "JWT_EXPIRATION_DAYS must be between 1 and {}",
            MAX_JWT_EXPIRATION_DAYS
        );
    }
    Ok(days)
}

/// First variable in `names` that is set
fn first_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env::var(name).ok())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: Option<&str>) -> anyhow::Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("Invalid boolean '{}'", other),
        },
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
