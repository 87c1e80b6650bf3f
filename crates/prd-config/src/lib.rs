//! Centralized, layered configuration for the PRD builder workspace.
//!
//! Configuration follows a simple hierarchy:
//! 1. Compiled-in safe defaults (constants below)
//! 2. Environment variable overrides, read once at process startup
//! 3. Runtime validation via the [`validation::Validate`] trait
//!
//! The core reads configuration exactly once at startup (see [`source::ConfigurationLoader`]);
//! nothing in this workspace re-reads the environment after that point.

pub mod error;
pub mod profile;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::time::Duration;
use validation::Validate;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "prd_builder";
const DEFAULT_DB_USER: &str = "prd_builder";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DB_IDLE_TIMEOUT_SECONDS: u64 = 300;

const DEFAULT_MAX_PRIVACY_LEVEL: &str = "external";
const DEFAULT_PROVIDER_DEADLINE_SECONDS: u64 = 30;
const DEFAULT_PROVIDER_MAX_RETRIES: u32 = 3;
const DEFAULT_PROVIDER_UNHEALTHY_COOLDOWN_SECONDS: u64 = 60;
const DEFAULT_PROVIDER_FAILURE_THRESHOLD: u32 = 3;

const DEFAULT_ENABLE_CLARIFICATIONS: bool = true;
const DEFAULT_CLARIFICATION_CONFIDENCE_THRESHOLD: f64 = 0.70;

const DEFAULT_CONTEXT_WINDOW_TOKENS: usize = 4096;
const DEFAULT_CONTEXT_SYSTEM_RESERVE_TOKENS: usize = 500;
const DEFAULT_CONTEXT_PER_CHUNK_TARGET_TOKENS: usize = 2500;
const DEFAULT_CONTEXT_MULTI_TURN_MAX_CHUNKS: usize = 10;
const DEFAULT_CONTEXT_CODE_EXCERPT_CHARS: usize = 800;

const DEFAULT_INDEXING_BATCH_SIZE: usize = 10;
const DEFAULT_INDEXING_INTER_BATCH_DELAY_MS: u64 = 500;
const DEFAULT_INDEXING_MAX_RETRIES: u32 = 3;
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

const DEFAULT_API_PORT: u16 = 8080;

/// Top-level, validated configuration for the whole workspace.
///
/// Constructed once (by [`source::ConfigurationLoader`]) and handed down as an
/// `Arc<ApplicationConfig>` to every subsystem; nothing downstream re-reads
/// the environment after startup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationConfig {
    /// Which profile this configuration was derived from.
    pub profile: Profile,
    /// Store (§4.1) persistence settings.
    pub database: DatabaseConfig,
    /// Provider orchestrator (§4.6) settings.
    pub providers: ProviderConfig,
    /// Clarification gate (§4.7 Phase 2) settings.
    pub clarification: ClarificationConfig,
    /// Context pipeline (§4.5) token-budget settings.
    pub context: ContextBudgetConfig,
    /// Codebase indexer (§4.2) settings.
    pub indexing: IndexingConfig,
    /// Composition-root API surface settings.
    pub api: ApiConfig,
}

impl ApplicationConfig {
    /// Build the default configuration for a profile, then layer environment
    /// variable overrides on top of it.
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        Self {
            profile,
            database: DatabaseConfig::from_env(),
            providers: ProviderConfig::from_env(),
            clarification: ClarificationConfig::from_env(),
            context: ContextBudgetConfig::from_env(),
            indexing: IndexingConfig::from_env(),
            api: ApiConfig::from_env(),
        }
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.providers.validate()?;
        self.clarification.validate()?;
        self.context.validate()?;
        self.indexing.validate()?;
        self.api.validate()
    }
}

/// Which backing store type the database credentials below target.
///
/// §6: `DATABASE_TYPE ∈ {postgresql, supabase, mongodb}`. Only `postgresql`
/// and `supabase` (which is Postgres under the hood) have a concrete adapter
/// in `prd-store`; `mongodb` is recognized but unimplemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Postgresql,
    Supabase,
    Mongodb,
}

impl std::str::FromStr for DatabaseType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "supabase" => Ok(Self::Supabase),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(ConfigError::Generic {
                message: format!("unknown DATABASE_TYPE: {other}"),
            }),
        }
    }
}

/// Request/document store persistence settings (§3.1).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    pub database_type: DatabaseType,
    /// When set, the store runs against an in-memory mock instead of Postgres.
    /// Intended for local demos and CI where no database is provisioned.
    pub skip_database: bool,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl DatabaseConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let database_type = std::env::var("DATABASE_TYPE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DatabaseType::Postgresql);

        Self {
            database_type,
            skip_database: std::env::var("SKIP_DATABASE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            host: std::env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_PORT),
            name: std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
            user: std::env::var("DB_USER").unwrap_or_else(|_| DEFAULT_DB_USER.to_string()),
            password: std::env::var("DB_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_DB_PASSWORD.to_string()),
            ssl_mode: std::env::var("DB_SSL_MODE")
                .unwrap_or_else(|_| DEFAULT_DB_SSL_MODE.to_string()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS),
            timeout_seconds: std::env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_TIMEOUT_SECONDS),
            idle_timeout_seconds: std::env::var("DB_IDLE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_IDLE_TIMEOUT_SECONDS),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_key: std::env::var("SUPABASE_KEY").ok(),
        }
    }

    /// Build `sqlx` connect options for this configuration.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = match self.ssl_mode.as_str() {
            "require" => PgSslMode::Require,
            "prefer" => PgSslMode::Prefer,
            _ => PgSslMode::Disable,
        };
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(ssl_mode)
    }

    /// Build a single-pool `PgPool` using this configuration's connection limits.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or credentials are invalid.
    pub async fn create_pool(&self) -> ConfigResult<sqlx::PgPool> {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds))
            .connect_with(self.connect_options().application_name("prd-builder"))
            .await
            .map_err(|e| ConfigError::Generic {
                message: format!("failed to connect to database: {e}"),
            })
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.skip_database {
            return Ok(());
        }
        validation::validate_non_empty(&self.host, "database.host")?;
        validation::validate_port(self.port, "database.port")?;
        validation::validate_non_empty(&self.name, "database.name")?;
        if self.database_type == DatabaseType::Supabase && self.supabase_url.is_none() {
            return Err(ConfigError::MissingField {
                field: "SUPABASE_URL".to_string(),
            });
        }
        Ok(())
    }
}

/// Privacy ceilings a provider may be allowed to operate under (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyLevel {
    /// Strictest: must never leave the local device.
    OnDevice,
    /// May call a private cloud deployment the operator controls.
    PrivateCloud,
    /// May call any external provider.
    External,
}

impl std::str::FromStr for PrivacyLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ondevice" | "on_device" | "on-device" => Ok(Self::OnDevice),
            "privatecloud" | "private_cloud" | "private-cloud" => Ok(Self::PrivateCloud),
            "external" => Ok(Self::External),
            other => Err(ConfigError::Generic {
                message: format!("unknown MAX_PRIVACY_LEVEL: {other}"),
            }),
        }
    }
}

/// Provider orchestrator settings (§4.6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderConfig {
    /// §6: `MAX_PRIVACY_LEVEL` — candidates whose `maxPrivacyLevel` exceeds this are excluded.
    pub max_privacy_level: PrivacyLevel,
    /// §6: `PREFERRED_PROVIDER`.
    pub preferred_provider: Option<String>,
    /// Per-provider API keys, keyed by provider name (e.g. `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).
    pub api_keys: std::collections::HashMap<String, String>,
    /// Default per-request deadline in seconds (§4.6 "Execution").
    pub deadline_seconds: u64,
    /// Max retry attempts on transient errors before advancing to the next candidate.
    pub max_retries: u32,
    /// Consecutive failures before a provider is marked unhealthy.
    pub failure_threshold: u32,
    /// Cooldown in seconds an unhealthy provider is skipped for.
    pub unhealthy_cooldown_seconds: u64,
}

impl ProviderConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let max_privacy_level = std::env::var("MAX_PRIVACY_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(
                DEFAULT_MAX_PRIVACY_LEVEL
                    .parse()
                    .unwrap_or(PrivacyLevel::External),
            );

        let mut api_keys = std::collections::HashMap::new();
        for (key, value) in std::env::vars() {
            if let Some(provider) = key.strip_suffix("_API_KEY") {
                api_keys.insert(provider.to_lowercase(), value);
            }
        }

        Self {
            max_privacy_level,
            preferred_provider: std::env::var("PREFERRED_PROVIDER").ok(),
            api_keys,
            deadline_seconds: std::env::var("PROVIDER_DEADLINE_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROVIDER_DEADLINE_SECONDS),
            max_retries: std::env::var("PROVIDER_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROVIDER_MAX_RETRIES),
            failure_threshold: std::env::var("PROVIDER_FAILURE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROVIDER_FAILURE_THRESHOLD),
            unhealthy_cooldown_seconds: std::env::var("PROVIDER_UNHEALTHY_COOLDOWN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROVIDER_UNHEALTHY_COOLDOWN_SECONDS),
        }
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(u64::from(self.max_retries), 0, 10, "providers.max_retries")?;
        validation::validate_range(self.deadline_seconds, 1, 3600, "providers.deadline_seconds")
    }
}

/// Clarification gate settings (§4.7 Phase 2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClarificationConfig {
    /// §6: `ENABLE_CLARIFICATIONS`.
    pub enabled: bool,
    /// Confidence below which clarification is requested before generation proceeds.
    pub confidence_threshold: f64,
}

impl ClarificationConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("ENABLE_CLARIFICATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ENABLE_CLARIFICATIONS),
            confidence_threshold: std::env::var("CLARIFICATION_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CLARIFICATION_CONFIDENCE_THRESHOLD),
        }
    }
}

impl Validate for ClarificationConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "clarification.confidence_threshold".to_string(),
                value: 0,
                min: 0,
                max: 1,
            });
        }
        Ok(())
    }
}

/// Context pipeline token-budget settings (§4.5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContextBudgetConfig {
    pub context_window_tokens: usize,
    pub system_reserve_tokens: usize,
    pub per_chunk_target_tokens: usize,
    /// Above this chunk count, `multiTurn` is no longer viable and `summarized` is used.
    pub multi_turn_max_chunks: usize,
    /// Characters a retrieved code-file excerpt is truncated to.
    pub code_excerpt_chars: usize,
}

impl ContextBudgetConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            context_window_tokens: std::env::var("CONTEXT_WINDOW_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONTEXT_WINDOW_TOKENS),
            system_reserve_tokens: std::env::var("CONTEXT_SYSTEM_RESERVE_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONTEXT_SYSTEM_RESERVE_TOKENS),
            per_chunk_target_tokens: std::env::var("CONTEXT_PER_CHUNK_TARGET_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONTEXT_PER_CHUNK_TARGET_TOKENS),
            multi_turn_max_chunks: std::env::var("CONTEXT_MULTI_TURN_MAX_CHUNKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONTEXT_MULTI_TURN_MAX_CHUNKS),
            code_excerpt_chars: std::env::var("CONTEXT_CODE_EXCERPT_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONTEXT_CODE_EXCERPT_CHARS),
        }
    }

    /// Usable tokens per context block: `contextWindow − systemReserve`.
    #[must_use]
    pub const fn usable_tokens(&self) -> usize {
        self.context_window_tokens
            .saturating_sub(self.system_reserve_tokens)
    }
}

impl Validate for ContextBudgetConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.system_reserve_tokens >= self.context_window_tokens {
            return Err(ConfigError::Generic {
                message: "context.system_reserve_tokens must be smaller than context_window_tokens"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Codebase indexer settings (§4.2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexingConfig {
    /// Content fetches per batch.
    pub batch_size: usize,
    /// Minimum delay between batches, in milliseconds.
    pub inter_batch_delay_ms: u64,
    /// Transient failure retry ceiling before a job fails fatally.
    pub max_retries: u32,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

impl IndexingConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            batch_size: std::env::var("INDEXING_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_INDEXING_BATCH_SIZE),
            inter_batch_delay_ms: std::env::var("INDEXING_INTER_BATCH_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_INDEXING_INTER_BATCH_DELAY_MS),
            max_retries: std::env::var("INDEXING_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_INDEXING_MAX_RETRIES),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions: std::env::var("EMBEDDING_DIMENSIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
        }
    }
}

impl Validate for IndexingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.batch_size as u64, 1, 1000, "indexing.batch_size")?;
        validation::validate_range(
            self.embedding_dimensions as u64,
            1,
            100_000,
            "indexing.embedding_dimensions",
        )
    }
}

/// Composition-root API surface settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiConfig {
    /// §6: `PORT`.
    pub port: u16,
}

impl ApiConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_API_PORT),
        }
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_port(self.port, "api.port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ApplicationConfig::with_profile(Profile::Test);
        assert!(config.validate().is_ok() || config.database.skip_database);
    }

    #[test]
    fn usable_tokens_subtracts_reserve() {
        let budget = ContextBudgetConfig {
            context_window_tokens: 4096,
            system_reserve_tokens: 500,
            per_chunk_target_tokens: 2500,
            multi_turn_max_chunks: 10,
            code_excerpt_chars: 800,
        };
        assert_eq!(budget.usable_tokens(), 3596);
    }

    #[test]
    fn database_type_parses_case_insensitively() {
        assert_eq!(
            "PostgreSQL".parse::<DatabaseType>().unwrap(),
            DatabaseType::Postgresql
        );
        assert!("nosql".parse::<DatabaseType>().is_err());
    }
}
