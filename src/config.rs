use serde::Deserialize;
use std::str::FromStr;

/// Which repository backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => anyhow::bail!("STORAGE must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

/// Business rules applied to credit applications.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditRules {
    /// Largest accepted `numberOfInstallments` (inclusive).
    pub max_installments: u32,
    /// The first installment may be at most this many months after today.
    pub max_months_to_first_installment: u32,
}

impl CreditRules {
    /// Rejects settings under which no application could ever pass.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.max_installments == 0 {
            anyhow::bail!("CREDIT_MAX_INSTALLMENTS must be at least 1");
        }
        if self.max_months_to_first_installment == 0 {
            anyhow::bail!("CREDIT_MAX_FIRST_INSTALLMENT_MONTHS must be at least 1");
        }
        Ok(())
    }
}

impl Default for CreditRules {
    fn default() -> Self {
        Self {
            max_installments: 48,
            max_months_to_first_installment: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Empty when running with the in-memory backend.
    pub database_url: String,
    pub storage: StorageBackend,
    pub port: u16,
    pub db_max_connections: u32,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub credit_rules: CreditRules,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage: StorageBackend = env_or("STORAGE", StorageBackend::Postgres)?;

        let database_url = match storage {
            StorageBackend::Memory => String::new(),
            StorageBackend::Postgres => std::env::var("DB_URL")
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
        };

        let credit_rules = CreditRules {
            max_installments: env_or("CREDIT_MAX_INSTALLMENTS", 48)?,
            max_months_to_first_installment: env_or("CREDIT_MAX_FIRST_INSTALLMENT_MONTHS", 3)?,
        };
        credit_rules.check()?;

        let config = Self {
            database_url,
            storage,
            port: env_or("PORT", 8080)?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            rate_limit_per_second: env_or("RATE_LIMIT_PER_SECOND", 10)?,
            rate_limit_burst: env_or("RATE_LIMIT_BURST", 20)?,
            credit_rules,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Storage backend: {:?}", config.storage);
        if config.storage == StorageBackend::Postgres {
            tracing::debug!(
                "Database URL: {}...",
                config.database_url.chars().take(20).collect::<String>()
            );
        }
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Credit rules: max {} installments, first installment within {} months",
            config.credit_rules.max_installments,
            config.credit_rules.max_months_to_first_installment
        );

        Ok(config)
    }
}

/// Reads `name` from the environment, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", name, raw))
}
