//! Configuration module
//!
//! Configuration for the remote store connection, paging, and demo data generation.
//! Values come from the environment (optionally seeded from a `.env` file).

use std::env;
use std::fmt;
use std::str::FromStr;

const STORE_TIMEOUT_SECS: u64 = 30;
const PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 500;
const GENERATOR_BATCH_SIZE: usize = 100;
const MAX_GENERATOR_BATCH_SIZE: usize = 1000;
const GENERATOR_TARGET_COUNT: usize = 1200;
const SETTINGS_PATH: &str = ".crewboard/settings.json";

/// Which remote store implementation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted database exposed over its REST interface
    Rest,
    /// Process-local store, used for demos and tests
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Rest => write!(f, "rest"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" | "supabase" => Ok(StoreBackend::Rest),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Invalid store backend: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub store_timeout_secs: u64,
    pub page_size: u32,
    pub generator_batch_size: usize,
    pub generator_target_count: usize,
    pub default_client_code: Option<String>,
    pub settings_path: String,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            store_url: None,
            store_api_key: None,
            store_timeout_secs: STORE_TIMEOUT_SECS,
            page_size: PAGE_SIZE,
            generator_batch_size: GENERATOR_BATCH_SIZE,
            generator_target_count: GENERATOR_TARGET_COUNT,
            default_client_code: None,
            settings_path: SETTINGS_PATH.to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Rest,
        };

        let config = Config {
            store_backend,
            store_url: env::var("STORE_URL")
                .or_else(|_| env::var("SUPABASE_URL"))
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().trim_end_matches('/').to_string()),
            store_api_key: env::var("STORE_API_KEY")
                .or_else(|_| env::var("SUPABASE_ANON_KEY"))
                .ok()
                .filter(|s| !s.trim().is_empty()),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| STORE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STORE_TIMEOUT_SECS),
            page_size: env::var("PAGE_SIZE")
                .unwrap_or_else(|_| PAGE_SIZE.to_string())
                .parse::<u32>()
                .unwrap_or(PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            generator_batch_size: env::var("GENERATOR_BATCH_SIZE")
                .unwrap_or_else(|_| GENERATOR_BATCH_SIZE.to_string())
                .parse::<usize>()
                .unwrap_or(GENERATOR_BATCH_SIZE)
                .clamp(1, MAX_GENERATOR_BATCH_SIZE),
            generator_target_count: env::var("GENERATOR_TARGET_COUNT")
                .unwrap_or_else(|_| GENERATOR_TARGET_COUNT.to_string())
                .parse()
                .unwrap_or(GENERATOR_TARGET_COUNT),
            default_client_code: env::var("DEFAULT_CLIENT_CODE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            settings_path: env::var("SETTINGS_PATH").unwrap_or_else(|_| SETTINGS_PATH.to_string()),
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.store_backend == StoreBackend::Rest {
            let url = self.store_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("STORE_URL (or SUPABASE_URL) must be set for the rest backend")
            })?;
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("STORE_URL must be an http(s) URL"));
            }
            if self.store_api_key.is_none() {
                return Err(anyhow::anyhow!(
                    "STORE_API_KEY (or SUPABASE_ANON_KEY) must be set for the rest backend"
                ));
            }
        }

        if self.is_production() && self.store_backend == StoreBackend::Memory {
            return Err(anyhow::anyhow!(
                "The memory store backend cannot be used in production"
            ));
        }

        Ok(())
    }
}
