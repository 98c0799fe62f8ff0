//! SDK configuration
//!
//! An explicit, immutable settings object constructed once and passed by
//! reference into the client and manager.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct ChaosConfig {
    /// API group of the Chaos Mesh CRD family
    #[serde(default = "default_api_group")]
    pub api_group: String,

    /// API version of the Chaos Mesh CRD family
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum attempts per API call (including the first)
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Multiplier for the exponential backoff schedule
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: f64,

    /// Lower bound for a single backoff wait, in seconds
    #[serde(default = "default_retry_min_wait_secs")]
    pub retry_min_wait_secs: f64,

    /// Upper bound for a single backoff wait, in seconds
    #[serde(default = "default_retry_max_wait_secs")]
    pub retry_max_wait_secs: f64,

    /// Default poll interval for status waits, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,

    /// Default overall deadline for status waits, in seconds
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Explicit kubeconfig path; inferred from the environment when unset
    #[serde(default)]
    pub kubeconfig_path: Option<String>,
}

fn default_api_group() -> String {
    "chaos-mesh.org".to_string()
}

fn default_api_version() -> String {
    "v1alpha1".to_string()
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_multiplier() -> f64 {
    1.0
}

fn default_retry_min_wait_secs() -> f64 {
    1.0
}

fn default_retry_max_wait_secs() -> f64 {
    10.0
}

fn default_poll_interval_secs() -> f64 {
    2.0
}

fn default_wait_timeout_secs() -> u64 {
    60
}

impl ChaosConfig {
    /// Load configuration from the process environment (`CHAOS_*` variables),
    /// falling back to defaults for anything unset or unparseable.
    pub fn load() -> Self {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let loaded = config::Config::builder()
            .add_source(config::Environment::with_prefix("CHAOS").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize());

        match loaded {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Failed to load configuration from environment ({}), using defaults",
                    e
                );
                Self::default()
            }
        }
    }

    /// `apiVersion` value for compiled CRD documents
    pub fn api_version_string(&self) -> String {
        format!("{}/{}", self.api_group, self.api_version)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn retry_min_wait(&self) -> Duration {
        Duration::from_secs_f64(self.retry_min_wait_secs)
    }

    pub fn retry_max_wait(&self) -> Duration {
        Duration::from_secs_f64(self.retry_max_wait_secs)
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            api_group: default_api_group(),
            api_version: default_api_version(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_multiplier: default_retry_backoff_multiplier(),
            retry_min_wait_secs: default_retry_min_wait_secs(),
            retry_max_wait_secs: default_retry_max_wait_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            kubeconfig_path: None,
        }
    }
}
