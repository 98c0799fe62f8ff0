//! Chaos experiment lifecycle manager
//!
//! Drives apply/delete and the poll-based wait protocol for a
//! [`ChaosExperiment`] against a [`ChaosResourceApi`] transport. All waiting
//! happens in the caller's task as an explicit poll loop; the manager spawns
//! no background work and holds no reference to experiments between calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::ChaosResourceApi;
use crate::config::ChaosConfig;
use crate::error::{Error, Result};
use crate::experiment::{ChaosExperiment, ChaosKind};

/// Condition type that confirms injection on every target
const ALL_INJECTED: &str = "AllInjected";

/// Condition types that terminate an injection wait as a failure
const FAILURE_CONDITIONS: [&str; 3] = ["Failed", "Timeout", "Finished"];

/// One entry of a resource's `status.conditions` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The status sub-document of a chaos resource. A resource without status
/// yet reads as an empty condition list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExperimentStatus {
    #[serde(default)]
    pub conditions: Vec<StatusCondition>,
}

/// Timing overrides for the wait loops; unset fields fall back to the
/// configuration defaults.
///
/// Both wait futures are cancel-safe: dropping one (e.g. from a
/// `tokio::select!`) aborts the wait at the next suspension point.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }
}

/// Manager for the chaos experiment lifecycle
pub struct ChaosManager<C = crate::client::ChaosClient> {
    client: C,
    config: ChaosConfig,
}

impl<C: ChaosResourceApi> ChaosManager<C> {
    pub fn new(client: C, config: ChaosConfig) -> Self {
        Self { client, config }
    }

    /// Compile the experiment and submit it to the cluster.
    ///
    /// A conflicting resource surfaces as [`Error::AlreadyExists`]; whether
    /// to re-apply is the caller's decision.
    pub async fn apply(&self, experiment: &ChaosExperiment) -> Result<()> {
        let crd = experiment.to_crd(&self.config);

        self.client
            .create(experiment.kind(), experiment.namespace(), &crd)
            .await?;

        info!(
            "Applied {}/{} targeting {}",
            experiment.kind(),
            experiment.name(),
            experiment.selector()
        );
        Ok(())
    }

    /// Remove the experiment from the cluster; an already-absent resource is
    /// success.
    pub async fn delete(&self, experiment: &ChaosExperiment) -> Result<()> {
        self.client
            .delete(experiment.kind(), experiment.namespace(), experiment.name())
            .await?;

        info!("Deleted {}/{}", experiment.kind(), experiment.name());
        Ok(())
    }

    /// Fetch the experiment's current status. A resource without a `status`
    /// or `conditions` field yields an empty status; an absent resource is
    /// [`Error::NotFound`].
    pub async fn get_status(&self, experiment: &ChaosExperiment) -> Result<ExperimentStatus> {
        let resource = self
            .client
            .get(experiment.kind(), experiment.namespace(), experiment.name())
            .await?;

        Ok(extract_status(&resource))
    }

    /// Poll until the cluster reports the fault injected on every target.
    ///
    /// Conditions are evaluated in the order the cluster returns them and
    /// the first terminal condition wins: `AllInjected=True` succeeds, a
    /// `True` condition of type `Failed`/`Timeout`/`Finished` fails with
    /// [`Error::ExperimentFailed`]. A resource that does not exist yet keeps
    /// the loop polling. Exhausting the deadline fails with
    /// [`Error::WaitTimeout`].
    pub async fn wait_for_injection(
        &self,
        experiment: &ChaosExperiment,
        options: &WaitOptions,
    ) -> Result<()> {
        let timeout = options.timeout.unwrap_or_else(|| self.config.wait_timeout());
        let poll_interval = options
            .poll_interval
            .unwrap_or_else(|| self.config.poll_interval());

        let start = Instant::now();
        info!(
            "Waiting for {}/{} injection (timeout: {:?})",
            experiment.kind(),
            experiment.name(),
            timeout
        );

        while start.elapsed() < timeout {
            match self.get_status(experiment).await {
                Ok(status) => {
                    for condition in &status.conditions {
                        if condition.condition_type == ALL_INJECTED && condition.status == "True" {
                            info!(
                                "Chaos {} injected successfully after {:.1}s",
                                experiment.name(),
                                start.elapsed().as_secs_f64()
                            );
                            return Ok(());
                        }

                        if condition.status == "True"
                            && FAILURE_CONDITIONS.contains(&condition.condition_type.as_str())
                        {
                            return Err(Error::ExperimentFailed {
                                name: experiment.name().to_string(),
                                condition: condition.condition_type.clone(),
                                message: condition
                                    .message
                                    .clone()
                                    .unwrap_or_else(|| "experiment reported failure".to_string()),
                            });
                        }
                    }

                    debug!("Chaos {} not yet injected, waiting...", experiment.name());
                }
                Err(Error::NotFound { .. }) => {
                    warn!("Chaos {} not found yet, retrying...", experiment.name());
                }
                Err(e) => return Err(e),
            }

            sleep(poll_interval).await;
        }

        Err(Error::WaitTimeout {
            name: experiment.name().to_string(),
            operation: "injection",
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Poll until the resource is gone. [`Error::NotFound`] from the
    /// transport confirms the deletion; any successful fetch keeps polling.
    pub async fn wait_for_deletion(
        &self,
        experiment: &ChaosExperiment,
        options: &WaitOptions,
    ) -> Result<()> {
        let timeout = options.timeout.unwrap_or_else(|| self.config.wait_timeout());
        let poll_interval = options
            .poll_interval
            .unwrap_or_else(|| self.config.poll_interval());

        let start = Instant::now();
        debug!(
            "Waiting for {}/{} deletion",
            experiment.kind(),
            experiment.name()
        );

        while start.elapsed() < timeout {
            match self.get_status(experiment).await {
                Ok(_) => sleep(poll_interval).await,
                Err(Error::NotFound { .. }) => {
                    info!(
                        "Chaos {} deleted successfully after {:.1}s",
                        experiment.name(),
                        start.elapsed().as_secs_f64()
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::WaitTimeout {
            name: experiment.name().to_string(),
            operation: "deletion",
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Sweep the whole CRD family in a namespace and delete every matching
    /// experiment; with `dry_run` only logs what would go. Per-kind errors
    /// are logged and skipped. Returns the number of experiments cleaned
    /// (or counted, in dry-run mode).
    pub async fn cleanup_orphaned(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
        dry_run: bool,
    ) -> usize {
        let mut cleaned = 0;

        for kind in ChaosKind::ALL {
            let items = match self
                .client
                .list(*kind, namespace, label_selector.unwrap_or(""))
                .await
            {
                Ok(items) => items,
                Err(e) => {
                    warn!("Error cleaning {} experiments: {}", kind, e);
                    continue;
                }
            };

            for item in items {
                let name = match item.pointer("/metadata/name").and_then(Value::as_str) {
                    Some(name) => name.to_string(),
                    None => continue,
                };

                if dry_run {
                    info!("[dry-run] Would delete {}/{}", kind, name);
                } else {
                    info!("Deleting orphaned experiment: {}/{}", kind, name);
                    if let Err(e) = self.client.delete(*kind, namespace, &name).await {
                        warn!("Failed to delete {}/{}: {}", kind, name, e);
                        continue;
                    }
                }

                cleaned += 1;
            }
        }

        cleaned
    }
}

fn extract_status(resource: &Value) -> ExperimentStatus {
    match resource.get("status") {
        None => ExperimentStatus::default(),
        Some(status) => serde_json::from_value(status.clone()).unwrap_or_else(|e| {
            warn!("Malformed status document ({}), treating as not ready", e);
            ExperimentStatus::default()
        }),
    }
}
