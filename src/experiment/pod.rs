//! Pod-level fault models (pod-failure, pod-kill, container-kill)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Pod-level chaos actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PodAction {
    PodFailure,
    PodKill,
    ContainerKill,
}

impl PodAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodAction::PodFailure => "pod-failure",
            PodAction::PodKill => "pod-kill",
            PodAction::ContainerKill => "container-kill",
        }
    }
}

impl std::fmt::Display for PodAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurring schedule for a fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Cron expression, e.g. `@every 5m`
    pub cron: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A pod-level fault description
#[derive(Debug, Clone, PartialEq)]
pub struct PodFault {
    pub action: PodAction,
    /// Required for `container-kill`, unused otherwise
    pub container_names: Vec<String>,
    pub grace_period: Option<i64>,
    pub scheduler: Option<SchedulerSpec>,
    pub remote_cluster: Option<String>,
}

impl PodFault {
    pub fn new(action: PodAction) -> Self {
        Self {
            action,
            container_names: Vec::new(),
            grace_period: None,
            scheduler: None,
            remote_cluster: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.action == PodAction::ContainerKill && self.container_names.is_empty() {
            return Err(Error::Validation {
                field: "container_names",
                reason: "container-kill requires container names, e.g. ['nginx', 'sidecar']"
                    .to_string(),
            });
        }

        if let Some(grace) = self.grace_period {
            if grace < 0 {
                return Err(Error::Validation {
                    field: "grace_period",
                    reason: format!("'{}' must be zero or a positive number of seconds", grace),
                });
            }
        }

        Ok(())
    }

    /// Action-specific spec fields for the CRD document
    pub(crate) fn action_spec(&self) -> Value {
        let mut spec = json!({ "action": self.action.as_str() });

        if !self.container_names.is_empty() {
            spec["containerNames"] = json!(self.container_names);
        }

        if let Some(grace) = self.grace_period {
            spec["gracePeriod"] = json!(grace);
        }

        if let Some(scheduler) = &self.scheduler {
            spec["scheduler"] = json!(scheduler);
        }

        if let Some(cluster) = &self.remote_cluster {
            spec["remoteCluster"] = json!(cluster);
        }

        spec
    }
}
