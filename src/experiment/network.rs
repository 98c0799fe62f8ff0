//! Network-level fault models
//!
//! Each network action owns its parameter block, so an action can never be
//! compiled without its parameters. Partition is the odd one out: its
//! direction and target selector serialize as top-level spec fields instead
//! of an action-named block.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::selector::ChaosSelector;
use crate::util::{validate_percentage, validate_tc_duration};

/// Network traffic direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkDirection {
    /// Apply to outgoing traffic
    #[default]
    To,
    /// Apply to incoming traffic
    From,
    /// Apply to both directions
    Both,
}

impl NetworkDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkDirection::To => "to",
            NetworkDirection::From => "from",
            NetworkDirection::Both => "both",
        }
    }
}

impl std::fmt::Display for NetworkDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for network latency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    /// Latency to add, e.g. `100ms`
    pub latency: String,
    /// Random jitter, e.g. `10ms`
    pub jitter: String,
    /// Correlation percentage (0-100)
    pub correlation: String,
    /// Optional reordering applied together with the delay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder: Option<ReorderParams>,
}

impl DelayParams {
    pub fn new(latency: impl Into<String>) -> Self {
        Self {
            latency: latency.into(),
            jitter: "0ms".to_string(),
            correlation: "0".to_string(),
            reorder: None,
        }
    }
}

/// Parameters for packet loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossParams {
    /// Loss percentage, e.g. `25` for 25%
    pub loss: String,
    pub correlation: String,
}

impl LossParams {
    pub fn new(loss: impl Into<String>) -> Self {
        Self {
            loss: loss.into(),
            correlation: "0".to_string(),
        }
    }
}

/// Parameters for packet duplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateParams {
    pub duplicate: String,
    pub correlation: String,
}

impl DuplicateParams {
    pub fn new(duplicate: impl Into<String>) -> Self {
        Self {
            duplicate: duplicate.into(),
            correlation: "0".to_string(),
        }
    }
}

/// Parameters for packet corruption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorruptParams {
    pub corrupt: String,
    pub correlation: String,
}

impl CorruptParams {
    pub fn new(corrupt: impl Into<String>) -> Self {
        Self {
            corrupt: corrupt.into(),
            correlation: "0".to_string(),
        }
    }
}

/// Parameters for packet reordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderParams {
    pub reorder: String,
    pub correlation: String,
    pub gap: String,
}

impl ReorderParams {
    pub fn new(reorder: impl Into<String>, gap: impl Into<String>) -> Self {
        Self {
            reorder: reorder.into(),
            correlation: "0".to_string(),
            gap: gap.into(),
        }
    }
}

/// Parameters for bandwidth limiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthParams {
    /// Rate limit, e.g. `1mbps`
    pub rate: String,
    pub limit: String,
    pub buffer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peakrate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minburst: Option<String>,
}

impl BandwidthParams {
    pub fn new(
        rate: impl Into<String>,
        limit: impl Into<String>,
        buffer: impl Into<String>,
    ) -> Self {
        Self {
            rate: rate.into(),
            limit: limit.into(),
            buffer: buffer.into(),
            peakrate: None,
            minburst: None,
        }
    }
}

/// Parameters for a network partition: direction plus a second selector
/// naming the other side of the cut.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionParams {
    pub direction: NetworkDirection,
    pub target: ChaosSelector,
}

/// A network action together with its parameter block
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkAction {
    Delay(DelayParams),
    Loss(LossParams),
    Duplicate(DuplicateParams),
    Corrupt(CorruptParams),
    Partition(PartitionParams),
    Bandwidth(BandwidthParams),
    Reorder(ReorderParams),
}

impl NetworkAction {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkAction::Delay(_) => "delay",
            NetworkAction::Loss(_) => "loss",
            NetworkAction::Duplicate(_) => "duplicate",
            NetworkAction::Corrupt(_) => "corrupt",
            NetworkAction::Partition(_) => "partition",
            NetworkAction::Bandwidth(_) => "bandwidth",
            NetworkAction::Reorder(_) => "reorder",
        }
    }
}

impl std::fmt::Display for NetworkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A network-level fault description
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkFault {
    pub action: NetworkAction,
    /// Traffic direction; ignored for partition, which carries its own
    pub direction: Option<NetworkDirection>,
    /// Network device to affect, e.g. `eth1`
    pub device: Option<String>,
    /// IP addresses or hostnames outside the cluster
    pub external_targets: Vec<String>,
    /// Raw tc parameters passed through to the controller
    pub tc_parameter: Option<Value>,
}

impl NetworkFault {
    pub fn new(action: NetworkAction) -> Self {
        Self {
            action,
            direction: None,
            device: None,
            external_targets: Vec::new(),
            tc_parameter: None,
        }
    }

    pub fn delay(params: DelayParams) -> Self {
        Self::new(NetworkAction::Delay(params))
    }

    pub fn loss(params: LossParams) -> Self {
        Self::new(NetworkAction::Loss(params))
    }

    pub fn duplicate(params: DuplicateParams) -> Self {
        Self::new(NetworkAction::Duplicate(params))
    }

    pub fn corrupt(params: CorruptParams) -> Self {
        Self::new(NetworkAction::Corrupt(params))
    }

    pub fn partition(target: ChaosSelector, direction: NetworkDirection) -> Self {
        Self::new(NetworkAction::Partition(PartitionParams {
            direction,
            target,
        }))
    }

    pub fn bandwidth(params: BandwidthParams) -> Self {
        Self::new(NetworkAction::Bandwidth(params))
    }

    pub fn reorder(params: ReorderParams) -> Self {
        Self::new(NetworkAction::Reorder(params))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match &self.action {
            NetworkAction::Delay(p) => {
                validate_tc_duration(&p.latency, "latency")?;
                validate_tc_duration(&p.jitter, "jitter")?;
                validate_percentage(&p.correlation, "correlation")?;
                if let Some(reorder) = &p.reorder {
                    validate_percentage(&reorder.reorder, "reorder")?;
                    validate_percentage(&reorder.correlation, "correlation")?;
                }
            }
            NetworkAction::Loss(p) => {
                validate_percentage(&p.loss, "loss")?;
                validate_percentage(&p.correlation, "correlation")?;
            }
            NetworkAction::Duplicate(p) => {
                validate_percentage(&p.duplicate, "duplicate")?;
                validate_percentage(&p.correlation, "correlation")?;
            }
            NetworkAction::Corrupt(p) => {
                validate_percentage(&p.corrupt, "corrupt")?;
                validate_percentage(&p.correlation, "correlation")?;
            }
            NetworkAction::Reorder(p) => {
                validate_percentage(&p.reorder, "reorder")?;
                validate_percentage(&p.correlation, "correlation")?;
            }
            // Bandwidth rates and partition targets have no format rule
            NetworkAction::Bandwidth(_) | NetworkAction::Partition(_) => {}
        }

        Ok(())
    }

    /// Action-specific spec fields for the CRD document
    pub(crate) fn action_spec(&self) -> Value {
        let mut spec = json!({ "action": self.action.name() });

        match &self.action {
            NetworkAction::Delay(p) => {
                let mut delay = json!({
                    "latency": p.latency,
                    "jitter": p.jitter,
                    "correlation": p.correlation,
                });
                if let Some(reorder) = &p.reorder {
                    delay["reorder"] = json!(reorder);
                }
                spec["delay"] = delay;
            }
            NetworkAction::Loss(p) => {
                spec["loss"] = json!(p);
            }
            NetworkAction::Duplicate(p) => {
                spec["duplicate"] = json!(p);
            }
            NetworkAction::Corrupt(p) => {
                spec["corrupt"] = json!(p);
            }
            NetworkAction::Partition(p) => {
                // Partition serializes as top-level direction/target fields,
                // not under an action-named key
                spec["direction"] = json!(p.direction.as_str());
                spec["target"] = p.target.to_wire();
            }
            NetworkAction::Bandwidth(p) => {
                spec["bandwidth"] = json!(p);
            }
            NetworkAction::Reorder(p) => {
                spec["reorder"] = json!(p);
            }
        }

        if let Some(direction) = self.direction {
            if !matches!(self.action, NetworkAction::Partition(_)) {
                spec["direction"] = json!(direction.as_str());
            }
        }

        if let Some(device) = &self.device {
            spec["device"] = json!(device);
        }

        if !self.external_targets.is_empty() {
            spec["externalTargets"] = json!(self.external_targets);
        }

        if let Some(tc) = &self.tc_parameter {
            spec["tcParameter"] = tc.clone();
        }

        spec
    }
}
