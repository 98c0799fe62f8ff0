//! Chaos experiment models
//!
//! A [`ChaosExperiment`] combines a target selector, a cardinality mode and a
//! fault description into one validated value, and compiles itself into the
//! CRD document submitted to the cluster. Construction goes through
//! [`ExperimentBuilder`] and is all-or-nothing: no invalid experiment ever
//! escapes [`ExperimentBuilder::build`].

mod network;
mod pod;

pub use network::{
    BandwidthParams, CorruptParams, DelayParams, DuplicateParams, LossParams, NetworkAction,
    NetworkDirection, NetworkFault, PartitionParams, ReorderParams,
};
pub use pod::{PodAction, PodFault, SchedulerSpec};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ChaosConfig;
use crate::error::{Error, Result};
use crate::selector::ChaosSelector;
use crate::util::{generate_unique_name, validate_duration};

/// Target selection mode: how many of the selected targets are affected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChaosMode {
    #[default]
    One,
    All,
    Fixed,
    FixedPercent,
    RandomMaxPercent,
}

impl ChaosMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosMode::One => "one",
            ChaosMode::All => "all",
            ChaosMode::Fixed => "fixed",
            ChaosMode::FixedPercent => "fixed-percent",
            ChaosMode::RandomMaxPercent => "random-max-percent",
        }
    }
}

impl std::fmt::Display for ChaosMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The Chaos Mesh CRD family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaosKind {
    PodChaos,
    NetworkChaos,
    IOChaos,
    StressChaos,
    TimeChaos,
    KernelChaos,
    DNSChaos,
    HTTPChaos,
    JVMChaos,
    AWSChaos,
    GCPChaos,
}

impl ChaosKind {
    /// Every kind, in the order cleanup sweeps them
    pub const ALL: &'static [ChaosKind] = &[
        ChaosKind::PodChaos,
        ChaosKind::NetworkChaos,
        ChaosKind::IOChaos,
        ChaosKind::StressChaos,
        ChaosKind::TimeChaos,
        ChaosKind::KernelChaos,
        ChaosKind::DNSChaos,
        ChaosKind::HTTPChaos,
        ChaosKind::JVMChaos,
        ChaosKind::AWSChaos,
        ChaosKind::GCPChaos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosKind::PodChaos => "PodChaos",
            ChaosKind::NetworkChaos => "NetworkChaos",
            ChaosKind::IOChaos => "IOChaos",
            ChaosKind::StressChaos => "StressChaos",
            ChaosKind::TimeChaos => "TimeChaos",
            ChaosKind::KernelChaos => "KernelChaos",
            ChaosKind::DNSChaos => "DNSChaos",
            ChaosKind::HTTPChaos => "HTTPChaos",
            ChaosKind::JVMChaos => "JVMChaos",
            ChaosKind::AWSChaos => "AWSChaos",
            ChaosKind::GCPChaos => "GCPChaos",
        }
    }

    /// Resource plural used in API paths (the lowercased kind)
    pub fn plural(&self) -> &'static str {
        match self {
            ChaosKind::PodChaos => "podchaos",
            ChaosKind::NetworkChaos => "networkchaos",
            ChaosKind::IOChaos => "iochaos",
            ChaosKind::StressChaos => "stresschaos",
            ChaosKind::TimeChaos => "timechaos",
            ChaosKind::KernelChaos => "kernelchaos",
            ChaosKind::DNSChaos => "dnschaos",
            ChaosKind::HTTPChaos => "httpchaos",
            ChaosKind::JVMChaos => "jvmchaos",
            ChaosKind::AWSChaos => "awschaos",
            ChaosKind::GCPChaos => "gcpchaos",
        }
    }
}

impl std::fmt::Display for ChaosKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fault description; one variant per modelled CRD kind.
///
/// The match in [`Fault::action_spec`] is exhaustive, so adding a variant
/// without a spec fragment fails to compile instead of silently no-opping.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Pod(PodFault),
    Network(NetworkFault),
}

impl Fault {
    pub fn kind(&self) -> ChaosKind {
        match self {
            Fault::Pod(_) => ChaosKind::PodChaos,
            Fault::Network(_) => ChaosKind::NetworkChaos,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Fault::Pod(fault) => fault.validate(),
            Fault::Network(fault) => fault.validate(),
        }
    }

    fn action_spec(&self) -> Value {
        match self {
            Fault::Pod(fault) => fault.action_spec(),
            Fault::Network(fault) => fault.action_spec(),
        }
    }
}

/// A validated chaos experiment, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct ChaosExperiment {
    name: String,
    namespace: String,
    selector: ChaosSelector,
    mode: ChaosMode,
    value: Option<String>,
    duration: Option<String>,
    fault: Fault,
}

impl ChaosExperiment {
    pub fn builder(selector: ChaosSelector, fault: Fault) -> ExperimentBuilder {
        ExperimentBuilder::new(selector, fault)
    }

    /// Pod-failure fault; defaults to a 30s duration
    pub fn pod_failure(selector: ChaosSelector) -> ExperimentBuilder {
        Self::builder(selector, Fault::Pod(PodFault::new(PodAction::PodFailure))).duration("30s")
    }

    pub fn pod_kill(selector: ChaosSelector, grace_period: Option<i64>) -> ExperimentBuilder {
        let fault = PodFault {
            grace_period,
            ..PodFault::new(PodAction::PodKill)
        };
        Self::builder(selector, Fault::Pod(fault))
    }

    pub fn container_kill(
        selector: ChaosSelector,
        container_names: Vec<String>,
        grace_period: Option<i64>,
    ) -> ExperimentBuilder {
        let fault = PodFault {
            container_names,
            grace_period,
            ..PodFault::new(PodAction::ContainerKill)
        };
        Self::builder(selector, Fault::Pod(fault))
    }

    pub fn network_delay(selector: ChaosSelector, params: DelayParams) -> ExperimentBuilder {
        Self::builder(selector, Fault::Network(NetworkFault::delay(params)))
    }

    pub fn network_loss(selector: ChaosSelector, params: LossParams) -> ExperimentBuilder {
        Self::builder(selector, Fault::Network(NetworkFault::loss(params)))
    }

    pub fn network_partition(
        selector: ChaosSelector,
        target: ChaosSelector,
        direction: NetworkDirection,
    ) -> ExperimentBuilder {
        Self::builder(
            selector,
            Fault::Network(NetworkFault::partition(target, direction)),
        )
    }

    pub fn network_bandwidth(
        selector: ChaosSelector,
        params: BandwidthParams,
    ) -> ExperimentBuilder {
        Self::builder(selector, Fault::Network(NetworkFault::bandwidth(params)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> ChaosKind {
        self.fault.kind()
    }

    pub fn selector(&self) -> &ChaosSelector {
        &self.selector
    }

    pub fn mode(&self) -> ChaosMode {
        self.mode
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// Compile the experiment into its CRD document.
    ///
    /// Produces a fresh document on every call; two calls on the same
    /// experiment yield identical output.
    pub fn to_crd(&self, config: &ChaosConfig) -> Value {
        let mut spec = json!({
            "selector": self.selector.to_wire(),
            "mode": self.mode.as_str(),
        });

        if let Some(value) = &self.value {
            spec["value"] = json!(value);
        }

        if let Some(duration) = &self.duration {
            spec["duration"] = json!(duration);
        }

        if let Value::Object(fragment) = self.fault.action_spec() {
            for (key, field) in fragment {
                spec[key] = field;
            }
        }

        let crd = json!({
            "apiVersion": config.api_version_string(),
            "kind": self.kind().as_str(),
            "metadata": {
                "name": self.name,
                "namespace": self.namespace,
            },
            "spec": spec,
        });

        debug!("Built CRD for {}/{}", self.kind(), self.name);
        crd
    }

    /// Render the CRD document as a YAML manifest
    pub fn to_yaml(&self, config: &ChaosConfig) -> Result<String> {
        serde_yaml::to_string(&self.to_crd(config))
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl std::fmt::Display for ChaosExperiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(name={}, selector={}, mode={})",
            self.kind(),
            self.name,
            self.selector,
            self.mode
        )
    }
}

/// Fallible builder for [`ChaosExperiment`]
#[derive(Debug)]
pub struct ExperimentBuilder {
    name: Option<String>,
    namespace: String,
    selector: ChaosSelector,
    mode: ChaosMode,
    value: Option<String>,
    duration: Option<String>,
    fault: Fault,
}

impl ExperimentBuilder {
    fn new(selector: ChaosSelector, fault: Fault) -> Self {
        Self {
            name: None,
            namespace: "default".to_string(),
            selector,
            mode: ChaosMode::One,
            value: None,
            duration: None,
            fault,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn mode(mut self, mode: ChaosMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Validate and finish the experiment. Checks duration format, then
    /// mode/value coupling, then fault-specific rules; generates a name if
    /// none was given.
    pub fn build(self) -> Result<ChaosExperiment> {
        if let Some(duration) = &self.duration {
            validate_duration(duration, "duration")?;
        }

        validate_mode_value(self.mode, self.value.as_deref())?;

        self.fault.validate()?;

        let name = match self.name {
            Some(name) => name,
            None => {
                let name = generate_unique_name(self.fault.kind().plural());
                debug!("Auto-generated experiment name: {}", name);
                name
            }
        };

        Ok(ChaosExperiment {
            name,
            namespace: self.namespace,
            selector: self.selector,
            mode: self.mode,
            value: self.value,
            duration: self.duration,
            fault: self.fault,
        })
    }
}

fn validate_mode_value(mode: ChaosMode, value: Option<&str>) -> Result<()> {
    let requires_value = matches!(
        mode,
        ChaosMode::Fixed | ChaosMode::FixedPercent | ChaosMode::RandomMaxPercent
    );

    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ if requires_value => {
            return Err(Error::Validation {
                field: "value",
                reason: format!(
                    "mode '{}' requires a value, e.g. '2' for a fixed count or '50' for a percentage",
                    mode
                ),
            });
        }
        _ => return Ok(()),
    };

    match mode {
        ChaosMode::Fixed => match value.parse::<i64>() {
            Ok(count) if count > 0 => Ok(()),
            _ => Err(Error::Validation {
                field: "value",
                reason: format!(
                    "'{}' is not valid for mode 'fixed'; expected a positive integer, e.g. '1', '2', '5'",
                    value
                ),
            }),
        },
        ChaosMode::FixedPercent | ChaosMode::RandomMaxPercent => match value.parse::<f64>() {
            Ok(pct) if (0.0..=100.0).contains(&pct) => Ok(()),
            _ => Err(Error::Validation {
                field: "value",
                reason: format!(
                    "'{}' is not valid for mode '{}'; expected a percentage between 0 and 100, e.g. '50'",
                    value, mode
                ),
            }),
        },
        // one/all carry the value through without interpreting it
        ChaosMode::One | ChaosMode::All => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> ChaosSelector {
        ChaosSelector::from_labels([("app", "test")]).unwrap()
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(ChaosMode::One.to_string(), "one");
        assert_eq!(ChaosMode::FixedPercent.to_string(), "fixed-percent");
        assert_eq!(ChaosMode::RandomMaxPercent.to_string(), "random-max-percent");

        let json = serde_json::to_value(ChaosMode::FixedPercent).unwrap();
        assert_eq!(json, "fixed-percent");
    }

    #[test]
    fn test_kind_plural() {
        assert_eq!(ChaosKind::PodChaos.plural(), "podchaos");
        assert_eq!(ChaosKind::NetworkChaos.plural(), "networkchaos");
        assert_eq!(ChaosKind::ALL.len(), 11);
    }

    #[test]
    fn test_auto_generated_name_prefix() {
        let experiment = ChaosExperiment::pod_kill(selector(), None).build().unwrap();
        assert!(experiment.name().starts_with("podchaos-"));

        let experiment = ChaosExperiment::network_delay(selector(), DelayParams::new("100ms"))
            .build()
            .unwrap();
        assert!(experiment.name().starts_with("networkchaos-"));
    }

    #[test]
    fn test_explicit_name_preserved() {
        let experiment = ChaosExperiment::pod_failure(selector())
            .name("my-custom-chaos")
            .build()
            .unwrap();
        assert_eq!(experiment.name(), "my-custom-chaos");
    }

    #[test]
    fn test_mode_fixed_requires_positive_integer() {
        for bad in ["0", "-1", "abc", "1.5"] {
            let result = ChaosExperiment::pod_kill(selector(), None)
                .mode(ChaosMode::Fixed)
                .value(bad)
                .build();
            assert!(
                matches!(result, Err(Error::Validation { field: "value", .. })),
                "value '{}' should be rejected",
                bad
            );
        }

        assert!(ChaosExperiment::pod_kill(selector(), None)
            .mode(ChaosMode::Fixed)
            .value("2")
            .build()
            .is_ok());
    }

    #[test]
    fn test_mode_percent_bounds() {
        let result = ChaosExperiment::pod_kill(selector(), None)
            .mode(ChaosMode::FixedPercent)
            .value("101")
            .build();
        assert!(result.is_err());

        assert!(ChaosExperiment::pod_kill(selector(), None)
            .mode(ChaosMode::FixedPercent)
            .value("50")
            .build()
            .is_ok());

        assert!(ChaosExperiment::pod_kill(selector(), None)
            .mode(ChaosMode::RandomMaxPercent)
            .value("25.5")
            .build()
            .is_ok());
    }

    #[test]
    fn test_mode_requires_value() {
        for mode in [
            ChaosMode::Fixed,
            ChaosMode::FixedPercent,
            ChaosMode::RandomMaxPercent,
        ] {
            let result = ChaosExperiment::pod_kill(selector(), None).mode(mode).build();
            assert!(result.is_err(), "mode '{}' should require a value", mode);
        }

        assert!(ChaosExperiment::pod_kill(selector(), None)
            .mode(ChaosMode::All)
            .build()
            .is_ok());
    }

    #[test]
    fn test_duration_validation() {
        for ok in ["30s", "5m", "2h"] {
            assert!(
                ChaosExperiment::pod_kill(selector(), None)
                    .duration(ok)
                    .build()
                    .is_ok(),
                "{}",
                ok
            );
        }
        for bad in ["30", "5mins", "-1s"] {
            assert!(
                ChaosExperiment::pod_kill(selector(), None)
                    .duration(bad)
                    .build()
                    .is_err(),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_to_crd_structure() {
        let config = ChaosConfig::default();
        let experiment = ChaosExperiment::container_kill(
            selector(),
            vec!["nginx".to_string(), "sidecar".to_string()],
            Some(10),
        )
        .name("kill-sidecars")
        .namespace("production")
        .mode(ChaosMode::Fixed)
        .value("2")
        .duration("5m")
        .build()
        .unwrap();

        let crd = experiment.to_crd(&config);

        assert_eq!(crd["apiVersion"], "chaos-mesh.org/v1alpha1");
        assert_eq!(crd["kind"], "PodChaos");
        assert_eq!(crd["metadata"]["name"], "kill-sidecars");
        assert_eq!(crd["metadata"]["namespace"], "production");
        assert_eq!(crd["spec"]["action"], "container-kill");
        assert_eq!(crd["spec"]["containerNames"], json!(["nginx", "sidecar"]));
        assert_eq!(crd["spec"]["gracePeriod"], 10);
        assert_eq!(crd["spec"]["mode"], "fixed");
        assert_eq!(crd["spec"]["value"], "2");
        assert_eq!(crd["spec"]["duration"], "5m");
        assert_eq!(crd["spec"]["selector"]["labelSelectors"]["app"], "test");
    }

    #[test]
    fn test_to_crd_is_idempotent() {
        let config = ChaosConfig::default();
        let experiment = ChaosExperiment::network_delay(selector(), DelayParams::new("100ms"))
            .build()
            .unwrap();

        assert_eq!(experiment.to_crd(&config), experiment.to_crd(&config));
    }

    #[test]
    fn test_to_yaml_renders_manifest() {
        let config = ChaosConfig::default();
        let experiment = ChaosExperiment::pod_kill(selector(), None)
            .name("kill-one")
            .build()
            .unwrap();

        let yaml = experiment.to_yaml(&config).unwrap();
        assert!(yaml.contains("kind: PodChaos"));
        assert!(yaml.contains("name: kill-one"));
        assert!(yaml.contains("action: pod-kill"));
    }

    #[test]
    fn test_default_namespace() {
        let experiment = ChaosExperiment::pod_kill(selector(), None).build().unwrap();
        assert_eq!(experiment.namespace(), "default");
    }

    #[test]
    fn test_display() {
        let experiment = ChaosExperiment::pod_kill(selector(), None)
            .name("kill-one")
            .mode(ChaosMode::All)
            .build()
            .unwrap();
        assert_eq!(
            experiment.to_string(),
            "PodChaos(name=kill-one, selector=labels: app=test, mode=all)"
        );
    }
}
