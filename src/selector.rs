//! Experiment target selectors
//!
//! A [`ChaosSelector`] describes which pods or nodes a fault applies to.
//! Label-based and pod-name-based selection are mutually exclusive, and at
//! least one selection mechanism must be present; both rules are enforced at
//! construction.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// A `matchExpressions`-style selector term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSelector {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

impl ExpressionSelector {
    pub fn new(
        key: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            values,
        }
    }

    fn to_wire(&self) -> Value {
        json!({
            "key": self.key,
            "operator": self.operator,
            "values": self.values,
        })
    }
}

/// Unified selector for chaos experiment targets, immutable once built
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChaosSelector {
    namespaces: Vec<String>,
    label_selectors: BTreeMap<String, String>,
    pods: BTreeMap<String, Vec<String>>,
    field_selectors: BTreeMap<String, String>,
    annotation_selectors: BTreeMap<String, String>,
    node_selectors: BTreeMap<String, String>,
    pod_phase_selectors: Vec<String>,
    expression_selectors: Vec<ExpressionSelector>,
}

impl ChaosSelector {
    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::default()
    }

    /// Create a selector from labels
    pub fn from_labels<I, K, V>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::builder().labels(labels).build()
    }

    /// Create a selector from labels, scoped to the given namespaces
    pub fn from_labels_in<I, K, V, N, S>(labels: I, namespaces: N) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().labels(labels).namespaces(namespaces).build()
    }

    /// Create a selector from specific pod names in one namespace
    pub fn from_pods<I, S>(namespace: impl Into<String>, pod_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let namespace = namespace.into();
        Self::builder()
            .namespaces([namespace.clone()])
            .pods(namespace, pod_names)
            .build()
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn label_selectors(&self) -> &BTreeMap<String, String> {
        &self.label_selectors
    }

    pub fn pods(&self) -> &BTreeMap<String, Vec<String>> {
        &self.pods
    }

    /// Serialize to the Chaos Mesh CRD selector format, omitting empty
    /// fields. Deterministic for a given selector.
    pub fn to_wire(&self) -> Value {
        let mut selector = Map::new();

        if !self.namespaces.is_empty() {
            selector.insert("namespaces".to_string(), json!(self.namespaces));
        }

        if !self.label_selectors.is_empty() {
            selector.insert("labelSelectors".to_string(), json!(self.label_selectors));
        }

        if !self.pods.is_empty() {
            selector.insert("pods".to_string(), json!(self.pods));
        }

        if !self.field_selectors.is_empty() {
            selector.insert("fieldSelectors".to_string(), json!(self.field_selectors));
        }

        if !self.annotation_selectors.is_empty() {
            selector.insert(
                "annotationSelectors".to_string(),
                json!(self.annotation_selectors),
            );
        }

        if !self.node_selectors.is_empty() {
            selector.insert("nodeSelectors".to_string(), json!(self.node_selectors));
        }

        if !self.pod_phase_selectors.is_empty() {
            selector.insert(
                "podPhaseSelectors".to_string(),
                json!(self.pod_phase_selectors),
            );
        }

        if !self.expression_selectors.is_empty() {
            let expressions: Vec<Value> = self
                .expression_selectors
                .iter()
                .map(ExpressionSelector::to_wire)
                .collect();
            selector.insert("expressionSelectors".to_string(), Value::Array(expressions));
        }

        Value::Object(selector)
    }
}

impl fmt::Display for ChaosSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.pods.is_empty() {
            let pods: Vec<String> = self
                .pods
                .iter()
                .map(|(ns, names)| format!("{}/{}", ns, names.join(",")))
                .collect();
            write!(f, "pods: {}", pods.join(", "))
        } else if !self.label_selectors.is_empty() {
            let labels: Vec<String> = self
                .label_selectors
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "labels: {}", labels.join(", "))?;
            if !self.namespaces.is_empty() {
                write!(f, " in {}", self.namespaces.join(", "))?;
            }
            Ok(())
        } else {
            write!(f, "custom selector")
        }
    }
}

/// Fallible builder for [`ChaosSelector`]; validation runs in [`build`](Self::build)
#[derive(Debug, Default)]
pub struct SelectorBuilder {
    selector: ChaosSelector,
}

impl SelectorBuilder {
    pub fn namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selector
            .namespaces
            .extend(namespaces.into_iter().map(Into::into));
        self
    }

    pub fn labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.selector
            .label_selectors
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Target specific pods in a namespace
    pub fn pods<I, S>(mut self, namespace: impl Into<String>, pod_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selector
            .pods
            .entry(namespace.into())
            .or_default()
            .extend(pod_names.into_iter().map(Into::into));
        self
    }

    pub fn field_selectors<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.selector
            .field_selectors
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn annotation_selectors<I, K, V>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.selector
            .annotation_selectors
            .extend(annotations.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn node_selectors<I, K, V>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.selector
            .node_selectors
            .extend(nodes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn pod_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selector
            .pod_phase_selectors
            .extend(phases.into_iter().map(Into::into));
        self
    }

    pub fn expression(mut self, expression: ExpressionSelector) -> Self {
        self.selector.expression_selectors.push(expression);
        self
    }

    /// Validate and finish the selector. Fails if labels and pod names are
    /// both present, or if no selection mechanism is set at all.
    pub fn build(self) -> Result<ChaosSelector> {
        let s = &self.selector;

        if !s.label_selectors.is_empty() && !s.pods.is_empty() {
            return Err(Error::AmbiguousSelector(
                "cannot use both label selectors and pod names simultaneously; \
                 use either labels OR pods for selection"
                    .to_string(),
            ));
        }

        if s.label_selectors.is_empty()
            && s.pods.is_empty()
            && s.field_selectors.is_empty()
            && s.annotation_selectors.is_empty()
            && s.node_selectors.is_empty()
            && s.pod_phase_selectors.is_empty()
            && s.expression_selectors.is_empty()
        {
            return Err(Error::AmbiguousSelector(
                "at least one selection method must be specified: labels, pods, \
                 field selectors, annotation selectors, node selectors, pod phases, \
                 or expression selectors"
                    .to_string(),
            ));
        }

        Ok(self.selector)
    }
}
