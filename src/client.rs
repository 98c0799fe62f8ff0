//! Kubernetes API client for Chaos Mesh custom resources
//!
//! [`ChaosResourceApi`] is the transport boundary the lifecycle manager
//! calls; [`ChaosClient`] implements it with kube-rs, adding bounded retry
//! and HTTP-status-to-error translation.

use async_trait::async_trait;
use kube::{
    api::{Api, DeleteParams, DynamicObject, ListParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    discovery::ApiResource,
    Client, Config,
};
#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ChaosConfig;
use crate::error::{Error, Result};
use crate::experiment::ChaosKind;
use crate::retry::RetryPolicy;

/// Create/get/delete/list operations on chaos custom resources.
///
/// Retry and error translation live behind this trait; callers only see the
/// domain error taxonomy.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChaosResourceApi: Send + Sync {
    /// Create a resource from its CRD document, returning the stored object.
    /// Fails with [`Error::AlreadyExists`] on a conflict.
    async fn create(&self, kind: ChaosKind, namespace: &str, document: &Value) -> Result<Value>;

    /// Fetch a resource by name. Fails with [`Error::NotFound`] when absent.
    async fn get(&self, kind: ChaosKind, namespace: &str, name: &str) -> Result<Value>;

    /// Delete a resource by name; an already-absent resource is success.
    async fn delete(&self, kind: ChaosKind, namespace: &str, name: &str) -> Result<()>;

    /// List resources of a kind, optionally filtered by a label selector.
    async fn list(
        &self,
        kind: ChaosKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Value>>;
}

/// kube-rs implementation of [`ChaosResourceApi`]
#[derive(Clone)]
pub struct ChaosClient {
    client: Client,
    config: ChaosConfig,
    retry: RetryPolicy,
}

impl ChaosClient {
    /// Connect using the configured kubeconfig path, or infer the
    /// configuration (in-cluster first, then default kubeconfig).
    pub async fn new(config: &ChaosConfig) -> Result<Self> {
        let kube_config = match &config.kubeconfig_path {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| Error::Connection {
                    operation: format!("load kubeconfig from {}", path),
                    reason: e.to_string(),
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::Connection {
                        operation: format!("load kubeconfig from {}", path),
                        reason: e.to_string(),
                    })?
            }
            None => Config::infer().await.map_err(|e| Error::Connection {
                operation: "infer kubernetes configuration".to_string(),
                reason: e.to_string(),
            })?,
        };

        let client = Client::try_from(kube_config).map_err(|e| Error::Connection {
            operation: "create kubernetes client".to_string(),
            reason: e.to_string(),
        })?;

        info!(
            "ChaosClient initialized for {}/{}",
            config.api_group, config.api_version
        );

        Ok(Self {
            client,
            config: config.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    fn api(&self, kind: ChaosKind, namespace: &str) -> Api<DynamicObject> {
        let resource = ApiResource {
            group: self.config.api_group.clone(),
            version: self.config.api_version.clone(),
            api_version: self.config.api_version_string(),
            kind: kind.as_str().to_string(),
            plural: kind.plural().to_string(),
        };

        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }

    fn connection_error(
        verb: &str,
        kind: ChaosKind,
        namespace: &str,
        name: &str,
        error: kube::Error,
    ) -> Error {
        Error::Connection {
            operation: format!("{} {}/{} in namespace {}", verb, kind, name, namespace),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl ChaosResourceApi for ChaosClient {
    async fn create(&self, kind: ChaosKind, namespace: &str, document: &Value) -> Result<Value> {
        let api = self.api(kind, namespace);

        let obj: DynamicObject = serde_json::from_value(document.clone())
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let name = obj.metadata.name.clone().unwrap_or_default();

        let result = self
            .retry
            .run(|| {
                let api = api.clone();
                let obj = obj.clone();
                async move { api.create(&PostParams::default(), &obj).await }
            })
            .await;

        match result {
            Ok(created) => {
                info!("Created {}/{} in namespace {}", kind, name, namespace);
                serde_json::to_value(&created).map_err(|e| Error::Serialization(e.to_string()))
            }
            Err(kube::Error::Api(e)) if e.code == 409 => Err(Error::AlreadyExists {
                kind,
                namespace: namespace.to_string(),
                name,
            }),
            Err(e) => Err(Self::connection_error("create", kind, namespace, &name, e)),
        }
    }

    async fn get(&self, kind: ChaosKind, namespace: &str, name: &str) -> Result<Value> {
        let api = self.api(kind, namespace);

        let result = self
            .retry
            .run(|| {
                let api = api.clone();
                let name = name.to_string();
                async move { api.get(&name).await }
            })
            .await;

        match result {
            Ok(obj) => {
                debug!("Fetched {}/{} from namespace {}", kind, name, namespace);
                serde_json::to_value(&obj).map_err(|e| Error::Serialization(e.to_string()))
            }
            Err(kube::Error::Api(e)) if e.code == 404 => Err(Error::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(Self::connection_error("get", kind, namespace, name, e)),
        }
    }

    async fn delete(&self, kind: ChaosKind, namespace: &str, name: &str) -> Result<()> {
        let api = self.api(kind, namespace);

        let result = self
            .retry
            .run(|| {
                let api = api.clone();
                let name = name.to_string();
                async move { api.delete(&name, &DeleteParams::default()).await }
            })
            .await;

        match result {
            Ok(_) => {
                info!("Deleted {}/{} from namespace {}", kind, name, namespace);
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 404 => {
                warn!(
                    "{}/{} not found in namespace {}, possibly already deleted",
                    kind, name, namespace
                );
                Ok(())
            }
            Err(e) => Err(Self::connection_error("delete", kind, namespace, name, e)),
        }
    }

    async fn list(
        &self,
        kind: ChaosKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Value>> {
        let api = self.api(kind, namespace);

        let params = if label_selector.is_empty() {
            ListParams::default()
        } else {
            ListParams::default().labels(label_selector)
        };

        let result = self
            .retry
            .run(|| {
                let api = api.clone();
                let params = params.clone();
                async move { api.list(&params).await }
            })
            .await;

        match result {
            Ok(list) => {
                debug!(
                    "Listed {} {} resources in namespace {}",
                    list.items.len(),
                    kind,
                    namespace
                );
                list.items
                    .iter()
                    .map(|obj| {
                        serde_json::to_value(obj).map_err(|e| Error::Serialization(e.to_string()))
                    })
                    .collect()
            }
            Err(e) => Err(Self::connection_error("list", kind, namespace, "*", e)),
        }
    }
}
