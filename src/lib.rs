//! Chaos Mesh SDK
//!
//! A typed client library for driving [Chaos Mesh](https://chaos-mesh.org)
//! experiments on Kubernetes:
//!
//! - describe a fault (pod kill, network delay, partition, ...) as a
//!   validated [`ChaosExperiment`]
//! - compile it into the Chaos Mesh CRD document
//! - submit it through a retrying API client
//! - poll cluster status until the fault is confirmed injected or removed
//!
//! ```no_run
//! use chaosmesh_sdk::{
//!     ChaosClient, ChaosConfig, ChaosExperiment, ChaosManager, ChaosSelector, WaitOptions,
//! };
//!
//! # async fn run() -> chaosmesh_sdk::Result<()> {
//! let config = ChaosConfig::load();
//! let client = ChaosClient::new(&config).await?;
//! let manager = ChaosManager::new(client, config);
//!
//! let selector = ChaosSelector::from_labels([("app", "web")])?;
//! let experiment = ChaosExperiment::pod_kill(selector, None).build()?;
//!
//! manager.apply(&experiment).await?;
//! manager.wait_for_injection(&experiment, &WaitOptions::default()).await?;
//! manager.delete(&experiment).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod experiment;
pub mod manager;
pub mod retry;
pub mod selector;
pub mod util;

pub use client::{ChaosClient, ChaosResourceApi};
pub use config::ChaosConfig;
pub use error::{Error, Result};
pub use experiment::{
    BandwidthParams, ChaosExperiment, ChaosKind, ChaosMode, CorruptParams, DelayParams,
    DuplicateParams, ExperimentBuilder, Fault, LossParams, NetworkAction, NetworkDirection,
    NetworkFault, PartitionParams, PodAction, PodFault, ReorderParams, SchedulerSpec,
};
pub use manager::{ChaosManager, ExperimentStatus, StatusCondition, WaitOptions};
pub use retry::RetryPolicy;
pub use selector::{ChaosSelector, ExpressionSelector, SelectorBuilder};
