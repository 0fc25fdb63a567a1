//! Environment Gate Module
//!
//! Gates a plugin's activation and initialization on the versions of the
//! runtime, host application and e-commerce platform it runs on.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use envgate::gate::{EnvironmentSnapshot, Loader, LoaderBuilder, SimulatedHost, SimulatedRuntime};
//!
//! let host = Arc::new(SimulatedHost::new(EnvironmentSnapshot::new("7.4", "5.8", Some("4.5"))));
//! let runtime = Arc::new(SimulatedRuntime::new());
//!
//! let loader = Loader::get_instance(|| LoaderBuilder::new(host.clone(), runtime.clone()));
//! assert!(loader.plugins_compatible());
//! ```

pub mod version;
pub mod error;
pub mod compatibility;
pub mod notice;
pub mod manifest;
pub mod host;
pub mod loader;
pub mod simulation;
pub mod dispatch;

#[cfg(test)]
pub mod tests;

pub use version::{compare, Version};
pub use error::{GateError, GateResult};
pub use compatibility::{
    CompatibilityChecker, CompatibilityResult, Component, EnvironmentSnapshot, RequirementOutcome,
    VersionRequirement,
};
pub use notice::{Notice, NoticeQueue, Severity};
pub use manifest::{FrameworkClass, PluginManifest};
pub use host::{Hook, Host, LifecycleHandler, PluginRuntime};
pub use loader::{GateState, Loader, LoaderBuilder};
pub use simulation::{SimulatedHost, SimulatedRuntime};
pub use dispatch::{HookDispatcher, RequestOutcome};
