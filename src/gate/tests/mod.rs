//! Gate Tests
//!
//! Loader and dispatch tests against the in-memory host and runtime.

use std::sync::Arc;
use crate::gate::compatibility::EnvironmentSnapshot;
use crate::gate::loader::{Loader, LoaderBuilder};
use crate::gate::manifest::PluginManifest;
use crate::gate::simulation::{SimulatedHost, SimulatedRuntime};



/// Fresh loader bound to its own host and runtime
pub struct Fixture {
    pub host: Arc<SimulatedHost>,
    pub runtime: Arc<SimulatedRuntime>,
    pub loader: Loader,
}

impl Fixture {
    pub fn new(runtime: &str, host: &str, platform: Option<&str>) -> Self {
        Self::with_runtime(EnvironmentSnapshot::new(runtime, host, platform), SimulatedRuntime::new())
    }

    pub fn with_runtime(environment: EnvironmentSnapshot, runtime: SimulatedRuntime) -> Self {
        let host = Arc::new(SimulatedHost::new(environment));
        let runtime = Arc::new(runtime);
        let loader = LoaderBuilder::new(host.clone(), runtime.clone())
            .manifest(PluginManifest::default())
            .build();

        Self { host, runtime, loader }
    }

    pub fn basename(&self) -> String {
        self.loader.manifest().basename.clone()
    }
}
