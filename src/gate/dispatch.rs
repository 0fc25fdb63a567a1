//! Host Request Dispatch
//!
//! Replays host requests through the hooks a handler registered. Within a
//! request the order is fixed: activation check, request init (environment
//! check and notice population), initialization, notice rendering.

use log::debug;

use crate::gate::error::{GateError, GateResult};
use crate::gate::host::{Hook, Host, LifecycleHandler};
use crate::gate::simulation::SimulatedHost;

/// What a single request produced
#[derive(Debug, Default)]
pub struct RequestOutcome {
    /// Whether the plugin was loaded for this request at all
    pub plugin_loaded: bool,
    pub notices_html: String,
    pub extra_headers: Vec<String>,
    /// Failures reported by handlers that did not abort the request
    pub errors: Vec<GateError>,
}

/// Drives a handler through the simulated host's lifecycle
pub struct HookDispatcher<'a> {
    host: &'a SimulatedHost,
    basename: String,
}

impl<'a> HookDispatcher<'a> {
    pub fn new(host: &'a SimulatedHost, basename: &str) -> Self {
        Self {
            host,
            basename: basename.to_string(),
        }
    }

    /// Activate the plugin, then serve the admin page that follows.
    ///
    /// A fatal activation error is returned immediately; no other hook runs
    /// and the plugin is never marked active.
    pub fn run_activation_request(&self, handler: &dyn LifecycleHandler) -> GateResult<RequestOutcome> {
        if self.host.is_hook_registered(Hook::Activation) {
            handler.on_activation()?;
        }

        self.host.activate_plugin(&self.basename);
        Ok(self.run_admin_request(handler))
    }

    /// Serve one admin request
    pub fn run_admin_request(&self, handler: &dyn LifecycleHandler) -> RequestOutcome {
        let mut outcome = RequestOutcome::default();

        if !self.host.is_plugin_active(&self.basename) {
            debug!("Plugin {} inactive, not loaded for this request", self.basename);
            return outcome;
        }
        outcome.plugin_loaded = true;

        if self.host.is_hook_registered(Hook::RequestInit) {
            handler.on_request_init();
        }

        if self.host.is_hook_registered(Hook::PluginsLoaded) && self.host.is_plugin_active(&self.basename) {
            if let Err(e) = handler.on_plugins_loaded() {
                outcome.errors.push(e);
            }
        }

        if !self.host.notice_render_priorities().is_empty() {
            outcome.notices_html = handler.on_notice_render();
        }

        if self.host.is_hook_registered(Hook::PluginHeaders) {
            outcome.extra_headers = handler.on_plugin_headers(Vec::new());
        }

        outcome
    }
}
