//! Environment-Gated Plugin Loader
//!
//! A single process-wide [`Loader`] guards the plugin. It registers itself on
//! the host's lifecycle hooks, refuses activation on an unsupported runtime,
//! deactivates the plugin if the runtime later drifts below the minimum,
//! queues advisory notices for an outdated host or platform, and starts the
//! plugin's entry point at most once.
//!
//! `Loader` deliberately implements neither `Clone` nor `Deserialize`, so a
//! second instance cannot be produced from the first:
//!
//! ```compile_fail
//! fn assert_clone<T: Clone>() {}
//! assert_clone::<envgate::gate::Loader>();
//! ```
//!
//! ```compile_fail
//! fn assert_deserialize<T: serde::de::DeserializeOwned>() {}
//! assert_deserialize::<envgate::gate::Loader>();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::gate::compatibility::{CompatibilityChecker, CompatibilityResult, Component};
use crate::gate::error::{runtime_message, GateError, GateResult};
use crate::gate::host::{Hook, Host, LifecycleHandler, PluginRuntime};
use crate::gate::manifest::PluginManifest;
use crate::gate::notice::{escape_html, Notice, NoticeQueue, Severity};

/// Notice key used when the runtime drifts below the minimum
pub const BAD_ENVIRONMENT_NOTICE: &str = "bad_environment";
pub const UPDATE_HOST_NOTICE: &str = "update_host";
pub const UPDATE_PLATFORM_NOTICE: &str = "update_platform";

/// Extra plugin header advertised to the host
pub const DOCUMENTATION_HEADER: &str = "Documentation URI";

/// Priority of the notice rendering hook
pub const NOTICE_RENDER_PRIORITY: i32 = 15;

static INSTANCE: OnceLock<Loader> = OnceLock::new();

/// Activation gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Uninitialized,
    Checked { compatible: bool },
    Activated,
    Deactivated,
}

/// Collaborators needed to construct the loader
pub struct LoaderBuilder {
    manifest: PluginManifest,
    host: Arc<dyn Host>,
    runtime: Arc<dyn PluginRuntime>,
}

impl LoaderBuilder {
    pub fn new(host: Arc<dyn Host>, runtime: Arc<dyn PluginRuntime>) -> Self {
        Self {
            manifest: PluginManifest::default(),
            host,
            runtime,
        }
    }

    pub fn manifest(mut self, manifest: PluginManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Construct a loader and register its hooks with the host.
    ///
    /// Crate-private: outside callers go through [`Loader::get_instance`].
    pub(crate) fn build(self) -> Loader {
        let checker = CompatibilityChecker::new(self.manifest.requirements());
        let loader = Loader {
            manifest: self.manifest,
            checker,
            host: self.host,
            runtime: self.runtime,
            state: Mutex::new(GateState::Uninitialized),
            notices: Mutex::new(NoticeQueue::new()),
            initialized: AtomicBool::new(false),
        };
        loader.register_hooks();
        loader
    }
}

/// The process-wide plugin loader
pub struct Loader {
    manifest: PluginManifest,
    checker: CompatibilityChecker,
    host: Arc<dyn Host>,
    runtime: Arc<dyn PluginRuntime>,
    state: Mutex<GateState>,
    notices: Mutex<NoticeQueue>,
    initialized: AtomicBool,
}

impl Loader {
    /// Get the loader, constructing it from `factory` on first access
    pub fn get_instance<F>(factory: F) -> &'static Loader
    where
        F: FnOnce() -> LoaderBuilder,
    {
        INSTANCE.get_or_init(|| factory().build())
    }

    /// Install the loader explicitly. Fails if one already exists.
    pub fn install(builder: LoaderBuilder) -> GateResult<&'static Loader> {
        let host = Arc::clone(&builder.host);
        let version = builder.manifest.version.clone();
        let mut created = false;

        let instance = INSTANCE.get_or_init(|| {
            created = true;
            builder.build()
        });

        if created {
            return Ok(instance);
        }

        let err = GateError::singleton_misuse(std::any::type_name::<Loader>());
        error!("{}", err);
        host.doing_it_wrong("Loader::install", &err.to_string(), &version);
        Err(err)
    }

    /// The loader, if it has been constructed
    pub fn instance() -> Option<&'static Loader> {
        INSTANCE.get()
    }

    fn register_hooks(&self) {
        self.host.register_hook(Hook::Activation);
        self.host.register_hook(Hook::RequestInit);
        self.host.register_hook(Hook::NoticeRender { priority: NOTICE_RENDER_PRIORITY });
        self.host.register_hook(Hook::PluginHeaders);

        let compatible = self.is_environment_compatible();
        *self.state.lock() = GateState::Checked { compatible };

        if compatible {
            self.host.register_hook(Hook::PluginsLoaded);
        } else {
            debug!("Runtime below {}, initialization not scheduled", self.manifest.minimum_runtime_version);
        }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn state(&self) -> GateState {
        *self.state.lock()
    }

    /// Whether the entry point has been claimed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Snapshot of the pending notices
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().notices().to_vec()
    }

    /// Full compatibility result for the current environment
    pub fn compatibility(&self) -> CompatibilityResult {
        self.checker.check(&self.host.environment())
    }

    /// Hard runtime requirement
    pub fn is_environment_compatible(&self) -> bool {
        self.checker.is_runtime_compatible(&self.host.environment())
    }

    /// Host application and platform requirements; gates initialization
    pub fn plugins_compatible(&self) -> bool {
        let environment = self.host.environment();
        self.checker.is_host_compatible(&environment)
            && self.checker.is_platform_compatible(&environment)
    }

    /// Explanation of an unsupported runtime
    pub fn environment_message(&self) -> String {
        let environment = self.host.environment();
        runtime_message(
            &self.manifest.minimum_runtime_version,
            &environment.display_version(Component::Runtime),
        )
    }

    /// Refuse activation on an unsupported runtime
    pub fn do_activation_check(&self) -> GateResult<()> {
        let environment = self.host.environment();
        let compatible = self.checker.is_runtime_compatible(&environment);
        *self.state.lock() = GateState::Checked { compatible };

        if !compatible {
            self.deactivate_plugin();
            *self.state.lock() = GateState::Deactivated;

            let err = GateError::fatal_activation(
                self.manifest.name.clone(),
                self.manifest.minimum_runtime_version.clone(),
                environment.display_version(Component::Runtime),
            );
            error!("{}", err);
            return Err(err);
        }

        *self.state.lock() = GateState::Activated;
        info!("{} activated", self.manifest.name);
        Ok(())
    }

    /// Deactivate if the runtime drifted below the minimum after activation
    pub fn check_environment(&self) {
        let environment = self.host.environment();
        if !self.host.is_plugin_active(&self.manifest.basename) {
            return;
        }

        // activated in an earlier process
        if self.checker.is_runtime_compatible(&environment) {
            *self.state.lock() = GateState::Activated;
            return;
        }

        self.deactivate_plugin();
        *self.state.lock() = GateState::Deactivated;

        let err = GateError::drift_deactivation(
            self.manifest.name.as_str(),
            &self.manifest.minimum_runtime_version,
            &environment.display_version(Component::Runtime),
        );
        warn!("{}", err);
        self.add_admin_notice(BAD_ENVIRONMENT_NOTICE, Severity::Error, err.to_string());
    }

    /// Queue advisory notices for an outdated host or platform
    pub fn add_plugin_notices(&self) {
        let environment = self.host.environment();
        let update_url = escape_html(&self.host.admin_url(&self.manifest.update_path));

        if !self.checker.is_host_compatible(&environment) {
            warn!("{}", self.advisory(Component::Host, &environment.display_version(Component::Host)));

            let host = &self.manifest.host_label;
            self.add_admin_notice(UPDATE_HOST_NOTICE, Severity::Error, format!(
                "{} requires {} version {} or higher. Please <a href=\"{}\">update {} \u{bb}</a>",
                self.manifest.name,
                host,
                self.manifest.minimum_host_version,
                update_url,
                host,
            ));
        }

        if !self.checker.is_platform_compatible(&environment) {
            warn!("{}", self.advisory(Component::Platform, &environment.display_version(Component::Platform)));

            let platform = &self.manifest.platform_label;
            self.add_admin_notice(UPDATE_PLATFORM_NOTICE, Severity::Error, format!(
                "{} requires {} version {} or higher. Please <a href=\"{}\">update {}</a> to the latest version, or <a href=\"{}\">download the minimum required version \u{bb}</a>",
                self.manifest.name,
                platform,
                self.manifest.minimum_platform_version,
                update_url,
                platform,
                escape_html(&self.manifest.platform_download_url()),
            ));
        }
    }

    fn advisory(&self, component: Component, detected: &str) -> GateError {
        GateError::advisory(
            self.manifest.label(component),
            self.manifest.minimum(component),
            detected,
        )
    }

    /// Start the plugin. Runs the entry point at most once per process.
    pub fn initialize(&self) -> GateResult<()> {
        if !self.plugins_compatible() {
            debug!("{} requirements not met, skipping initialization", self.manifest.name);
            return Ok(());
        }

        if self.initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{} already initialized", self.manifest.name);
            return Ok(());
        }

        self.load_framework()?;

        for file in &self.manifest.autoload_files {
            self.runtime.load_file(file)?;
        }

        self.runtime.invoke_entry_point()?;
        info!("{} {} initialized", self.manifest.name, self.manifest.version);
        Ok(())
    }

    /// Load framework classes not already provided by another plugin
    fn load_framework(&self) -> GateResult<()> {
        for class in &self.manifest.framework_classes {
            let qualified = self.manifest.qualified_class_name(&class.name);

            if self.runtime.class_exists(&qualified) {
                debug!("Framework class {} already loaded", qualified);
                continue;
            }

            self.runtime.load_class(&qualified, &class.path)?;
        }
        Ok(())
    }

    fn deactivate_plugin(&self) {
        self.host.deactivate_plugin(&self.manifest.basename);
        self.host.suppress_activation_notice();
    }

    fn add_admin_notice(&self, key: &str, severity: Severity, message: String) {
        self.notices.lock().enqueue(key, severity, message);
    }

    /// Render pending notices
    pub fn output_admin_notices(&self) -> String {
        self.notices.lock().render()
    }

    pub fn add_documentation_header(&self, mut headers: Vec<String>) -> Vec<String> {
        headers.push(DOCUMENTATION_HEADER.to_string());
        headers
    }
}

impl LifecycleHandler for Loader {
    fn on_activation(&self) -> GateResult<()> {
        self.do_activation_check()
    }

    fn on_request_init(&self) {
        // notices are request scoped
        self.notices.lock().clear();
        self.check_environment();
        self.add_plugin_notices();
    }

    fn on_notice_render(&self) -> String {
        self.output_admin_notices()
    }

    fn on_plugins_loaded(&self) -> GateResult<()> {
        self.initialize().map_err(|e| {
            error!("{} failed to initialize: {}", self.manifest.name, e);
            e
        })
    }

    fn on_plugin_headers(&self, headers: Vec<String>) -> Vec<String> {
        self.add_documentation_header(headers)
    }
}
