//! In-Memory Host Simulation
//!
//! A host and plugin runtime that keep their state in memory. The CLI uses
//! them to replay request lifecycles; tests use them to observe exactly what
//! the loader asked of its collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::gate::compatibility::EnvironmentSnapshot;
use crate::gate::error::{GateError, GateResult};
use crate::gate::host::{Hook, Host, PluginRuntime};

/// Host application kept entirely in memory
pub struct SimulatedHost {
    environment: RwLock<EnvironmentSnapshot>,
    hooks: Mutex<Vec<Hook>>,
    active_plugins: Mutex<HashSet<String>>,
    activation_notice: AtomicBool,
    diagnostics: Mutex<Vec<String>>,
    deactivations: AtomicUsize,
    admin_base: String,
}

impl SimulatedHost {
    pub fn new(environment: EnvironmentSnapshot) -> Self {
        Self {
            environment: RwLock::new(environment),
            hooks: Mutex::new(Vec::new()),
            active_plugins: Mutex::new(HashSet::new()),
            activation_notice: AtomicBool::new(false),
            diagnostics: Mutex::new(Vec::new()),
            deactivations: AtomicUsize::new(0),
            admin_base: "https://example.test/wp-admin/".to_string(),
        }
    }

    pub fn with_admin_base(mut self, admin_base: &str) -> Self {
        self.admin_base = admin_base.to_string();
        self
    }

    /// Replace the environment, e.g. after a runtime downgrade
    pub fn set_environment(&self, environment: EnvironmentSnapshot) {
        debug!("Simulated environment changed to {:?}", environment);
        *self.environment.write() = environment;
    }

    /// Mark a plugin active and raise the host's "activated" notice
    pub fn activate_plugin(&self, basename: &str) {
        self.active_plugins.lock().insert(basename.to_string());
        self.activation_notice.store(true, Ordering::Release);
        info!("Plugin {} activated", basename);
    }

    pub fn registered_hooks(&self) -> Vec<Hook> {
        self.hooks.lock().clone()
    }

    pub fn is_hook_registered(&self, hook: Hook) -> bool {
        self.hooks.lock().contains(&hook)
    }

    /// Registered notice rendering hooks, lowest priority first
    pub fn notice_render_priorities(&self) -> Vec<i32> {
        let mut priorities: Vec<i32> = self.hooks
            .lock()
            .iter()
            .filter_map(|hook| match hook {
                Hook::NoticeRender { priority } => Some(*priority),
                _ => None,
            })
            .collect();
        priorities.sort_unstable();
        priorities
    }

    /// Whether the host would still announce a successful activation
    pub fn shows_activation_notice(&self) -> bool {
        self.activation_notice.load(Ordering::Acquire)
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().clone()
    }

    pub fn deactivation_count(&self) -> usize {
        self.deactivations.load(Ordering::Acquire)
    }
}

impl Host for SimulatedHost {
    fn environment(&self) -> EnvironmentSnapshot {
        self.environment.read().clone()
    }

    fn register_hook(&self, hook: Hook) {
        debug!("Hook registered: {}", hook);
        let mut hooks = self.hooks.lock();
        if !hooks.contains(&hook) {
            hooks.push(hook);
        }
    }

    fn is_plugin_active(&self, basename: &str) -> bool {
        self.active_plugins.lock().contains(basename)
    }

    fn deactivate_plugin(&self, basename: &str) {
        self.active_plugins.lock().remove(basename);
        self.deactivations.fetch_add(1, Ordering::AcqRel);
        info!("Plugin {} deactivated", basename);
    }

    fn suppress_activation_notice(&self) {
        self.activation_notice.store(false, Ordering::Release);
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/{}", self.admin_base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn doing_it_wrong(&self, function: &str, message: &str, version: &str) {
        let diagnostic = format!("{} was called incorrectly. {} (since {})", function, message, version);
        warn!("{}", diagnostic);
        self.diagnostics.lock().push(diagnostic);
    }
}

/// Plugin runtime that records what was loaded and started
#[derive(Default)]
pub struct SimulatedRuntime {
    classes: Mutex<HashSet<String>>,
    loaded_files: Mutex<Vec<String>>,
    missing_files: Mutex<HashSet<String>>,
    entry_point_calls: AtomicUsize,
}

impl SimulatedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another plugin already loaded a class
    pub fn with_preloaded_class(self, class_name: &str) -> Self {
        self.classes.lock().insert(class_name.to_string());
        self
    }

    /// Make loading a file fail
    pub fn with_missing_file(self, path: &str) -> Self {
        self.missing_files.lock().insert(path.to_string());
        self
    }

    pub fn loaded_files(&self) -> Vec<String> {
        self.loaded_files.lock().clone()
    }

    pub fn entry_point_calls(&self) -> usize {
        self.entry_point_calls.load(Ordering::Acquire)
    }

    fn require(&self, path: &str) -> GateResult<()> {
        if self.missing_files.lock().contains(path) {
            return Err(GateError::collaborator(format!("Failed opening required '{}'", path)));
        }
        self.loaded_files.lock().push(path.to_string());
        Ok(())
    }
}

impl PluginRuntime for SimulatedRuntime {
    fn class_exists(&self, class_name: &str) -> bool {
        self.classes.lock().contains(class_name)
    }

    fn load_class(&self, class_name: &str, path: &str) -> GateResult<()> {
        self.require(path)?;
        self.classes.lock().insert(class_name.to_string());
        debug!("Loaded class {} from {}", class_name, path);
        Ok(())
    }

    fn load_file(&self, path: &str) -> GateResult<()> {
        self.require(path)
    }

    fn invoke_entry_point(&self) -> GateResult<()> {
        self.entry_point_calls.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
