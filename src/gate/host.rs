//! Host Interfaces
//!
//! The loader never calls into the host application directly. It sees the
//! host through [`Host`], the gated plugin through [`PluginRuntime`], and is
//! driven by the host through [`LifecycleHandler`].

use std::fmt;
use crate::gate::compatibility::EnvironmentSnapshot;
use crate::gate::error::GateResult;

/// Host lifecycle events the loader can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// The administrator is activating the plugin
    Activation,
    /// Start of every admin request
    RequestInit,
    /// Admin notices are being printed; lower priority runs first
    NoticeRender { priority: i32 },
    /// All plugins have been loaded
    PluginsLoaded,
    /// The host collects extra plugin header names
    PluginHeaders,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Activation => write!(f, "activation"),
            Hook::RequestInit => write!(f, "request_init"),
            Hook::NoticeRender { priority } => write!(f, "notice_render@{}", priority),
            Hook::PluginsLoaded => write!(f, "plugins_loaded"),
            Hook::PluginHeaders => write!(f, "plugin_headers"),
        }
    }
}

/// Services the host application offers to the loader
pub trait Host: Send + Sync {
    /// Current versions of the runtime, host and platform
    fn environment(&self) -> EnvironmentSnapshot;

    /// Subscribe the loader to a lifecycle event
    fn register_hook(&self, hook: Hook);

    fn is_plugin_active(&self, basename: &str) -> bool;

    fn deactivate_plugin(&self, basename: &str);

    /// Stop the host from announcing a successful activation
    fn suppress_activation_notice(&self);

    /// Absolute URL of an admin page
    fn admin_url(&self, path: &str) -> String;

    /// Report API misuse to developers
    fn doing_it_wrong(&self, function: &str, message: &str, version: &str);
}

/// The gated plugin's code, loaded only when the environment allows it
pub trait PluginRuntime: Send + Sync {
    fn class_exists(&self, class_name: &str) -> bool;

    /// Load the file defining `class_name`
    fn load_class(&self, class_name: &str, path: &str) -> GateResult<()>;

    fn load_file(&self, path: &str) -> GateResult<()>;

    /// Start the plugin's real functionality
    fn invoke_entry_point(&self) -> GateResult<()>;
}

/// Callbacks the host invokes for registered hooks
pub trait LifecycleHandler {
    /// An `Err` aborts the activation request
    fn on_activation(&self) -> GateResult<()>;

    fn on_request_init(&self);

    /// Rendered notice markup
    fn on_notice_render(&self) -> String;

    fn on_plugins_loaded(&self) -> GateResult<()>;

    fn on_plugin_headers(&self, headers: Vec<String>) -> Vec<String>;
}
