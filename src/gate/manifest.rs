//! Plugin Manifest
//!
//! Immutable identity and requirements of the gated plugin. Defaults are
//! generated at build time from `package.metadata.envgate` in Cargo.toml.

use crate::gate::compatibility::{Component, VersionRequirement};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/requirements.rs"));
}

pub use generated::{
    FRAMEWORK_VERSION, MINIMUM_HOST_VERSION, MINIMUM_PLATFORM_VERSION, MINIMUM_RUNTIME_VERSION,
};

/// Framework class preloaded before the plugin entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkClass {
    /// Class name relative to the versioned framework namespace
    pub name: String,
    /// File that defines the class
    pub path: String,
}

impl FrameworkClass {
    pub fn new(name: &str, path: &str) -> Self {
        Self { name: name.to_string(), path: path.to_string() }
    }
}

/// Everything the loader needs to know about the plugin it gates
#[derive(Debug, Clone)]
pub struct PluginManifest {
    pub name: String,
    pub basename: String,
    pub version: String,
    pub documentation_uri: String,

    pub runtime_label: String,
    pub host_label: String,
    pub platform_label: String,

    pub minimum_runtime_version: String,
    pub minimum_host_version: String,
    pub minimum_platform_version: String,

    pub framework_version: String,
    pub framework_namespace: String,
    pub framework_classes: Vec<FrameworkClass>,
    /// Files loaded after the framework and before the entry point
    pub autoload_files: Vec<String>,

    /// Admin page offering host and platform updates
    pub update_path: String,
    /// Download location prefix for platform releases
    pub platform_download_base: String,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: "Authorize.Net Emulation for WooCommerce".to_string(),
            basename: "authorize-net-emulation-for-woocommerce/authorize-net-emulation-for-woocommerce.php".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            documentation_uri: "https://docs.woocommerce.com/document/authorize-net/#emulation-mode".to_string(),

            runtime_label: "PHP".to_string(),
            host_label: "WordPress".to_string(),
            platform_label: "WooCommerce".to_string(),

            minimum_runtime_version: MINIMUM_RUNTIME_VERSION.to_string(),
            minimum_host_version: MINIMUM_HOST_VERSION.to_string(),
            minimum_platform_version: MINIMUM_PLATFORM_VERSION.to_string(),

            framework_version: FRAMEWORK_VERSION.to_string(),
            framework_namespace: "SkyVerge\\WooCommerce\\PluginFramework".to_string(),
            framework_classes: vec![
                FrameworkClass::new(
                    "SV_WC_Plugin",
                    "vendor/skyverge/wc-plugin-framework/woocommerce/class-sv-wc-plugin.php",
                ),
                FrameworkClass::new(
                    "SV_WC_Payment_Gateway_Plugin",
                    "vendor/skyverge/wc-plugin-framework/woocommerce/payment-gateway/class-sv-wc-payment-gateway-plugin.php",
                ),
            ],
            autoload_files: vec![
                "vendor/autoload.php".to_string(),
                "src/Functions.php".to_string(),
            ],

            update_path: "update-core.php".to_string(),
            platform_download_base: "https://downloads.wordpress.org/plugin/woocommerce".to_string(),
        }
    }
}

impl PluginManifest {
    /// Requirements in evaluation order; empty minimums are disabled
    pub fn requirements(&self) -> Vec<VersionRequirement> {
        Component::ALL
            .iter()
            .map(|&component| VersionRequirement::new(component, Some(self.minimum(component))))
            .collect()
    }

    /// Configured minimum for a component
    pub fn minimum(&self, component: Component) -> &str {
        match component {
            Component::Runtime => &self.minimum_runtime_version,
            Component::Host => &self.minimum_host_version,
            Component::Platform => &self.minimum_platform_version,
        }
    }

    /// Override a component's minimum
    pub fn set_minimum(&mut self, component: Component, minimum: &str) {
        let target = match component {
            Component::Runtime => &mut self.minimum_runtime_version,
            Component::Host => &mut self.minimum_host_version,
            Component::Platform => &mut self.minimum_platform_version,
        };
        *target = minimum.trim().to_string();
    }

    /// Human-readable component name
    pub fn label(&self, component: Component) -> &str {
        match component {
            Component::Runtime => &self.runtime_label,
            Component::Host => &self.host_label,
            Component::Platform => &self.platform_label,
        }
    }

    /// Framework version in namespace form, e.g. `v5_10_4`
    pub fn framework_version_namespace(&self) -> String {
        format!("v{}", self.framework_version.replace('.', "_"))
    }

    /// Fully qualified name of a framework class
    pub fn qualified_class_name(&self, class_name: &str) -> String {
        format!(
            "\\{}\\{}\\{}",
            self.framework_namespace,
            self.framework_version_namespace(),
            class_name
        )
    }

    /// Download URL of the minimum platform release
    pub fn platform_download_url(&self) -> String {
        format!(
            "{}.{}.zip",
            self.platform_download_base.trim_end_matches('/'),
            self.minimum_platform_version
        )
    }
}
