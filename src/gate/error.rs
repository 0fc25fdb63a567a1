//! Gate Error Types
//!
//! Errors raised while gating plugin activation on the hosting environment.

use thiserror::Error;

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;

/// Error types for environment gating and bootstrap
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// Runtime below minimum while the host was activating the plugin
    #[error("{plugin} could not be activated. {message}")]
    FatalActivation { plugin: String, message: String, minimum: String, detected: String },

    /// Runtime fell below minimum after the plugin had been activated
    #[error("{plugin} has been deactivated. {message}")]
    DriftDeactivation { plugin: String, message: String },

    /// Host application or platform below its advisory minimum
    #[error("{component} version {detected} is below the required {minimum}")]
    AdvisoryIncompatibility { component: String, minimum: String, detected: String },

    /// Attempt to produce a second loader instance
    #[error("You cannot create a second instance of {type_name}")]
    SingletonMisuse { type_name: String },

    /// Framework or entry point failed to load
    #[error("Plugin collaborator error: {message}")]
    Collaborator { message: String },

    /// Invalid manifest or requirement configuration
    #[error("Gate configuration error: {message}")]
    Configuration { message: String },
}

impl GateError {
    /// Create a fatal activation error
    pub fn fatal_activation<S: Into<String>>(plugin: S, minimum: S, detected: S) -> Self {
        let minimum = minimum.into();
        let detected = detected.into();
        Self::FatalActivation {
            plugin: plugin.into(),
            message: runtime_message(&minimum, &detected),
            minimum,
            detected,
        }
    }

    /// Create a drift deactivation error
    pub fn drift_deactivation<S: Into<String>>(plugin: S, minimum: &str, detected: &str) -> Self {
        Self::DriftDeactivation {
            plugin: plugin.into(),
            message: runtime_message(minimum, detected),
        }
    }

    /// Create an advisory incompatibility error
    pub fn advisory<S: Into<String>>(component: S, minimum: S, detected: S) -> Self {
        Self::AdvisoryIncompatibility {
            component: component.into(),
            minimum: minimum.into(),
            detected: detected.into(),
        }
    }

    /// Create a singleton misuse error
    pub fn singleton_misuse<S: Into<String>>(type_name: S) -> Self {
        Self::SingletonMisuse { type_name: type_name.into() }
    }

    /// Create a collaborator error
    pub fn collaborator<S: Into<String>>(message: S) -> Self {
        Self::Collaborator { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Errors that must stop the current host request
    pub fn is_fatal(&self) -> bool {
        matches!(self, GateError::FatalActivation { .. })
    }

    /// Errors that only surface as a notice
    pub fn is_advisory(&self) -> bool {
        matches!(self,
            GateError::AdvisoryIncompatibility { .. } |
            GateError::DriftDeactivation { .. }
        )
    }
}

/// Explanation shown whenever the runtime is too old
pub fn runtime_message(minimum: &str, detected: &str) -> String {
    format!(
        "The minimum runtime version required for this plugin is {}. You are running {}.",
        minimum, detected
    )
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::collaborator(format!("IO error: {}", err))
    }
}
