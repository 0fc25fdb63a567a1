//! Environment Compatibility Checker
//!
//! Evaluates the runtime, host application and platform versions of an
//! environment snapshot against configured minimums. Results are derived on
//! every call; the environment may change between requests.

use std::fmt;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::gate::version;

/// The environment components a plugin can place requirements on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Language runtime executing the host
    Runtime,
    /// Host application
    Host,
    /// E-commerce platform the plugin extends
    Platform,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Runtime, Component::Host, Component::Platform];

    /// Configuration key for this component
    pub fn key(&self) -> &'static str {
        match self {
            Component::Runtime => "runtime",
            Component::Host => "host",
            Component::Platform => "platform",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runtime" => Ok(Component::Runtime),
            "host" => Ok(Component::Host),
            "platform" => Ok(Component::Platform),
            _ => Err(format!("Invalid component: {}. Valid options: runtime, host, platform", s)),
        }
    }
}

/// Minimum version for one component; no minimum means always satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    pub component: Component,
    pub minimum: Option<String>,
}

impl VersionRequirement {
    pub fn new(component: Component, minimum: Option<&str>) -> Self {
        let minimum = minimum
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        Self { component, minimum }
    }

    /// Whether the requirement holds for the detected version
    pub fn is_satisfied_by(&self, detected: Option<&str>) -> bool {
        match &self.minimum {
            Some(minimum) => version::compare(detected, minimum),
            None => true,
        }
    }
}

/// Versions read from the hosting environment.
///
/// `platform_version` is `None` when the platform does not define its
/// version at all, which usually means it is not installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub runtime_version: Option<String>,
    pub host_version: Option<String>,
    pub platform_version: Option<String>,
}

impl EnvironmentSnapshot {
    pub fn new(runtime: &str, host: &str, platform: Option<&str>) -> Self {
        Self {
            runtime_version: Some(runtime.to_string()),
            host_version: Some(host.to_string()),
            platform_version: platform.map(str::to_string),
        }
    }

    /// Detected version for a component
    pub fn version_of(&self, component: Component) -> Option<&str> {
        match component {
            Component::Runtime => self.runtime_version.as_deref(),
            Component::Host => self.host_version.as_deref(),
            Component::Platform => self.platform_version.as_deref(),
        }
    }

    /// Detected version for display, `unknown` when absent
    pub fn display_version(&self, component: Component) -> String {
        self.version_of(component)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Outcome of evaluating one requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementOutcome {
    pub component: Component,
    pub minimum: Option<String>,
    pub detected: Option<String>,
    pub satisfied: bool,
}

/// Per-requirement outcomes plus their conjunction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    pub outcomes: Vec<RequirementOutcome>,
    pub overall: bool,
}

impl CompatibilityResult {
    /// Outcome for a component, if a requirement was evaluated for it
    pub fn outcome(&self, component: Component) -> Option<&RequirementOutcome> {
        self.outcomes.iter().find(|o| o.component == component)
    }

    /// Whether the component's requirement held; unknown components pass
    pub fn is_satisfied(&self, component: Component) -> bool {
        self.outcome(component).map(|o| o.satisfied).unwrap_or(true)
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &RequirementOutcome> {
        self.outcomes.iter().filter(|o| !o.satisfied)
    }
}

/// Evaluate requirements against an environment snapshot
pub fn check(environment: &EnvironmentSnapshot, requirements: &[VersionRequirement]) -> CompatibilityResult {
    let outcomes: Vec<RequirementOutcome> = requirements
        .iter()
        .map(|requirement| {
            let detected = environment.version_of(requirement.component);
            let satisfied = requirement.is_satisfied_by(detected);

            debug!(
                "Compatibility check {}: minimum={:?} detected={:?} satisfied={}",
                requirement.component, requirement.minimum, detected, satisfied
            );

            RequirementOutcome {
                component: requirement.component,
                minimum: requirement.minimum.clone(),
                detected: detected.map(str::to_string),
                satisfied,
            }
        })
        .collect();

    let overall = outcomes.iter().all(|o| o.satisfied);
    CompatibilityResult { outcomes, overall }
}

/// Checker bound to a fixed set of requirements
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    requirements: Vec<VersionRequirement>,
}

impl CompatibilityChecker {
    pub fn new(requirements: Vec<VersionRequirement>) -> Self {
        Self { requirements }
    }

    pub fn requirements(&self) -> &[VersionRequirement] {
        &self.requirements
    }

    /// Requirement registered for a component
    pub fn requirement(&self, component: Component) -> Option<&VersionRequirement> {
        self.requirements.iter().find(|r| r.component == component)
    }

    /// Configured minimum for a component, empty when disabled
    pub fn minimum(&self, component: Component) -> &str {
        self.requirement(component)
            .and_then(|r| r.minimum.as_deref())
            .unwrap_or("")
    }

    /// Evaluate every requirement
    pub fn check(&self, environment: &EnvironmentSnapshot) -> CompatibilityResult {
        check(environment, &self.requirements)
    }

    /// Evaluate a single component's requirement
    pub fn is_compatible(&self, environment: &EnvironmentSnapshot, component: Component) -> bool {
        match self.requirement(component) {
            Some(requirement) => requirement.is_satisfied_by(environment.version_of(component)),
            None => true,
        }
    }

    pub fn is_runtime_compatible(&self, environment: &EnvironmentSnapshot) -> bool {
        self.is_compatible(environment, Component::Runtime)
    }

    pub fn is_host_compatible(&self, environment: &EnvironmentSnapshot) -> bool {
        self.is_compatible(environment, Component::Host)
    }

    /// Platform must define its version and meet the minimum
    pub fn is_platform_compatible(&self, environment: &EnvironmentSnapshot) -> bool {
        self.is_compatible(environment, Component::Platform)
    }
}
