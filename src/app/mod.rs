//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{
    load_configuration,
    configure_logging,
    resolve_environment,
};
pub use execution::{
    format_compatibility_report,
    run_simulation,
};
