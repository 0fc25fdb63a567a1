//! Application initialization and configuration

use anyhow::Result;
use log::{debug, LevelFilter};
use std::str::FromStr;
use crate::{cli, config, logging};
use crate::gate::EnvironmentSnapshot;

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = match &args.config_file {
        Some(config_file) => config::ConfigManager::load_from_file(config_file.clone())?,
        None => config::ConfigManager::load()?,
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        match config.get_log_level("base", "console-level") {
            Ok(Some(level)) => level,
            Ok(None) => LevelFilter::Info,
            Err(e) => {
                debug!("Invalid console-level in config, using default: {}", e);
                LevelFilter::Info
            }
        }
    };

    let format = if args.log_format != "text" {
        logging::LogFormat::from_str(&args.log_format)
            .map_err(|e| anyhow::anyhow!(e))?
    } else {
        config.get_value("base", "log-format")
            .and_then(|format_str| logging::LogFormat::from_str(format_str).ok())
            .unwrap_or(logging::LogFormat::Text)
    };

    let log_file_path = args.log_file.clone()
        .or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => config.get_log_level("base", "file-level").unwrap_or(None),
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), level) => {
            let level = level.unwrap_or(console_level);
            debug!("File logging enabled: {} (level: {:?})", file_path.display(), level);
            (logging::LogDestination::Both(file_path), Some(level))
        }
        (None, Some(_)) => {
            return Err(anyhow::anyhow!("Log file level specified without log file"));
        }
        (None, None) => (logging::LogDestination::Console, None),
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Environment from config, with command line versions taking precedence
pub fn resolve_environment(args: &cli::Args, config: &config::ConfigManager) -> EnvironmentSnapshot {
    let mut environment = config.get_environment();

    if let Some(runtime) = &args.runtime_version {
        environment.runtime_version = Some(runtime.clone());
    }
    if let Some(host) = &args.host_version {
        environment.host_version = Some(host.clone());
    }
    if let Some(platform) = &args.platform_version {
        environment.platform_version = Some(platform.clone());
    }

    debug!("Resolved environment: {:?}", environment);
    environment
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn args(argv: &[&str]) -> cli::Args {
        let mut full = vec!["envgate"];
        full.extend_from_slice(argv);
        cli::Args::parse_from(full)
    }

    fn config_with(section: &str, pairs: &[(&str, &str)]) -> config::ConfigManager {
        let mut configuration = config::Configuration::new();
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        configuration.insert(section.to_string(), values);
        config::ConfigManager::from_config(configuration)
    }

    #[test]
    fn test_cli_environment_overrides_config() {
        let config = config_with("environment", &[("runtime", "8.0"), ("host", "6.1")]);
        let environment = resolve_environment(&args(&["--runtime-version", "6.4"]), &config);

        assert_eq!(environment.runtime_version.as_deref(), Some("6.4"));
        assert_eq!(environment.host_version.as_deref(), Some("6.1"));
        assert!(environment.platform_version.is_none());
    }

    #[test]
    fn test_logging_levels_from_flags_and_config() {
        let config = config_with("base", &[("console-level", "warn"), ("log-format", "json")]);

        let log_config = configure_logging(&args(&[]), &config).unwrap();
        assert_eq!(log_config.console_level, LevelFilter::Warn);
        assert_eq!(log_config.format, logging::LogFormat::Json);
        assert_eq!(log_config.destination, logging::LogDestination::Console);

        let log_config = configure_logging(&args(&["--debug"]), &config).unwrap();
        assert_eq!(log_config.console_level, LevelFilter::Trace);
    }

    #[test]
    fn test_log_file_inherits_console_level() {
        let config = config::ConfigManager::from_config(config::Configuration::new());
        let log_config = configure_logging(&args(&["--verbose", "--log-file", "/tmp/envgate.log"]), &config).unwrap();

        assert_eq!(log_config.file_level, Some(LevelFilter::Debug));
        assert!(matches!(log_config.destination, logging::LogDestination::Both(_)));
    }
}
