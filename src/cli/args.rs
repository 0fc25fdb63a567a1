use clap::Parser;
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

/// Environment-gated plugin loader simulator
#[derive(Parser, Debug)]
#[command(name = "envgate")]
#[command(about = "Replays plugin activation and admin requests against a simulated host, enforcing runtime, host and platform version requirements")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,

    // ============ ENVIRONMENT ============

    /// Detected runtime version (overrides [environment] runtime)
    #[arg(long, value_name = "VERSION")]
    pub runtime_version: Option<String>,

    /// Detected host application version (overrides [environment] host)
    #[arg(long, value_name = "VERSION")]
    pub host_version: Option<String>,

    /// Detected platform version (overrides [environment] platform)
    #[arg(long, value_name = "VERSION")]
    pub platform_version: Option<String>,

    // ============ SIMULATION ============

    /// Run an activation request before the admin requests
    #[arg(long)]
    pub activate: bool,

    /// Number of admin requests to replay
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub requests: usize,

    /// Print the compatibility report and exit
    #[arg(long)]
    pub report: bool,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        crate::logging::parse_log_level(level)?;
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.requests == 0 && !args.activate && !args.report {
        return Err(anyhow::anyhow!(
            "Nothing to do: use --activate, --report, or --requests greater than zero"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["envgate"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.requests, 1);
        assert!(!args.activate);
        assert_eq!(args.log_format, "text");
        assert!(args.runtime_version.is_none());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let args = parse(&["--activate", "--runtime-version", "6.4", "--host-version", "5.2", "--platform-version", "4.0", "--requests", "3"]);
        assert!(args.activate);
        assert_eq!(args.runtime_version.as_deref(), Some("6.4"));
        assert_eq!(args.platform_version.as_deref(), Some("4.0"));
        assert_eq!(args.requests, 3);
    }

    #[test]
    fn test_validate_args_conflicting_flags() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_format() {
        let args = parse(&["--log-format", "xml"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_file_level_without_file() {
        let args = parse(&["--log-file-level", "debug"]);
        assert!(validate_args(&args).is_err());

        let args = parse(&["--log-file-level", "debug", "--log-file", "/tmp/envgate.log"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_nothing_to_do() {
        let args = parse(&["--requests", "0"]);
        assert!(validate_args(&args).is_err());

        let args = parse(&["--requests", "0", "--activate"]);
        assert!(validate_args(&args).is_ok());
    }
}
