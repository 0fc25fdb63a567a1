//! Simulation execution and report output

use std::sync::Arc;
use anyhow::Result;
use colored::Colorize;
use log::{debug, info};
use prettytable::{format, Cell, Row, Table};

use crate::{cli, config};
use crate::gate::{
    CompatibilityChecker, Component, EnvironmentSnapshot, HookDispatcher, Loader, LoaderBuilder,
    PluginManifest, RequestOutcome, SimulatedHost, SimulatedRuntime,
};

/// Requirement table for an environment; status cells are coloured when enabled
pub fn format_compatibility_report(manifest: &PluginManifest, environment: &EnvironmentSnapshot) -> String {
    let checker = CompatibilityChecker::new(manifest.requirements());
    let result = checker.check(environment);

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.add_row(Row::new(
        ["Component", "Minimum", "Detected", "Policy", "Status"]
            .iter()
            .map(|header| Cell::new(header))
            .collect(),
    ));

    for outcome in &result.outcomes {
        let minimum = outcome.minimum.as_deref().unwrap_or("-");
        let detected = environment.display_version(outcome.component);
        let policy = match outcome.component {
            Component::Runtime => "blocks activation",
            Component::Host | Component::Platform => "advisory",
        };
        let status = match (&outcome.minimum, outcome.satisfied) {
            (None, _) => "n/a".dimmed().to_string(),
            (Some(_), true) => "ok".green().to_string(),
            (Some(_), false) => "outdated".red().bold().to_string(),
        };

        table.add_row(Row::new(vec![
            Cell::new(manifest.label(outcome.component)),
            Cell::new(minimum),
            Cell::new(&detected),
            Cell::new(policy),
            Cell::new(&status),
        ]));
    }

    let mut report = format!("{} {}\n", manifest.name.bold(), manifest.version);
    for line in table.to_string().lines() {
        report.push_str("  ");
        report.push_str(line);
        report.push('\n');
    }
    report
}

fn print_outcome(label: &str, outcome: &RequestOutcome) {
    println!("{}", format!("== {} ==", label).cyan());

    if !outcome.plugin_loaded {
        println!("plugin inactive, not loaded");
        return;
    }

    if outcome.notices_html.is_empty() {
        println!("no notices");
    } else {
        print!("{}", outcome.notices_html);
    }

    for error in &outcome.errors {
        eprintln!("{} {}", "warning:".yellow(), error);
    }
}

/// Replay an optional activation request and a series of admin requests
pub fn run_simulation(args: &cli::Args, config: &config::ConfigManager) -> Result<()> {
    let colours = !args.no_color && config.get_bool("base", "color")?.unwrap_or(true);
    if !colours {
        colored::control::set_override(false);
    }

    let manifest = config.get_manifest()?;
    let environment = crate::app::resolve_environment(args, config);

    if args.report {
        print!("{}", format_compatibility_report(&manifest, &environment));
        return Ok(());
    }

    let host = Arc::new(SimulatedHost::new(environment));
    let runtime = Arc::new(SimulatedRuntime::new());
    let loader = Loader::get_instance(|| {
        LoaderBuilder::new(host.clone(), runtime.clone()).manifest(manifest.clone())
    });

    let dispatcher = HookDispatcher::new(&host, &manifest.basename);

    if args.activate {
        let outcome = dispatcher.run_activation_request(loader)?;
        print_outcome("activation", &outcome);
    } else {
        debug!("Assuming {} was activated earlier", manifest.basename);
        host.activate_plugin(&manifest.basename);
    }

    for request in 1..=args.requests {
        let outcome = dispatcher.run_admin_request(loader);
        print_outcome(&format!("request {}", request), &outcome);
    }

    info!(
        "Simulation finished: state={:?} entry point invocations={}",
        loader.state(),
        runtime.entry_point_calls()
    );
    println!("entry point invocations: {}", runtime.entry_point_calls());
    Ok(())
}
