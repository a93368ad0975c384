//! Reqpolicy CLI: the `reqpolicy` command.

mod cli;
mod commands;
mod config;
mod project;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use reqpolicy_rewrite::SyncOptions;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = support::load_config_or_exit(cli.config.as_deref());
    let paths = &config.paths;

    match cli.command {
        Commands::ValidateConstraints {
            global,
            constraints,
            json,
        } => commands::validate_constraints::run(
            global.unwrap_or_else(|| paths.global_requirements.clone()),
            constraints.unwrap_or_else(|| paths.upper_constraints.clone()),
            json,
        ),

        Commands::ValidateProject {
            project,
            global,
            blacklist,
            lower_constraints,
            strict,
            marker_matching,
            json,
        } => commands::validate_project::run(
            commands::validate_project::ValidateProjectArgs {
                project,
                global: global.unwrap_or_else(|| paths.global_requirements.clone()),
                blacklist: blacklist.unwrap_or_else(|| paths.blacklist.clone()),
                lower_constraints,
                strict,
                marker_matching,
                json,
            },
            &config,
        ),

        Commands::CheckCoverage {
            global,
            constraints,
            blacklist,
            json,
        } => commands::check_coverage::run(
            global.unwrap_or_else(|| paths.global_requirements.clone()),
            constraints.unwrap_or_else(|| paths.upper_constraints.clone()),
            blacklist.unwrap_or_else(|| paths.blacklist.clone()),
            json,
        ),

        Commands::CheckExists {
            project,
            global,
            constraints,
            blacklist,
            json,
        } => commands::check_exists::run(
            project,
            global.unwrap_or_else(|| paths.global_requirements.clone()),
            constraints.unwrap_or_else(|| paths.upper_constraints.clone()),
            blacklist.unwrap_or_else(|| paths.blacklist.clone()),
            json,
        ),

        Commands::CheckOverlap { parent, head, json } => {
            commands::check_overlap::run(parent, head, json)
        }

        Commands::Cap {
            requirements,
            freeze,
        } => commands::cap::run(requirements, freeze, &config),

        Commands::MergeConstraints {
            constraints,
            blacklist,
            version_map,
        } => commands::merge_constraints::run(constraints, blacklist, version_map),

        Commands::Update {
            project,
            source,
            output_suffix,
            soft_update,
            hacking,
            allow_non_standard,
        } => commands::update::run(commands::update::UpdateArgs {
            project,
            source,
            output_suffix,
            options: SyncOptions {
                soft_update,
                hacking,
                allow_non_standard,
            },
        }),

        Commands::Sort { file } => commands::sort::run(file),
    }
}
