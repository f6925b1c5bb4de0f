//! Application definition.

#![allow(dead_code)]
#![allow(unused)]

extern crate simplelog;

use std::env;
use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use mosim::{write_script, ExperimentManifest, RUN_LOG_FILE};

use crate::init;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("mosim-cli")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .author(AUTHORS)
        .about("Set up Modelica simulation experiments and generate Dymola run scripts \
                from the command line.")
        .arg(Arg::with_name("verbosity")
            .long("verbosity")
            .short("v")
            .takes_value(true)
            .default_value("info")
            .value_name("verb")
            .global(true)
            .help("Set the verbosity of the log output"))
        // new subcommand
        .subcommand(SubCommand::with_name("new")
            .setting(AppSettings::DisableHelpSubcommand)
            .display_order(10)
            .about("Create a new experiment sweep directory")
            .arg(Arg::with_name("path")
                .required(true)
                .value_name("path"))
            .arg(Arg::with_name("name")
                .help("Set the name for the new experiment (defaults to directory name)")
                .short("n")
                .long("name")
                .takes_value(true))
            .arg(Arg::with_name("template")
                .possible_values(&["barebones", "commented"])
                .takes_value(true)
                .default_value("commented")
                .help("Init with a template")
                .long("template")
                .short("t")))
        // script subcommand
        .subcommand(SubCommand::with_name("script")
            .display_order(20)
            .about("Generate the run script and run log from an experiment manifest")
            .arg(Arg::with_name("path")
                .value_name("path")
                .default_value("./")
                .help("Path to the experiment manifest (or the directory holding it)")))
}

pub fn app_matches() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("new", Some(m)) => start_new(m),
        ("script", Some(m)) => start_script(m),
        _ => Ok(()),
    }
}

// Initiate new experiment structure template based on input args
fn start_new(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .value_of("path")
        .ok_or_else(|| Error::msg("failed to get experiment path"))?;
    let template = matches
        .value_of("template")
        .ok_or_else(|| Error::msg("failed to get experiment template"))?;

    init::init_at_path(path, matches.value_of("name"), template)
}

fn start_script(matches: &ArgMatches) -> Result<()> {
    setup_log_verbosity(matches);

    let mut path = env::current_dir()?;
    if let Some(p_str) = matches.value_of("path") {
        let p = PathBuf::from(p_str);
        if p.is_relative() {
            path = path.join(p);
        } else {
            path = p;
        }
    }

    let manifest = ExperimentManifest::from_path(&path)?;
    let base_dir = if path.is_dir() {
        path.clone()
    } else {
        path.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    };

    let experiments = manifest.experiments()?;
    let total = experiments.total();
    println!(
        "Writing the Dymola script for experiment \"{}\" ({} runs)...",
        manifest.experiment.name, total
    );

    let settings = manifest.settings(&base_dir);
    let script_path = settings.fname.clone();
    let (models, results_dir) = write_script(experiments, settings)?;

    println!("Finished writing the Dymola script.");
    println!("  script:  {}", script_path.display());
    println!("  run log: {}", results_dir.join(RUN_LOG_FILE).display());
    println!("  runs:    {}", models.len());
    Ok(())
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{Config, LevelFilter, TermLogger};
    let level_filter = match matches.value_of("verbosity") {
        Some(s) => match s {
            "0" | "none" => LevelFilter::Off,
            "1" | "err" | "error" | "min" => LevelFilter::Error,
            "2" | "warn" | "warning" | "default" => LevelFilter::Warn,
            "3" | "info" => LevelFilter::Info,
            "4" | "debug" => LevelFilter::Debug,
            "5" | "trace" | "max" | "all" => LevelFilter::Trace,
            _ => LevelFilter::Warn,
        },
        _ => LevelFilter::Warn,
    };
    let mut config_builder = simplelog::ConfigBuilder::new();
    let logger_conf = config_builder
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed);
}
