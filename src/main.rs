use anyhow::{Context, Result};
use clap::{Arg, Command};
use log::LevelFilter;
use std::path::Path;

use sortie_analyzer::{AnalysisConfig, Event, Mission, Sortie};

fn build_command() -> Command {
    Command::new("Sortie Analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyze multi-UAV flight-test logs: flight phases, durations, climbout and landing-overshoot metrics.")
        .arg(
            Arg::new("paths")
                .help("Event, Mission, or Sortie folders to analyze. The hierarchy level is detected from the folder name unless --level is given.")
                .required(false)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .help("Force the hierarchy level of the given paths")
                .value_name("LEVEL")
                .value_parser(["event", "mission", "sortie"]),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Write text summary files next to the analyzed folders")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Recompute results that are already cached")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print per-sortie summaries as JSON (requires the 'json' build feature)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Hierarchy levels the CLI can analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Event,
    Mission,
    Sortie,
}

/// Detect the hierarchy level from the folder name
fn detect_level(path: &Path) -> Option<Level> {
    let name = path.file_name()?.to_string_lossy();
    if name.contains("Sortie") {
        Some(Level::Sortie)
    } else if name.contains("Mission") {
        Some(Level::Mission)
    } else if name.contains("Event") {
        Some(Level::Event)
    } else {
        None
    }
}

struct Options {
    summary: bool,
    force: bool,
    json: bool,
}

fn process_sortie(path: &Path, config: &AnalysisConfig, options: &Options) -> Result<()> {
    let mut sortie = Sortie::from_path(path, config.clone())
        .with_context(|| format!("loading sortie {}", path.display()))?;
    sortie.analyze(options.force);

    if options.json {
        print_sortie_json(&sortie)?;
    } else {
        print!("{}", sortie.summary_text());
    }
    print_failures(&sortie);

    if options.summary {
        let written = sortie.write_summary()?;
        println!("Wrote {}", written.display());
    }
    Ok(())
}

fn process_mission(path: &Path, config: &AnalysisConfig, options: &Options) -> Result<()> {
    let mut mission = Mission::from_path(path, config)
        .with_context(|| format!("loading mission {}", path.display()))?;
    mission.analyze(options.force);

    print!("{}", mission.summary_text());
    for (number, sortie) in mission.sorties() {
        if options.json {
            print_sortie_json(sortie)?;
        } else {
            print!("{}", sortie.summary_text());
        }
        if !sortie.failures().is_empty() {
            println!("Sortie {}:", number);
            print_failures(sortie);
        }
    }
    for (failed_path, error) in &mission.load_failures {
        println!("Failed to load {}: {}", failed_path.display(), error);
    }

    if options.summary {
        let written = mission.write_summary()?;
        println!("Wrote {}", written.display());
    }
    Ok(())
}

fn process_event(path: &Path, config: &AnalysisConfig, options: &Options) -> Result<()> {
    let mut event = Event::from_path(path, config)
        .with_context(|| format!("loading event {}", path.display()))?;
    event.analyze(options.force);

    print!("{}", event.summary_text());
    for (_, mission) in event.missions() {
        print!("{}", mission.summary_text());
    }
    for (failed_path, error) in &event.load_failures {
        println!("Failed to load {}: {}", failed_path.display(), error);
    }

    if options.summary {
        let written = event.write_summary()?;
        println!("Wrote {}", written.display());
    }
    Ok(())
}

#[cfg(feature = "json")]
fn print_sortie_json(sortie: &Sortie) -> Result<()> {
    println!("{}", sortie.summary_json()?);
    Ok(())
}

#[cfg(not(feature = "json"))]
fn print_sortie_json(_sortie: &Sortie) -> Result<()> {
    anyhow::bail!("this build does not include the 'json' feature")
}

fn print_failures(sortie: &Sortie) {
    for failure in sortie.failures() {
        println!("  {} failed: {}", failure.rule, failure.error);
    }
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    let debug = matches.get_flag("debug");
    env_logger::Builder::from_default_env()
        .filter_level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let paths: Vec<&String> = match matches.get_many::<String>("paths") {
        Some(paths) => paths.collect(),
        None => {
            build_command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let options = Options {
        summary: matches.get_flag("summary"),
        force: matches.get_flag("force"),
        json: matches.get_flag("json"),
    };
    let forced_level = matches.get_one::<String>("level").map(|s| s.as_str());
    let config = AnalysisConfig::default();

    for path_str in paths {
        let path = Path::new(path_str);
        let level = match forced_level {
            Some("event") => Level::Event,
            Some("mission") => Level::Mission,
            Some("sortie") => Level::Sortie,
            _ => match detect_level(path) {
                Some(level) => level,
                None => {
                    eprintln!(
                        "Warning: cannot detect hierarchy level of '{}', use --level",
                        path.display()
                    );
                    continue;
                }
            },
        };

        let result = match level {
            Level::Sortie => process_sortie(path, &config, &options),
            Level::Mission => process_mission(path, &config, &options),
            Level::Event => process_event(path, &config, &options),
        };
        if let Err(error) = result {
            eprintln!("Error processing {}: {:#}", path.display(), error);
        }
    }

    Ok(())
}
