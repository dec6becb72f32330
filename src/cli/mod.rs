//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;

use crate::bridge::PlaywrightLauncher;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{strip_ansi, Error, Result};
use crate::engine::SessionFactory;
use crate::locator::{normalize, SelectionExpression};
use crate::scenario::{self, LoadedScenario, ScenarioFile, ScenarioStore};
use crate::testing::{run_scenarios, title_matches, RunOptions};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Run {
            grep,
            headed,
            dir,
            parallel,
            json,
            plain,
        } => {
            let store = store_for(dir, &config);
            let loaded = store.load_all()?;

            if loaded.is_empty() {
                println!("No scenarios in {}", store.dir().display());
                return Ok(());
            }

            if let Some(pattern) = &grep {
                if !loaded.iter().any(|s| title_matches(s, pattern)) {
                    return Err(Error::ScenarioNotFound(pattern.clone()));
                }
            }

            let options = run_options(grep, parallel, &config)?;
            let output = Output { json, plain };
            if !json {
                println!(
                    "{}",
                    output.text(&format!(
                        "{} {}",
                        "Running scenarios from".blue().bold(),
                        store.dir().display().to_string().white().bold()
                    ))
                );
            }
            run_and_report(loaded, headed, config, &options, output).await
        }

        Commands::Save {
            file,
            dir,
            run,
            headed,
        } => {
            let text = read_input(&file)?;
            let label = file.display().to_string();

            // Full validation first so every reason gets reported
            if let Err(e) = scenario::parse(&text) {
                return Err(Error::invalid_scenario(&label, &e.reasons()));
            }
            let scenario: ScenarioFile = serde_json::from_str(&text)?;

            let store = store_for(dir, &config);
            let path = store.save(&scenario)?;
            println!("{} Saved '{}' to {}", "✓".green(), scenario.title, path.display());

            if !run {
                return Ok(());
            }

            let loaded = vec![ScenarioStore::load_file(&path)];
            let options = run_options(None, None, &config)?;
            run_and_report(loaded, headed, config, &options, Output::default()).await
        }

        Commands::Validate { dir } => {
            let store = store_for(dir, &config);
            let loaded = store.load_all()?;

            if loaded.is_empty() {
                println!("No scenarios in {}", store.dir().display());
                return Ok(());
            }

            let mut invalid = 0;
            for scenario in &loaded {
                match &scenario.result {
                    Ok(case) => println!(
                        "  {} {} {}",
                        "✓".green(),
                        scenario.file_name(),
                        format!("'{}', {} step(s)", case.title, case.steps.len()).dimmed()
                    ),
                    Err(e) => {
                        invalid += 1;
                        println!("  {} {}", "✗".red(), scenario.file_name());
                        for reason in e.reasons() {
                            println!("      - {}", reason);
                        }
                    }
                }
            }

            if invalid > 0 {
                return Err(Error::InvalidScenarios {
                    invalid,
                    total: loaded.len(),
                });
            }
            println!("All {} scenario file(s) are valid", loaded.len());
            Ok(())
        }

        Commands::List { dir } => {
            let store = store_for(dir, &config);
            let loaded = store.load_all()?;

            if loaded.is_empty() {
                println!("No scenarios in {}", store.dir().display());
                return Ok(());
            }

            println!("Scenarios in {}:", store.dir().display());
            for scenario in &loaded {
                match &scenario.result {
                    Ok(case) => println!(
                        "  {} ({}, {} step(s))",
                        case.title,
                        scenario.file_name(),
                        case.steps.len()
                    ),
                    Err(_) => println!("  ? ({}, invalid)", scenario.file_name()),
                }
            }
            Ok(())
        }

        Commands::Normalize { locator, action } => {
            let selection = normalize(&locator, action.into());
            print_selection(&selection);
            Ok(())
        }
    }
}

/// Output switches for a run
#[derive(Debug, Clone, Copy, Default)]
struct Output {
    json: bool,
    plain: bool,
}

impl Output {
    fn text(&self, text: &str) -> String {
        if self.plain {
            strip_ansi(text)
        } else {
            text.to_string()
        }
    }
}

fn store_for(dir: Option<PathBuf>, config: &Config) -> ScenarioStore {
    ScenarioStore::new(dir.unwrap_or_else(|| config.runner.data_dir.clone()))
}

fn run_options(grep: Option<String>, parallel: Option<usize>, config: &Config) -> Result<RunOptions> {
    let parallel = parallel.unwrap_or(config.runner.parallel);
    if parallel == 0 {
        return Err(Error::Config("--parallel must be at least 1".to_string()));
    }
    Ok(RunOptions {
        grep,
        parallel,
        timeouts: config.timeouts.clone(),
    })
}

async fn run_and_report(
    loaded: Vec<LoadedScenario>,
    headed: bool,
    config: Config,
    options: &RunOptions,
    output: Output,
) -> Result<()> {
    // Fail once up front instead of once per scenario
    config.node_executable()?;

    let factory: Arc<dyn SessionFactory> = Arc::new(PlaywrightLauncher::new(config, headed));
    let report = run_scenarios(loaded, factory, options).await;

    if output.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", output.text(&report.render()));
    }

    if report.failed() > 0 {
        return Err(Error::ScenariosFailed {
            failed: report.failed(),
            total: report.scenarios.len(),
        });
    }
    if report.invalid() > 0 {
        return Err(Error::InvalidScenarios {
            invalid: report.invalid(),
            total: report.scenarios.len(),
        });
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| Error::file_read(file, e))?;
        return Ok(text);
    }
    std::fs::read_to_string(file).map_err(|e| Error::file_read(file, e))
}

fn print_selection(selection: &SelectionExpression) {
    println!("{}", selection);
    let selectors = selection.selectors();
    if selectors.len() > 1 {
        println!("Tried in order, first match wins:");
        for (i, selector) in selectors.iter().enumerate() {
            println!("  {}. {}", i + 1, selector);
        }
    }
}
