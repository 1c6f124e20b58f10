use anyhow::{bail, Context, Result};
use careers_acceptance::browser::ChromeLauncher;
use careers_acceptance::config::RunConfig;
use careers_acceptance::feature::{load_feature, Scenario};
use careers_acceptance::runner::{ScenarioRunner, SuiteReport};
use careers_acceptance::test_log::TestLog;
use clap::Parser;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs the careers search acceptance features", long_about = None)]
struct Args {
    /// Feature files or directories containing *.feature files
    #[arg(default_value = "features")]
    paths: Vec<PathBuf>,

    /// JSON config file; unset keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only run scenarios carrying this tag
    #[arg(short, long)]
    tags: Option<String>,

    /// Number of scenarios to run at the same time
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Override the site's home page URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for the run log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let scenarios = collect_scenarios(&args.paths, args.tags.as_deref())?;
    if scenarios.is_empty() {
        bail!("no scenarios to run");
    }

    let log = TestLog::new(&config.log_dir);
    info!("Writing run log to {}", log.path().display());

    let launcher = ChromeLauncher::new(config.headless, config.chrome_executable.clone());
    let report_path = config.report_path.clone();
    let runner = ScenarioRunner::new(launcher, config, log);

    let report = runner.run_all(scenarios, args.workers).await;
    if let Err(e) = report.write_json(&report_path) {
        error!("Failed to write report to {}: {}", report_path.display(), e);
    }
    print_summary(&report);

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if args.headed {
        config.headless = false;
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(report) = &args.report {
        config.report_path = report.clone();
    }
    config.validate()?;
    Ok(config)
}

fn collect_scenarios(paths: &[PathBuf], tag: Option<&str>) -> Result<Vec<Scenario>> {
    let mut files = Vec::new();
    for path in paths {
        feature_files(path, &mut files)?;
    }
    files.sort();

    let mut scenarios = Vec::new();
    for file in files {
        let feature =
            load_feature(&file).with_context(|| format!("reading {}", file.display()))?;
        info!("Loaded feature '{}' from {}", feature.name, file.display());
        scenarios.extend(
            feature
                .scenarios
                .into_iter()
                .filter(|s| tag.map_or(true, |t| s.has_tag(t))),
        );
    }
    Ok(scenarios)
}

fn feature_files(path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_file() {
        out.push(path.to_path_buf());
        return Ok(());
    }
    let entries = fs::read_dir(path).with_context(|| format!("listing {}", path.display()))?;
    for entry in entries {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            feature_files(&entry_path, out)?;
        } else if entry_path.extension().map_or(false, |ext| ext == "feature") {
            out.push(entry_path);
        }
    }
    Ok(())
}

fn print_summary(report: &SuiteReport) {
    println!();
    for result in &report.scenarios {
        match &result.error {
            Some(e) => println!("{:<10} {} - {}", result.status.as_str(), result.name, e),
            None => println!("{:<10} {}", result.status.as_str(), result.name),
        }
    }
    println!(
        "{} scenario(s): {} passed, {} failed, {} undefined ({} ms)",
        report.total, report.passed, report.failed, report.undefined, report.duration_ms
    );
}
