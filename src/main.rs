use anyhow::Context;
use clap::Parser;
use load_blaster::config::{load_config, CliArgs, USAGE};
use load_blaster::report::{render_banner, render_report};
use load_blaster::start_load_test;

// Parses and validates the command line, runs the load test and prints the report.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Nothing is dispatched unless the settings validate.
    let settings = match load_config(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            println!("{}", USAGE);
            return Ok(());
        }
    };
    settings.init_logging();
    if let Some(path) = &args.config {
        log::info!("Loaded settings from {}", path.display());
    }
    log::debug!("Settings: {:?}", settings);

    let plan = settings.work_plan().context("building work plan")?;
    print!("{}", render_banner(&plan));

    let snapshot = start_load_test(&settings)
        .await
        .with_context(|| format!("load test against '{}' failed", plan.url))?;

    print!("{}", render_report(&snapshot));

    Ok(())
}
