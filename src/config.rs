use clap::Parser;
use config::{Config, File};
use env_logger::{Builder, Env};
use serde::Deserialize;
use std::path::PathBuf;

use crate::dispatcher::WorkPlan;
use crate::error::{LoadTestError, Result};

pub const USAGE: &str = "Usage: load_blaster --url=<URL> --requests=<total> --concurrency=<concurrent calls>";

/// Command line surface. Every field is optional here so that a settings
/// file can supply it; `validate_settings` decides what is actually missing.
#[derive(Debug, Default, Parser)]
#[command(name = "load_blaster")]
#[command(about = "Fires a fixed number of GET requests at a URL with bounded concurrency")]
pub struct CliArgs {
    /// URL of the service under test
    #[arg(long)]
    pub url: Option<String>,

    /// Total number of requests to send
    #[arg(long)]
    pub requests: Option<u64>,

    /// Number of simultaneous calls (default 1)
    #[arg(long)]
    pub concurrency: Option<u64>,

    /// Optional settings file (yaml, yml or toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `load_blaster=debug`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Per-request timeout in seconds; the client default applies when unset
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub url: String,
    pub requests: u64,
    pub concurrency: u64,
    /// Explicit log filter. When absent `RUST_LOG` applies, then `info`.
    pub log_level: Option<String>,
    pub http_timeout_seconds: Option<u64>,
}

impl Settings {
    pub fn init_logging(&self) {
        // A logger may already be installed when running under a test harness.
        let _ = self.logger(Env::default()).try_init();
    }

    fn logger(&self, env: Env<'_>) -> Builder {
        let mut builder = Builder::from_env(env.default_filter_or("info"));
        if let Some(level) = &self.log_level {
            builder.parse_filters(level);
        }
        builder
    }

    /// Builds the immutable plan handed to the dispatcher.
    pub fn work_plan(&self) -> Result<WorkPlan> {
        validate_settings(self)?;
        Ok(WorkPlan {
            url: self.url.clone(),
            total_requests: to_count("requests", self.requests)?,
            concurrency: to_count("concurrency", self.concurrency)?,
        })
    }
}

/// Layers defaults, the optional settings file and the command line, in that
/// order of precedence, then validates the result.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let mut config_builder = Config::builder()
        .set_default("url", "")?
        .set_default("requests", 0u64)?
        .set_default("concurrency", 1u64)?;

    if let Some(path) = &args.config {
        config_builder = config_builder.add_source(File::from(path.as_path()).required(true));
    }

    config_builder = config_builder
        .set_override_option("url", args.url.clone())?
        .set_override_option("requests", args.requests)?
        .set_override_option("concurrency", args.concurrency)?
        .set_override_option("log_level", args.log_level.clone())?
        .set_override_option("http_timeout_seconds", args.timeout_secs)?;

    let settings = config_builder.build()?.try_deserialize::<Settings>()?;

    validate_settings(&settings)?;

    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.url.trim().is_empty() {
        return Err(LoadTestError::Invalid("url is missing".to_string()));
    }
    if settings.requests == 0 {
        return Err(LoadTestError::Invalid("requests must be greater than zero".to_string()));
    }
    if settings.concurrency == 0 {
        return Err(LoadTestError::Invalid("concurrency must be greater than zero".to_string()));
    }
    if settings.http_timeout_seconds == Some(0) {
        return Err(LoadTestError::Invalid("timeout must be greater than zero".to_string()));
    }

    Ok(())
}

fn to_count(field: &str, value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| LoadTestError::Invalid(format!("{} is too large: {}", field, value)))
}
