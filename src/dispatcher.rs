//! Bounded fan-out of the requested calls.

use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::aggregator::{Aggregator, ResultSnapshot};
use crate::config::Settings;
use crate::error::{LoadTestError, Result};
use crate::tasks::{HttpTarget, Target};
use crate::utils::http_client::{self, HttpClientConfig};

/// Validated input for one run. Build it through `Settings::work_plan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPlan {
    pub url: String,
    pub total_requests: usize,
    pub concurrency: usize,
}

impl WorkPlan {
    /// Slots actually handed out; more than `total_requests` would never be used.
    fn slots(&self) -> usize {
        self.concurrency.min(self.total_requests).min(Semaphore::MAX_PERMITS)
    }
}

/// Issues `plan.total_requests` calls against `target`, never more than
/// `plan.concurrency` at once, and returns after every one of them has
/// reported to `aggregator`.
///
/// A slot is taken before a unit is spawned and given back as soon as its
/// call completes, ahead of recording, so time spent waiting on the
/// aggregator's lock does not count against the concurrency cap.
pub async fn run(plan: &WorkPlan, target: Arc<dyn Target>, aggregator: Arc<Aggregator>) -> Result<()> {
    let slots = plan.slots();
    let semaphore = Arc::new(Semaphore::new(slots));
    let mut units = JoinSet::new();
    let mut first_error = None;

    info!(
        "Dispatching {} calls to '{}' with concurrency {}",
        plan.total_requests,
        target.describe(),
        plan.concurrency
    );

    for unit in 0..plan.total_requests {
        // Keep at most `slots` handles alive, whatever the total.
        while units.len() >= slots {
            if let Some(joined) = units.join_next().await {
                note_unit_result(joined, &mut first_error);
            }
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LoadTestError::SemaphoreClosed)?;
        let target = target.clone();
        let aggregator = aggregator.clone();

        units.spawn(async move {
            let outcome = target.fetch().await;
            drop(permit);
            match outcome.status_code() {
                Some(code) => debug!("Unit {} answered {}", unit, code),
                None => debug!("Unit {} got no response", unit),
            }
            aggregator.record(outcome).await
        });
    }

    while let Some(joined) = units.join_next().await {
        note_unit_result(joined, &mut first_error);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn note_unit_result(joined: std::result::Result<Result<()>, JoinError>, first_error: &mut Option<LoadTestError>) {
    let failure = match joined {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(e) => LoadTestError::Join(e.to_string()),
    };
    error!("Dispatch unit failed: {}", failure);
    first_error.get_or_insert(failure);
}

/// Runs the whole plan and returns the finalized tallies.
///
/// # Parameters
/// - `plan`: validated url, total and concurrency for the run.
/// - `target`: what each unit calls; shared by all units.
///
/// # Returns
/// The snapshot stamped with the wall-clock time from the first dispatch to
/// the last unit joined, or the first unit failure seen by `run`.
pub async fn execute(plan: &WorkPlan, target: Arc<dyn Target>) -> Result<ResultSnapshot> {
    let aggregator = Arc::new(Aggregator::new(plan.total_requests));

    let start = Instant::now();
    run(plan, target, aggregator.clone()).await?;
    let elapsed = start.elapsed();

    let snapshot = aggregator.finalize(elapsed).await?;
    info!(
        "Completed {} calls in {:?} ({} with status 200)",
        snapshot.recorded(),
        snapshot.total_elapsed,
        snapshot.status_200
    );
    Ok(snapshot)
}

/// Builds the shared HTTP client from `settings` and runs the plan against
/// the configured URL.
///
/// # Returns
/// The finalized snapshot, or an error when the settings do not validate or
/// the client cannot be built.
pub async fn start_load_test(settings: &Settings) -> Result<ResultSnapshot> {
    let plan = settings.work_plan()?;

    let http_config = HttpClientConfig {
        timeout_seconds: settings.http_timeout_seconds,
        max_idle_per_host: Some(plan.slots()),
    };
    let client = http_client::get_client(Some(http_config))?;
    let target: Arc<dyn Target> = Arc::new(HttpTarget::new(client, plan.url.clone()));

    execute(&plan, target).await
}
