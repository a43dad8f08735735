//! Shared tallies for one run.
//!
//! Every counter lives behind a single mutex so that the 200 count and the
//! per-status breakdown always describe the same set of recorded outcomes.

use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{LoadTestError, Result};
use crate::tasks::Outcome;

/// Final, read-only view of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSnapshot {
    pub total_requests: usize,
    pub status_200: u64,
    /// Only codes that were actually observed appear here.
    pub other_statuses: HashMap<u16, u64>,
    /// Calls that never produced a response. Kept apart from the status
    /// buckets, which therefore may sum to less than `total_requests`.
    pub transport_errors: u64,
    pub total_elapsed: Duration,
}

impl ResultSnapshot {
    /// Number of outcomes that carried an HTTP status.
    pub fn with_status(&self) -> u64 {
        self.status_200 + self.other_statuses.values().sum::<u64>()
    }

    /// Outcomes of any kind, status or transport error.
    pub fn recorded(&self) -> u64 {
        self.with_status() + self.transport_errors
    }
}

#[derive(Debug, Default)]
struct Tally {
    status_200: u64,
    other_statuses: HashMap<u16, u64>,
    transport_errors: u64,
    finalized: bool,
}

impl Tally {
    fn recorded(&self) -> u64 {
        self.status_200 + self.other_statuses.values().sum::<u64>() + self.transport_errors
    }
}

#[derive(Debug)]
pub struct Aggregator {
    total_requests: usize,
    tally: Mutex<Tally>,
}

impl Aggregator {
    pub fn new(total_requests: usize) -> Self {
        Aggregator {
            total_requests,
            tally: Mutex::new(Tally::default()),
        }
    }

    /// Classifies one outcome. Safe to call from any number of units at once.
    pub async fn record(&self, outcome: Outcome) -> Result<()> {
        let mut tally = self.tally.lock().await;
        if tally.finalized {
            return Err(LoadTestError::AlreadyFinalized);
        }

        match outcome {
            Outcome::Status(200) => tally.status_200 += 1,
            Outcome::Status(code) => *tally.other_statuses.entry(code).or_insert(0) += 1,
            Outcome::TransportError(reason) => {
                debug!("Transport error recorded: {}", reason);
                tally.transport_errors += 1;
            }
        }

        Ok(())
    }

    /// Outcomes recorded so far.
    pub async fn recorded(&self) -> u64 {
        self.tally.lock().await.recorded()
    }

    /// Stamps the elapsed time and closes the aggregator. Must be called once,
    /// after every dispatch unit has been joined.
    pub async fn finalize(&self, elapsed: Duration) -> Result<ResultSnapshot> {
        let mut tally = self.tally.lock().await;
        if tally.finalized {
            return Err(LoadTestError::AlreadyFinalized);
        }
        tally.finalized = true;

        Ok(ResultSnapshot {
            total_requests: self.total_requests,
            status_200: tally.status_200,
            other_statuses: tally.other_statuses.clone(),
            transport_errors: tally.transport_errors,
            total_elapsed: elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn classifies_outcomes() {
        let aggregator = Aggregator::new(6);
        for outcome in [
            Outcome::Status(200),
            Outcome::Status(200),
            Outcome::Status(404),
            Outcome::Status(503),
            Outcome::Status(404),
            Outcome::TransportError("connection refused".into()),
        ] {
            aggregator.record(outcome).await.unwrap();
        }
        assert_eq!(aggregator.recorded().await, 6);

        let snapshot = aggregator.finalize(Duration::from_millis(5)).await.unwrap();
        assert_eq!(snapshot.total_requests, 6);
        assert_eq!(snapshot.status_200, 2);
        assert_eq!(snapshot.other_statuses.get(&404), Some(&2));
        assert_eq!(snapshot.other_statuses.get(&503), Some(&1));
        assert_eq!(snapshot.other_statuses.len(), 2);
        assert_eq!(snapshot.transport_errors, 1);
        assert_eq!(snapshot.with_status(), 5);
        assert_eq!(snapshot.recorded(), 6);
        assert_eq!(snapshot.total_elapsed, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn only_observed_codes_get_an_entry() {
        let aggregator = Aggregator::new(3);
        for _ in 0..3 {
            aggregator.record(Outcome::Status(200)).await.unwrap();
        }
        let snapshot = aggregator.finalize(Duration::ZERO).await.unwrap();
        assert_eq!(snapshot.status_200, 3);
        assert!(snapshot.other_statuses.is_empty());
    }

    #[tokio::test]
    async fn record_after_finalize_is_rejected() {
        let aggregator = Aggregator::new(1);
        aggregator.record(Outcome::Status(200)).await.unwrap();
        aggregator.finalize(Duration::ZERO).await.unwrap();

        let err = aggregator.record(Outcome::Status(200)).await.unwrap_err();
        assert!(matches!(err, LoadTestError::AlreadyFinalized));
        assert!(matches!(
            aggregator.finalize(Duration::ZERO).await,
            Err(LoadTestError::AlreadyFinalized)
        ));
        assert_eq!(aggregator.recorded().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_not_lost() {
        let aggregator = Arc::new(Aggregator::new(10_000));

        let handles: Vec<_> = (0..10_000)
            .map(|i| {
                let aggregator = aggregator.clone();
                tokio::spawn(async move {
                    let code = if i % 2 == 0 { 200 } else { 500 };
                    aggregator.record(Outcome::Status(code)).await
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            handle.unwrap().unwrap();
        }

        let snapshot = aggregator.finalize(Duration::ZERO).await.unwrap();
        assert_eq!(snapshot.status_200, 5_000);
        assert_eq!(snapshot.other_statuses.get(&500), Some(&5_000));
    }
}
