use std::fmt::Write;

use crate::aggregator::ResultSnapshot;
use crate::dispatcher::WorkPlan;

pub fn render_banner(plan: &WorkPlan) -> String {
    format!(
        "Starting load test for URL: {}\nTotal requests: {}\nConcurrency: {}\n",
        plan.url, plan.total_requests, plan.concurrency
    )
}

/// Plain-text summary printed once the run is finalized.
pub fn render_report(snapshot: &ResultSnapshot) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "\n--- Load Test Report ---");
    let _ = writeln!(out, "Total execution time: {:?}", snapshot.total_elapsed);
    let _ = writeln!(out, "Total requests: {}", snapshot.total_requests);
    let _ = writeln!(out, "Requests with status 200: {}", snapshot.status_200);
    let _ = writeln!(out, "Other HTTP statuses:");

    let mut codes: Vec<_> = snapshot.other_statuses.iter().collect();
    codes.sort();
    for (code, count) in codes {
        let _ = writeln!(out, "  Status {}: {}", code, count);
    }

    if snapshot.transport_errors > 0 {
        let _ = writeln!(out, "Requests without a response: {}", snapshot.transport_errors);
    }
    let _ = writeln!(out, "------------------------");

    out
}
