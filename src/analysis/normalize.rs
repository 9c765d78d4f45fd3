//! Final defaulting and clamping. Runs once after all passes; never fails.

use crate::report::{Report, ResourceEstimate};

use super::extract::DEFAULT_COMPLEXITY;

pub const UNKNOWN: &str = "Unknown";

pub const COMPLEXITY_RANGE: (i64, i64) = (1, 100);
pub const MEMORY_MB_RANGE: (i64, i64) = (128, 16_384);
pub const CPU_CORES_RANGE: (f64, f64) = (0.1, 32.0);
pub const DB_CONNECTIONS_RANGE: (i64, i64) = (1, 1_000);
pub const NETWORK_MBPS_RANGE: (i64, i64) = (1, 10_000);
pub const STORAGE_GB_RANGE: (i64, i64) = (1, 10_000);
pub const ESTIMATED_USERS_RANGE: (i64, i64) = (100, 1_000_000);

const BASE_USERS: f64 = 1000.0;
const BACKGROUND_JOB_MULTIPLIER: f64 = 1.5;

pub fn normalize(mut report: Report) -> Report {
    if report.language.trim().is_empty() {
        report.language = UNKNOWN.to_string();
    }
    if report.framework.trim().is_empty() {
        report.framework = UNKNOWN.to_string();
    }
    if report.complexity_score == 0 {
        report.complexity_score = DEFAULT_COMPLEXITY;
    }
    report.complexity_score = clamp(report.complexity_score, COMPLEXITY_RANGE);

    clamp_resources(&mut report.resource_usage);
    report.estimated_users = estimate_users(&report);
    report
}

pub fn clamp_resources(resources: &mut ResourceEstimate) {
    resources.memory_mb = clamp(resources.memory_mb, MEMORY_MB_RANGE);
    resources.cpu_cores = if resources.cpu_cores.is_finite() {
        resources.cpu_cores.clamp(CPU_CORES_RANGE.0, CPU_CORES_RANGE.1)
    } else {
        CPU_CORES_RANGE.0
    };
    resources.database_connections = clamp(resources.database_connections, DB_CONNECTIONS_RANGE);
    resources.network_mbps = clamp(resources.network_mbps, NETWORK_MBPS_RANGE);
    resources.storage_gb = clamp(resources.storage_gb, STORAGE_GB_RANGE);
}

/// Order-of-magnitude user count from complexity, endpoints and background
/// jobs. Coarse on purpose; only used to seed cost projection.
pub fn estimate_users(report: &Report) -> i64 {
    let complexity = report.complexity_score as f64 / 50.0;
    let endpoints = (report.api_endpoints as f64 / 10.0).max(0.5);
    let jobs = if report.background_jobs.is_empty() {
        1.0
    } else {
        BACKGROUND_JOB_MULTIPLIER
    };

    let estimate = BASE_USERS * complexity * endpoints * jobs;
    let (lo, hi) = ESTIMATED_USERS_RANGE;
    if estimate.is_nan() {
        return lo;
    }
    // `as` saturates, so very large estimates still land on the ceiling.
    clamp(estimate as i64, (lo, hi))
}

fn clamp(value: i64, (lo, hi): (i64, i64)) -> i64 {
    value.clamp(lo, hi)
}
