use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use super::bands::{cpu_for_endpoints, memory_for_complexity};
use super::extract::{
    capture_float, capture_integer, detect_framework, detect_language, extract_bottlenecks,
    extract_cache_technologies, extract_complexity, extract_structured, extraction_regex,
    mentions_any,
};
use crate::report::Report;

pub const DEFAULT_ENDPOINTS: i64 = 5;

const ENDPOINTS_PATTERN: &str = r"(\d+).*(?:endpoint|route|api)";
const DATABASE_CALLS_PATTERN: &str = r"(\d+).*(?:database|query)";
const MEMORY_PATTERN: &str = r"(\d+).*MB|(\d+).*memory";
const CPU_PATTERN: &str = r"(\d+(?:\.\d+)?).*(?:core|cpu)";
const CONNECTIONS_PATTERN: &str = r"(\d+).*(?:connection|conn)";
const BANDWIDTH_PATTERN: &str = r"(\d+).*(?:Mbps|bandwidth)";
const STORAGE_PATTERN: &str = r"(\d+).*(?:GB|storage)";

static ENDPOINTS_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(ENDPOINTS_PATTERN));
static DATABASE_CALLS_RE: LazyLock<Regex> =
    LazyLock::new(|| extraction_regex(DATABASE_CALLS_PATTERN));
static MEMORY_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(MEMORY_PATTERN));
static CPU_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(CPU_PATTERN));
static CONNECTIONS_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(CONNECTIONS_PATTERN));
static BANDWIDTH_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(BANDWIDTH_PATTERN));
static STORAGE_RE: LazyLock<Regex> = LazyLock::new(|| extraction_regex(STORAGE_PATTERN));

const N_PLUS_ONE_MARKERS: &[&str] = &["n+1", "n plus one"];
const LARGE_PAYLOAD_MARKERS: &[&str] = &["large payload"];

const STRUCTURE_PROMPT: &str = r#"Analyze this codebase and identify:
1. Primary programming language
2. Web framework being used
3. Key dependencies and libraries
4. Number of API endpoints/routes
5. Background job processing (if any)
6. File upload capabilities

Respond in this JSON format:
{
  "language": "string",
  "framework": "string",
  "dependencies": ["dep1", "dep2"],
  "api_endpoints": number,
  "background_jobs": ["job1", "job2"],
  "file_uploads": boolean
}"#;

const DATABASE_API_PROMPT: &str = "Analyze database and API patterns in this codebase:
1. Count database queries/calls
2. Identify database connection patterns
3. Look for N+1 query problems
4. Find caching usage (Redis, Memcached, etc.)
5. Estimate complexity on a scale of 1-100

Focus on scalability concerns and potential bottlenecks.";

const PERFORMANCE_PROMPT: &str = "Identify scaling bottlenecks and performance issues:
1. Database connection limits
2. Memory-intensive operations
3. CPU-heavy computations
4. Network bottlenecks
5. Synchronous operations that should be async
6. Large payload responses

For each issue, specify type (database/cpu/memory/network) and severity (low/medium/high/critical).";

/// The four analysis passes, in the order they must run. Resource estimation
/// reads what the first three wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Structure,
    DatabaseApi,
    PerformanceScaling,
    ResourceEstimation,
}

impl Pass {
    pub const ALL: [Pass; 4] = [
        Pass::Structure,
        Pass::DatabaseApi,
        Pass::PerformanceScaling,
        Pass::ResourceEstimation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pass::Structure => "structure",
            Pass::DatabaseApi => "database/API",
            Pass::PerformanceScaling => "performance/scaling",
            Pass::ResourceEstimation => "resource estimation",
        }
    }

    pub fn instruction(&self, report: &Report) -> String {
        match self {
            Pass::Structure => STRUCTURE_PROMPT.to_string(),
            Pass::DatabaseApi => DATABASE_API_PROMPT.to_string(),
            Pass::PerformanceScaling => PERFORMANCE_PROMPT.to_string(),
            Pass::ResourceEstimation => resource_prompt(report),
        }
    }

    pub fn apply(&self, report: Report, output: &str) -> Report {
        match self {
            Pass::Structure => apply_structure(report, output),
            Pass::DatabaseApi => apply_database_api(report, output),
            Pass::PerformanceScaling => apply_performance(report, output),
            Pass::ResourceEstimation => apply_resources(report, output),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn resource_prompt(report: &Report) -> String {
    format!(
        "Based on this {language}/{framework} application with {endpoints} API endpoints and {jobs} background jobs:

Estimate resource requirements for 1000 concurrent users:
1. Memory usage in MB
2. CPU cores needed
3. Database connections required
4. Network bandwidth in Mbps
5. Storage requirements in GB

Consider the complexity score of {complexity} and provide realistic estimates.",
        language = report.language,
        framework = report.framework,
        endpoints = report.api_endpoints,
        jobs = report.background_jobs.len(),
        complexity = report.complexity_score,
    )
}

// ============================================================================
// Pass 1: structure
// ============================================================================

// Models answer "(if any)" questions with `null` as often as with `[]`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructurePayload {
    #[serde(deserialize_with = "null_as_default")]
    language: String,
    #[serde(deserialize_with = "null_as_default")]
    framework: String,
    #[serde(deserialize_with = "null_as_default")]
    dependencies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    api_endpoints: i64,
    #[serde(deserialize_with = "null_as_default")]
    background_jobs: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    file_uploads: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn apply_structure(mut report: Report, output: &str) -> Report {
    if let Some(payload) = extract_structured::<StructurePayload>(output) {
        report.language = payload.language;
        report.framework = payload.framework;
        report.dependencies = payload.dependencies;
        report.api_endpoints = payload.api_endpoints;
        report.background_jobs = payload.background_jobs;
        report.file_uploads = payload.file_uploads;
        return report;
    }

    debug!("Structure pass: falling back to heuristics");
    if let Some(language) = detect_language(output) {
        report.language = language.to_string();
    }
    if let Some(framework) = detect_framework(output) {
        report.framework = framework.to_string();
    }
    report.api_endpoints = match capture_integer(output, &ENDPOINTS_RE) {
        0 => DEFAULT_ENDPOINTS,
        n => n,
    };
    report
}

// ============================================================================
// Pass 2: database / API
// ============================================================================

pub fn apply_database_api(mut report: Report, output: &str) -> Report {
    report.database_calls = capture_integer(output, &DATABASE_CALLS_RE);
    report.complexity_score = extract_complexity(output);
    report.cache_usage = extract_cache_technologies(output);
    report.performance.has_n_plus_one_query = mentions_any(output, N_PLUS_ONE_MARKERS);
    report
}

// ============================================================================
// Pass 3: performance / scaling
// ============================================================================

pub fn apply_performance(mut report: Report, output: &str) -> Report {
    report.scaling_bottlenecks = extract_bottlenecks(output);
    report.performance.has_large_payloads = mentions_any(output, LARGE_PAYLOAD_MARKERS);
    report
}

// ============================================================================
// Pass 4: resource estimation
// ============================================================================

pub fn apply_resources(mut report: Report, output: &str) -> Report {
    let resources = &mut report.resource_usage;
    resources.memory_mb = capture_integer(output, &MEMORY_RE);
    resources.cpu_cores = capture_float(output, &CPU_RE);
    resources.database_connections = capture_integer(output, &CONNECTIONS_RE);
    resources.network_mbps = capture_integer(output, &BANDWIDTH_RE);
    resources.storage_gb = capture_integer(output, &STORAGE_RE);

    if resources.memory_mb == 0 {
        resources.memory_mb = memory_for_complexity(report.complexity_score);
    }
    if resources.cpu_cores == 0.0 {
        resources.cpu_cores = cpu_for_endpoints(report.api_endpoints);
    }
    report
}
