use cloudpork_agent::analysis::normalize::{
    CPU_CORES_RANGE, DB_CONNECTIONS_RANGE, ESTIMATED_USERS_RANGE, MEMORY_MB_RANGE,
};
use cloudpork_agent::analysis::{normalize, Orchestrator, PassRunner};
use cloudpork_agent::error::AgentError;
use cloudpork_agent::report::{BottleneckCategory, Report, Severity};
use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;

/// Runner that replays canned outputs, one per pass, and records what it was
/// asked.
struct ScriptedRunner {
    available: bool,
    outputs: Mutex<VecDeque<Result<String, AgentError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn new(outputs: Vec<Result<String, AgentError>>) -> Self {
        Self {
            available: true,
            outputs: Mutex::new(outputs.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn ok(outputs: &[&str]) -> Self {
        Self::new(outputs.iter().map(|s| Ok(s.to_string())).collect())
    }

    fn unavailable() -> Self {
        let mut runner = Self::ok(&[]);
        runner.available = false;
        runner
    }

    fn calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl PassRunner for &ScriptedRunner {
    fn tool_name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn run_pass(
        &self,
        instruction: &str,
        _directory: &Path,
    ) -> impl Future<Output = Result<String, AgentError>> + Send {
        self.seen.lock().unwrap().push(instruction.to_string());
        let next = self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()));
        async move { next }
    }
}

const GO_GIN: &str = r#"{"language":"Go","framework":"Gin","dependencies":["gin"],"api_endpoints":3,"background_jobs":[],"file_uploads":false}"#;

async fn analyze(runner: &ScriptedRunner) -> Result<Report, AgentError> {
    Orchestrator::new(runner, "/srv/app", "proj_pipeline")
        .analyze()
        .await
}

#[tokio::test]
async fn test_full_pipeline() {
    let runner = ScriptedRunner::ok(&[
        GO_GIN,
        "Found 37 database calls and complexity score: 72. Uses Redis for caching.",
        "Database connection limits are a HIGH risk.\nLarge payload responses on /export.",
        "",
    ]);
    let report = analyze(&runner).await.unwrap();

    assert_eq!(report.project_id, "proj_pipeline");
    assert_eq!(report.directory, "/srv/app");
    assert_eq!(report.language, "Go");
    assert_eq!(report.framework, "Gin");
    assert_eq!(report.api_endpoints, 3);
    assert_eq!(report.database_calls, 37);
    assert_eq!(report.complexity_score, 72);
    assert_eq!(report.cache_usage, vec!["redis"]);

    assert_eq!(report.scaling_bottlenecks.len(), 1);
    let bottleneck = &report.scaling_bottlenecks[0];
    assert_eq!(bottleneck.category, BottleneckCategory::Database);
    assert_eq!(bottleneck.severity, Severity::High);
    assert!(report.performance.has_large_payloads);

    // Nothing extracted in pass 4: memory and CPU come from the bands.
    assert_eq!(report.resource_usage.memory_mb, 1024);
    assert_eq!(report.resource_usage.cpu_cores, 0.5);
    assert_eq!(report.resource_usage.database_connections, 1);
    assert_eq!(report.estimated_users, 720);

    let calls = runner.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[3].contains("Go/Gin application with 3 API endpoints"));
    assert!(calls[3].contains("complexity score of 72"));
}

#[tokio::test]
async fn test_high_complexity_band_fallback() {
    let runner = ScriptedRunner::ok(&[GO_GIN, "Complexity: 85", "", "no numbers here"]);
    let report = analyze(&runner).await.unwrap();

    assert_eq!(report.complexity_score, 85);
    assert_eq!(report.resource_usage.memory_mb, 2048);
    assert_eq!(report.resource_usage.cpu_cores, 0.5);
}

#[tokio::test]
async fn test_unstructured_output_still_produces_bounded_report() {
    let runner = ScriptedRunner::ok(&["", "", "", ""]);
    let report = analyze(&runner).await.unwrap();

    assert_eq!(report.language, "Unknown");
    assert_eq!(report.framework, "Unknown");
    assert_eq!(report.api_endpoints, 5);
    assert_eq!(report.complexity_score, 50);

    let res = &report.resource_usage;
    assert!((MEMORY_MB_RANGE.0..=MEMORY_MB_RANGE.1).contains(&res.memory_mb));
    assert!(res.cpu_cores >= CPU_CORES_RANGE.0 && res.cpu_cores <= CPU_CORES_RANGE.1);
    assert!(
        (DB_CONNECTIONS_RANGE.0..=DB_CONNECTIONS_RANGE.1).contains(&res.database_connections)
    );
    assert!(
        (ESTIMATED_USERS_RANGE.0..=ESTIMATED_USERS_RANGE.1).contains(&report.estimated_users)
    );
}

#[tokio::test]
async fn test_extracted_resources_are_clamped() {
    let runner = ScriptedRunner::ok(&[
        GO_GIN,
        "",
        "",
        "Needs 99999 MB of RAM, 64 cpu cores, 5000 connections, 20000 Mbps and 0 GB storage.",
    ]);
    // Every pattern anchors on the leftmost number, so all five read 99999.
    let report = analyze(&runner).await.unwrap();
    let res = &report.resource_usage;
    assert_eq!(res.memory_mb, MEMORY_MB_RANGE.1);
    assert_eq!(res.cpu_cores, CPU_CORES_RANGE.1);
    assert_eq!(res.database_connections, DB_CONNECTIONS_RANGE.1);
    assert_eq!(res.network_mbps, 10_000);
    assert_eq!(res.storage_gb, 10_000);
}

#[tokio::test]
async fn test_normalize_is_idempotent_on_pipeline_output() {
    let runner = ScriptedRunner::ok(&[GO_GIN, "complexity 95, 400 queries", "", ""]);
    let report = analyze(&runner).await.unwrap();
    assert_eq!(normalize(report.clone()), report);
}

#[tokio::test]
async fn test_failing_pass_aborts_without_report() {
    let runner = ScriptedRunner::new(vec![
        Ok(GO_GIN.to_string()),
        Ok("complexity 40".to_string()),
        Err(AgentError::ToolInvocation {
            status: "exit status: 2".to_string(),
            output: "rate limited".to_string(),
        }),
        Ok(String::new()),
    ]);

    match analyze(&runner).await {
        Err(AgentError::ToolInvocation { output, .. }) => assert_eq!(output, "rate limited"),
        other => panic!("expected ToolInvocation, got {:?}", other),
    }
    // Pass 4 never ran.
    assert_eq!(runner.calls().len(), 3);
}

#[tokio::test]
async fn test_unavailable_tool_runs_no_pass() {
    let runner = ScriptedRunner::unavailable();
    match analyze(&runner).await {
        Err(e @ AgentError::ToolUnavailable(_)) => {
            assert!(e.is_tool_failure());
            assert!(e.to_string().contains("scripted"));
        }
        other => panic!("expected ToolUnavailable, got {:?}", other),
    }
    assert!(runner.calls().is_empty());
}
