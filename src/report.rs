use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Analysis report
// ============================================================================

/// The accumulated analysis record. Built empty, filled pass by pass, then
/// finalized once by `analysis::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub project_id: String,
    pub timestamp: DateTime<Utc>,
    pub directory: String,

    // Structure
    pub language: String,
    pub framework: String,
    pub dependencies: Vec<String>,
    pub api_endpoints: i64,
    pub stateless_functions: i64,
    pub background_jobs: Vec<String>,
    pub file_uploads: bool,

    // Data access
    pub database_calls: i64,
    pub complexity_score: i64,
    pub cache_usage: Vec<String>,

    // Risks
    pub scaling_bottlenecks: Vec<Bottleneck>,
    pub security_issues: Vec<SecurityIssue>,

    pub performance: PerformanceMetrics,
    pub resource_usage: ResourceEstimate,

    /// Derived by the normalizer only.
    pub estimated_users: i64,
}

impl Report {
    pub fn new(project_id: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            timestamp: Utc::now(),
            directory: directory.into(),
            language: String::new(),
            framework: String::new(),
            dependencies: Vec::new(),
            api_endpoints: 0,
            stateless_functions: 0,
            background_jobs: Vec::new(),
            file_uploads: false,
            database_calls: 0,
            complexity_score: 0,
            cache_usage: Vec::new(),
            scaling_bottlenecks: Vec::new(),
            security_issues: Vec::new(),
            performance: PerformanceMetrics::default(),
            resource_usage: ResourceEstimate::default(),
            estimated_users: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub memory_mb: i64,
    pub cpu_cores: f64,
    pub database_connections: i64,
    pub network_mbps: i64,
    pub storage_gb: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_response_time_ms: i64,
    pub database_queries_per_request: i64,
    pub cache_hit_rate_percent: i64,
    pub has_n_plus_one_query: bool,
    pub has_large_payloads: bool,
}

// ============================================================================
// Findings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckCategory {
    Database,
    Cpu,
    Memory,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BottleneckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BottleneckCategory::Database => "database",
            BottleneckCategory::Cpu => "cpu",
            BottleneckCategory::Memory => "memory",
            BottleneckCategory::Network => "network",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    #[serde(rename = "type")]
    pub category: BottleneckCategory,
    pub description: String,
    pub severity: Severity,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityIssue {
    #[serde(rename = "type")]
    pub category: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_empty() {
        let report = Report::new("proj_1", "/tmp/app");
        assert_eq!(report.project_id, "proj_1");
        assert_eq!(report.directory, "/tmp/app");
        assert!(report.language.is_empty());
        assert_eq!(report.complexity_score, 0);
        assert_eq!(report.estimated_users, 0);
        assert!(report.scaling_bottlenecks.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let mut report = Report::new("proj_1", "/tmp/app");
        report.scaling_bottlenecks.push(Bottleneck {
            category: BottleneckCategory::Database,
            description: "slow queries".to_string(),
            severity: Severity::High,
            impact: "latency".to_string(),
        });
        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("stateless_functions").is_some());
        assert_eq!(value["scaling_bottlenecks"][0]["type"], "database");
        assert_eq!(value["scaling_bottlenecks"][0]["severity"], "high");
        assert!(value["resource_usage"].get("database_connections").is_some());
        assert!(value["performance"].get("has_n_plus_one_query").is_some());
        assert!(value["performance"].get("cache_hit_rate_percent").is_some());
    }

    #[test]
    fn test_security_issue_omits_missing_location() {
        let issue = SecurityIssue {
            category: "injection".to_string(),
            description: "raw SQL".to_string(),
            severity: Severity::Critical,
            line: None,
            file: None,
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert!(value.get("line").is_none());
        assert!(value.get("file").is_none());
        assert_eq!(value["type"], "injection");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }
}
