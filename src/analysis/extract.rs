//! Best-effort extraction of structured values from free-form tool output.
//!
//! Every function here is total: a miss yields a documented default, never an
//! error. Callers treat `0` / `0.0` as "not found".

use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::debug;

use crate::report::{Bottleneck, BottleneckCategory, Severity};

pub const DEFAULT_COMPLEXITY: i64 = 50;

const COMPLEXITY_KEYWORD_FIRST: &str = r"(?:complexity|score).*?(\d+)";
const COMPLEXITY_NUMBER_FIRST: &str = r"(\d+).*(?:complexity|score)";

/// Known cache technologies: (reported name, substrings that indicate it).
/// Output order follows this table.
const CACHE_VOCABULARY: &[(&str, &[&str])] = &[
    ("redis", &["redis"]),
    ("memcached", &["memcached"]),
    (
        "in-process cache",
        &["in-process cache", "in-memory cache", "memory cache"],
    ),
    ("cdn", &["cdn"]),
    ("browser cache", &["browser cache"]),
];

/// Languages in priority order: (whole word to look for, display name).
const LANGUAGES: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("python", "Python"),
    ("go", "Go"),
    ("java", "Java"),
    ("php", "PHP"),
    ("ruby", "Ruby"),
    ("typescript", "TypeScript"),
];

const FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("express", "Express"),
    ("fastapi", "FastAPI"),
    ("django", "Django"),
    ("gin", "Gin"),
    ("echo", "Echo"),
];

const DATABASE_TROUBLE_WORDS: &[&str] = &["slow", "bottleneck", "limit"];
const DATABASE_IMPACT: &str = "May cause slow response times under load";
const MEMORY_LEAK_IMPACT: &str = "Could cause application crashes";

static LANGUAGE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| word_patterns(LANGUAGES));

static FRAMEWORK_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| word_patterns(FRAMEWORKS));

fn word_patterns(vocabulary: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    vocabulary
        .iter()
        .filter_map(|(word, name)| {
            Regex::new(&format!(r"\b{}\b", regex::escape(word)))
                .ok()
                .map(|re| (re, *name))
        })
        .collect()
}

/// Case-insensitive extraction regex. Only called on literal patterns held in
/// `LazyLock` statics.
pub(crate) fn extraction_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

static COMPLEXITY_KEYWORD_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| extraction_regex(COMPLEXITY_KEYWORD_FIRST));

static COMPLEXITY_NUMBER_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| extraction_regex(COMPLEXITY_NUMBER_FIRST));

/// First capture group that participated in the leftmost match of `re`.
fn first_capture<'t>(text: &'t str, re: &Regex) -> Option<&'t str> {
    let caps = re.captures(text)?;
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// First integer captured by a precompiled pattern, or 0.
pub fn capture_integer(text: &str, re: &Regex) -> i64 {
    first_capture(text, re)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

/// First finite decimal captured by a precompiled pattern, or 0.0.
pub fn capture_float(text: &str, re: &Regex) -> f64 {
    first_capture(text, re)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Extraction pattern {:?} does not compile: {}", pattern, e);
            None
        }
    }
}

/// First integer captured by `pattern`, or 0. An invalid pattern is a miss.
pub fn extract_integer(text: &str, pattern: &str) -> i64 {
    compile(pattern).map_or(0, |re| capture_integer(text, &re))
}

/// First decimal captured by `pattern`, or 0.0.
pub fn extract_float(text: &str, pattern: &str) -> f64 {
    compile(pattern).map_or(0.0, |re| capture_float(text, &re))
}

/// Complexity score in [1, 100]; 50 when absent or out of range.
pub fn extract_complexity(text: &str) -> i64 {
    let mut score = capture_integer(text, &COMPLEXITY_KEYWORD_FIRST_RE);
    if score == 0 {
        score = capture_integer(text, &COMPLEXITY_NUMBER_FIRST_RE);
    }
    if (1..=100).contains(&score) {
        score
    } else {
        DEFAULT_COMPLEXITY
    }
}

pub fn extract_cache_technologies(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    CACHE_VOCABULARY
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// First of critical/high/medium mentioned, else low.
pub fn extract_severity(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if lower.contains("critical") {
        Severity::Critical
    } else if lower.contains("high") {
        Severity::High
    } else if lower.contains("medium") {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Line-oriented bottleneck scan. Only two shapes are recognized; anything
/// else is dropped.
pub fn extract_bottlenecks(text: &str) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        if lower.contains("database")
            && DATABASE_TROUBLE_WORDS.iter().any(|w| lower.contains(w))
        {
            bottlenecks.push(Bottleneck {
                category: BottleneckCategory::Database,
                description: line.to_string(),
                severity: extract_severity(line),
                impact: DATABASE_IMPACT.to_string(),
            });
        }

        if lower.contains("memory") && lower.contains("leak") {
            bottlenecks.push(Bottleneck {
                category: BottleneckCategory::Memory,
                description: line.to_string(),
                severity: Severity::High,
                impact: MEMORY_LEAK_IMPACT.to_string(),
            });
        }
    }

    bottlenecks
}

pub fn detect_language(text: &str) -> Option<&'static str> {
    detect_word(&LANGUAGE_PATTERNS, text)
}

pub fn detect_framework(text: &str) -> Option<&'static str> {
    detect_word(&FRAMEWORK_PATTERNS, text)
}

fn detect_word(patterns: &[(Regex, &'static str)], text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    patterns
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map(|(_, name)| *name)
}

/// True if the lowercased text contains any of `needles`.
pub fn mentions_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Decode a structured payload from tool output. Tries the whole trimmed text
/// first, then the first complete JSON value starting at each `{` in turn
/// (payloads often arrive wrapped in prose or markdown fences, and the prose
/// may itself contain braces).
pub fn extract_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Some(value);
    }

    for (start, _) in trimmed.match_indices('{') {
        let mut values = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<T>();
        match values.next() {
            Some(Ok(value)) => return Some(value),
            Some(Err(e)) => debug!("No structured payload at offset {}: {}", start, e),
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB_CALLS: &str = r"(\d+).*(?:database|query)";

    #[test]
    fn test_extract_integer_first_match_wins() {
        let text = "Found 37 database calls, 12 query builders";
        assert_eq!(extract_integer(text, DB_CALLS), 37);
    }

    #[test]
    fn test_extract_integer_case_insensitive() {
        assert_eq!(extract_integer("9 DATABASE handles", DB_CALLS), 9);
    }

    #[test]
    fn test_extract_integer_miss_is_zero() {
        assert_eq!(extract_integer("no numbers at all", DB_CALLS), 0);
        assert_eq!(extract_integer("", DB_CALLS), 0);
    }

    #[test]
    fn test_extract_integer_overflow_is_zero() {
        let text = "99999999999999999999999 database rows";
        assert_eq!(extract_integer(text, DB_CALLS), 0);
    }

    #[test]
    fn test_extract_integer_bad_pattern_is_zero() {
        assert_eq!(extract_integer("12 database", r"(\d+"), 0);
    }

    #[test]
    fn test_extract_integer_second_alternative() {
        let pattern = r"(\d+).*MB|(\d+).*memory";
        assert_eq!(extract_integer("about 768 of memory", pattern), 768);
        assert_eq!(extract_integer("512 MB heap", pattern), 512);
    }

    #[test]
    fn test_extract_float() {
        let pattern = r"(\d+(?:\.\d+)?).*(?:core|cpu)";
        assert_eq!(extract_float("Needs 2.5 CPU cores", pattern), 2.5);
        assert_eq!(extract_float("Needs 3 cores", pattern), 3.0);
        assert_eq!(extract_float("unknown", pattern), 0.0);
    }

    #[test]
    fn test_extract_complexity() {
        assert_eq!(extract_complexity("complexity score: 72"), 72);
        assert_eq!(extract_complexity("I'd rate it 65 on the complexity scale"), 65);
        assert_eq!(extract_complexity("nothing to see"), DEFAULT_COMPLEXITY);
        assert_eq!(extract_complexity("complexity: 250"), DEFAULT_COMPLEXITY);
        assert_eq!(extract_complexity("complexity: 0"), DEFAULT_COMPLEXITY);
    }

    #[test]
    fn test_cache_technologies_follow_vocabulary_order() {
        let text = "We use a CDN in front, Memcached for sessions and Redis for jobs.";
        assert_eq!(
            extract_cache_technologies(text),
            vec!["redis", "memcached", "cdn"]
        );
    }

    #[test]
    fn test_cache_in_process_aliases() {
        assert_eq!(
            extract_cache_technologies("an in-memory cache for lookups"),
            vec!["in-process cache"]
        );
        assert!(extract_cache_technologies("no caching").is_empty());
    }

    #[test]
    fn test_extract_severity_priority() {
        assert_eq!(extract_severity("high and critical"), Severity::Critical);
        assert_eq!(extract_severity("HIGH load"), Severity::High);
        assert_eq!(extract_severity("medium risk"), Severity::Medium);
        assert_eq!(extract_severity("minor"), Severity::Low);
    }

    #[test]
    fn test_extract_bottlenecks() {
        let text = "\
- Database connection limit reached under load (critical)
- CPU usage is fine
- Possible memory leak in the image cache

- slow database queries on /search, medium";
        let found = extract_bottlenecks(text);
        assert_eq!(found.len(), 3);

        assert_eq!(found[0].category, BottleneckCategory::Database);
        assert_eq!(found[0].severity, Severity::Critical);
        assert_eq!(found[1].category, BottleneckCategory::Memory);
        assert_eq!(found[1].severity, Severity::High);
        assert_eq!(found[2].severity, Severity::Medium);
        assert!(found[2].description.starts_with("- slow database"));
    }

    #[test]
    fn test_extract_bottlenecks_line_can_match_twice() {
        let found = extract_bottlenecks("database is slow and there is a memory leak");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_detect_language_priority_and_words() {
        assert_eq!(
            detect_language("A Python service with some JavaScript"),
            Some("JavaScript")
        );
        assert_eq!(detect_language("Written in Go."), Some("Go"));
        assert_eq!(detect_language("a good algorithm"), None);
        assert_eq!(detect_framework("uses FastAPI and Django"), Some("FastAPI"));
    }

    #[test]
    fn test_extract_structured_wrapped() {
        #[derive(serde::Deserialize)]
        struct Payload {
            language: String,
        }
        let raw = "Here you go:\n```json\n{\"language\": \"Rust\"}\n```";
        let payload: Payload = extract_structured(raw).unwrap();
        assert_eq!(payload.language, "Rust");

        assert!(extract_structured::<Payload>("no json here").is_none());
        assert!(extract_structured::<Payload>("} backwards {").is_none());
    }

    #[test]
    fn test_extract_structured_ignores_braces_in_trailing_prose() {
        #[derive(serde::Deserialize)]
        struct Payload {
            framework: String,
            api_endpoints: i64,
        }
        let raw = "```json\n{\"language\":\"Go\",\"framework\":\"Gin\",\"api_endpoints\":12}\n```\nRoutes use `/users/{id}` params.";
        let payload: Payload = extract_structured(raw).unwrap();
        assert_eq!(payload.framework, "Gin");
        assert_eq!(payload.api_endpoints, 12);
    }

    #[test]
    fn test_extract_structured_skips_braces_in_leading_prose() {
        #[derive(serde::Deserialize)]
        struct Payload {
            language: String,
        }
        let raw = "The handler at `/items/{id}` is busy. Result: {\"language\": \"Python\"}";
        let payload: Payload = extract_structured(raw).unwrap();
        assert_eq!(payload.language, "Python");
    }

    #[test]
    fn test_capture_with_precompiled_pattern() {
        let re = extraction_regex(r"(\d+).*MB|(\d+).*memory");
        assert_eq!(capture_integer("about 768 of MEMORY", &re), 768);
        let cpu = extraction_regex(r"(\d+(?:\.\d+)?).*(?:core|cpu)");
        assert_eq!(capture_float("1.5 CPU", &cpu), 1.5);
        assert_eq!(capture_float("none", &cpu), 0.0);
    }
}
