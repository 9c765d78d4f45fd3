use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TRIAL_WARNING_DAYS;

pub const TIER_TRIAL: &str = "trial";
pub const TIER_STARTER: &str = "starter";
pub const TIER_PROFESSIONAL: &str = "professional";
pub const TIER_ENTERPRISE: &str = "enterprise";

/// `analyses_limit` value for plans without a cap.
pub const UNLIMITED_ANALYSES: i64 = -1;

/// Subscription record as served by `GET /v1/subscription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub tier: String,
    pub status: String,
    pub analyses_used: i64,
    pub analyses_limit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_trialing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

impl SubscriptionInfo {
    pub fn is_trial(&self) -> bool {
        self.tier == TIER_TRIAL
    }

    pub fn is_unlimited(&self) -> bool {
        self.analyses_limit == UNLIMITED_ANALYSES
    }

    /// `used/limit`, or `used (unlimited)` for uncapped plans.
    pub fn usage_label(&self) -> String {
        if self.is_unlimited() {
            format!("{} (unlimited)", self.analyses_used)
        } else {
            format!("{}/{}", self.analyses_used, self.analyses_limit)
        }
    }

    /// Days left in the trial: the server's figure when present, otherwise
    /// derived from `trial_ends_at`.
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.days_remaining
            .or_else(|| self.trial_ends_at.map(|end| (end - now).num_days().max(0)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuotaDecision {
    Allowed,
    /// Allowed, but the trial is about to end.
    TrialEndingSoon { days_left: i64 },
    /// Trial analyses used up.
    TrialExhausted { days_left: Option<i64> },
}

/// Decide whether the CLI may start an analysis. Paid tiers are never gated
/// here; the server enforces their quotas.
pub fn check_quota(info: &SubscriptionInfo, now: DateTime<Utc>) -> QuotaDecision {
    if !info.is_trial() {
        return QuotaDecision::Allowed;
    }

    let days_left = info.days_left(now);
    if !info.is_unlimited() && info.analyses_used >= info.analyses_limit {
        return QuotaDecision::TrialExhausted { days_left };
    }

    match days_left {
        Some(days) if days <= TRIAL_WARNING_DAYS => QuotaDecision::TrialEndingSoon { days_left: days },
        _ => QuotaDecision::Allowed,
    }
}
