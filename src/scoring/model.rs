//! Risk-weighted categorical reputation model

use super::curves::{clamped_ratio, exp_decay, log_curve, round_to};
use crate::models::{CategoryWeight, Cohort, Signals};
use tracing::debug;

/// Version of the scoring model, echoed in every report
pub const MODEL_VERSION: &str = "2.0.0";

// Category weights sum to 1.0
pub const CATEGORY_PROVENANCE_WEIGHT: f64 = 0.35;
pub const CATEGORY_IDENTITY_WEIGHT: f64 = 0.25;
pub const CATEGORY_ENGAGEMENT_WEIGHT: f64 = 0.25;
pub const CATEGORY_COMMUNITY_WEIGHT: f64 = 0.15;

// Identity split
const AGE_WEIGHT: f64 = 0.15;
const ORG_MEMBER_WEIGHT: f64 = 0.10;
const AGE_CEILING_DAYS: f64 = 730.0;

// Engagement split
const PROPORTION_WEIGHT: f64 = 0.15;
const RECENCY_WEIGHT: f64 = 0.10;
const RECENCY_HALF_LIFE_DAYS: f64 = 90.0;
const MIN_PROPORTION_CEILING: f64 = 0.05;
const COMMITS_PER_CONTRIBUTOR_FOR_CONFIDENCE: f64 = 10.0;
const MIN_CONFIDENCE_COMMITS: f64 = 30.0;

// Community split
const FOLLOWER_RATIO_WEIGHT: f64 = 0.10;
const REPO_COUNT_WEIGHT: f64 = 0.05;
const FOLLOWER_RATIO_CEILING: f64 = 10.0;
const REPO_COUNT_CEILING: f64 = 30.0;

// Provenance shaping
const PROVENANCE_STRONG_AUTH_FLOOR: f64 = 0.1;
const PROVENANCE_CONCENTRATION_DISCOUNT: f64 = 0.5;

/// The category table reported alongside every score
pub fn categories() -> Vec<CategoryWeight> {
    [
        ("code_provenance", CATEGORY_PROVENANCE_WEIGHT),
        ("identity", CATEGORY_IDENTITY_WEIGHT),
        ("engagement", CATEGORY_ENGAGEMENT_WEIGHT),
        ("community", CATEGORY_COMMUNITY_WEIGHT),
    ]
    .into_iter()
    .map(|(name, weight)| CategoryWeight {
        name: name.to_string(),
        weight,
    })
    .collect()
}

/// Score one author's signals against the cohort. Deterministic.
pub fn compute(signals: &Signals, cohort: Cohort) -> f64 {
    if signals.suspended {
        return 0.0;
    }

    let provenance = provenance(signals, cohort);
    let identity = identity(signals);
    let engagement = engagement(signals, cohort);
    let community = community(signals);

    let score = round_to(provenance + identity + engagement + community, 2);
    debug!(provenance, identity, engagement, community, score, "categorical score");

    // Weights are chosen so the sum cannot leave [0, 1]; a failure here is a
    // weight-tuning regression, not something to clamp away.
    debug_assert!(
        (0.0..=1.0).contains(&score),
        "score {} out of bounds for {:?}",
        score,
        signals
    );

    score
}

/// Share of total commits and the saturation point for that share
fn commit_share(signals: &Signals, cohort: Cohort) -> Option<(f64, f64)> {
    if signals.commits <= 0 || cohort.total_commits <= 0 {
        return None;
    }
    let proportion = signals.commits as f64 / cohort.total_commits as f64;
    let contributors = cohort.total_contributors.max(1) as f64;
    let ceiling = (1.0 / contributors).max(MIN_PROPORTION_CEILING);
    Some((proportion, ceiling))
}

fn provenance(signals: &Signals, cohort: Cohort) -> f64 {
    let mut raw = match commit_share(signals, cohort) {
        Some((proportion, ceiling)) => {
            let verified = (signals.commits - signals.unverified_commits) as f64
                / signals.commits as f64;
            let multiplier = if signals.strong_auth {
                1.0
            } else {
                // Large share of commits without strong auth is a concentration risk
                1.0 - PROVENANCE_CONCENTRATION_DISCOUNT * clamped_ratio(proportion, ceiling)
            };
            verified * multiplier
        }
        None => 0.0,
    };

    if signals.strong_auth {
        raw = raw.max(PROVENANCE_STRONG_AUTH_FLOOR);
    }

    raw * CATEGORY_PROVENANCE_WEIGHT
}

fn identity(signals: &Signals) -> f64 {
    let mut score = log_curve(signals.age_days as f64, AGE_CEILING_DAYS) * AGE_WEIGHT;
    if signals.org_member {
        score += ORG_MEMBER_WEIGHT;
    }
    score
}

fn engagement(signals: &Signals, cohort: Cohort) -> f64 {
    let mut score = 0.0;

    if let Some((proportion, ceiling)) = commit_share(signals, cohort) {
        let threshold = (cohort.total_contributors as f64 * COMMITS_PER_CONTRIBUTOR_FOR_CONFIDENCE)
            .max(MIN_CONFIDENCE_COMMITS);
        let confidence = (cohort.total_commits as f64 / threshold).min(1.0);
        score += clamped_ratio(proportion, ceiling) * confidence * PROPORTION_WEIGHT;
    }

    // Larger cohorts decay faster: being recent matters more there
    let contributors = cohort.total_contributors.max(1) as f64;
    let half_life_multiplier = (1.0 / (1.0 + contributors).ln()).clamp(0.25, 1.0);
    let half_life = RECENCY_HALF_LIFE_DAYS * half_life_multiplier;
    score += exp_decay(signals.last_commit_days as f64, half_life) * RECENCY_WEIGHT;

    score
}

fn community(signals: &Signals) -> f64 {
    let mut score = 0.0;

    if signals.following > 0 {
        let ratio = signals.followers as f64 / signals.following as f64;
        score += log_curve(ratio, FOLLOWER_RATIO_CEILING) * FOLLOWER_RATIO_WEIGHT;
    }

    let repos = (signals.public_repos + signals.private_repos) as f64;
    score += log_curve(repos, REPO_COUNT_CEILING) * REPO_COUNT_WEIGHT;

    score
}
