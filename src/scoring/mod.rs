//! Categorical Reputation Scoring
//!
//! Turns one author's raw signals, plus corpus-wide cohort totals, into a
//! single score in `[0.0, 1.0]`. Pure computation: no I/O, no state.
//!
//! # Scoring Formula
//!
//! ```text
//! Score = Provenance × 0.35 + Identity × 0.25 + Engagement × 0.25 + Community × 0.15
//!
//! Each category is built from shaped signals that already live in [0, 1]:
//!   clamped_ratio(v, c) = v / c          saturating at 1
//!   log_curve(v, c)     = ln(1+v)/ln(1+c) saturating at 1
//!   exp_decay(v, h)     = exp(-v·ln2/h)   1.0 at v=0, 0.5 at v=h
//! ```
//!
//! # Categories
//!
//! - **Code provenance** (0.35): verified-commit ratio, discounted when an
//!   author without strong auth owns an outsized share of commits. Strong
//!   auth guarantees a 0.1 floor.
//! - **Identity** (0.25): account age (log curve to 730 days, 0.15) plus a
//!   flat 0.10 for owner org membership.
//! - **Engagement** (0.25): commit share confidence-weighted by corpus size
//!   (0.15) plus recency with a cohort-scaled half-life (0.10).
//! - **Community** (0.15): follower/following ratio (0.10) plus combined
//!   repo count (0.05).
//!
//! Suspended accounts score exactly 0. The sum is rounded to two decimals
//! (half away from zero) and is not clamped.
//!
//! # Example
//!
//! An author with no signals at all in a 10-person, 100-commit repository
//! still gets the recency credit for "last commit today":
//!
//! ```text
//! exp_decay(0, h) × 0.10 = 0.10
//! ```

mod curves;
mod model;

pub use curves::{clamped_ratio, exp_decay, log_curve, round_to};
pub use model::{
    categories, compute, CATEGORY_COMMUNITY_WEIGHT, CATEGORY_ENGAGEMENT_WEIGHT,
    CATEGORY_IDENTITY_WEIGHT, CATEGORY_PROVENANCE_WEIGHT, MODEL_VERSION,
};
