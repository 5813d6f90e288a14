//! Health-ratio scoring for completed sit/stand cycles.
//!
//! The points server applies this same arithmetic; it lives here too so
//! the CLI can preview a score offline and tests can pin the contract.
//!
//! A cycle is scored on two terms:
//!
//! ```text
//! ratio_score    = max(0, 1 - |sit/stand - 2.0| / 2.0)
//! duration_score = max(0, 1 - |total - 30| / 20)
//! score          = round((ratio_score * 0.7 + duration_score * 0.3) * 100)
//! ```
//!
//! Cycles shorter than 15 minutes total score 0 outright.

use serde::{Deserialize, Serialize};

/// Cycles below this total length earn nothing.
pub const MIN_CYCLE_MINUTES: u32 = 15;
/// Ideal sit:stand ratio (the 20:10 pattern).
pub const IDEAL_RATIO: f64 = 2.0;
/// Ideal total cycle length in minutes.
pub const IDEAL_TOTAL_MINUTES: f64 = 30.0;
/// Points a user can earn per day before the server truncates.
pub const DAILY_POINT_CAP: u32 = 100;

/// Score with its component terms, for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// How close the sit:stand ratio is to 2:1 (0.0 to 1.0).
    pub ratio_score: f64,
    /// How close the total length is to 30 minutes (0.0 to 1.0).
    pub duration_score: f64,
    /// Weighted final score, 0-100.
    pub score: u8,
}

impl HealthScore {
    fn zero() -> Self {
        Self {
            ratio_score: 0.0,
            duration_score: 0.0,
            score: 0,
        }
    }
}

/// Score a completed cycle.
pub fn health_score(sitting_minutes: u32, standing_minutes: u32) -> HealthScore {
    if sitting_minutes == 0 || standing_minutes == 0 {
        return HealthScore::zero();
    }
    let total = sitting_minutes + standing_minutes;
    if total < MIN_CYCLE_MINUTES {
        return HealthScore::zero();
    }

    let ratio = f64::from(sitting_minutes) / f64::from(standing_minutes);
    let ratio_score = (1.0 - (ratio - IDEAL_RATIO).abs() / IDEAL_RATIO).max(0.0);
    let duration_score = (1.0 - (f64::from(total) - IDEAL_TOTAL_MINUTES).abs() / 20.0).max(0.0);
    let score = ((ratio_score * 0.7 + duration_score * 0.3) * 100.0).round() as u8;

    HealthScore {
        ratio_score,
        duration_score,
        score,
    }
}

/// Points awarded for a score, with user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsTier {
    pub points: u32,
    pub feedback: &'static str,
    pub color: &'static str,
}

pub fn score_to_points(score: u8) -> PointsTier {
    if score >= 90 {
        PointsTier {
            points: 10,
            feedback: "Perfect! Excellent sit-stand balance.",
            color: "green",
        }
    } else if score >= 70 {
        PointsTier {
            points: 7,
            feedback: "Good -- keep this rhythm going.",
            color: "yellow",
        }
    } else if score >= 50 {
        PointsTier {
            points: 4,
            feedback: "Fair -- try adjusting your times a bit.",
            color: "orange",
        }
    } else {
        PointsTier {
            points: 0,
            feedback: "Too much sitting or too short -- no points this cycle.",
            color: "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioLevel {
    Good,
    Warning,
}

/// Quick health read on a sit:stand configuration, used when the user
/// picks their phase lengths.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatioAssessment {
    pub healthy: bool,
    pub ratio: f64,
    pub level: RatioLevel,
    pub recommendation: &'static str,
}

pub fn assess_ratio(sitting_minutes: u32, standing_minutes: u32) -> RatioAssessment {
    let ratio = f64::from(sitting_minutes.max(1)) / f64::from(standing_minutes.max(1));

    if (1.5..=2.5).contains(&ratio) {
        RatioAssessment {
            healthy: true,
            ratio,
            level: RatioLevel::Good,
            recommendation: "Ideal balance for desk work (the 20:10 pattern).",
        }
    } else if ratio < 1.5 {
        RatioAssessment {
            healthy: true,
            ratio,
            level: RatioLevel::Good,
            recommendation: "You might be standing a bit much. Aim for a 2:1 sit-stand ratio.",
        }
    } else if ratio <= 4.0 {
        RatioAssessment {
            healthy: false,
            ratio,
            level: RatioLevel::Warning,
            recommendation: "Consider more standing breaks. 20 minutes sitting to 10 standing works well.",
        }
    } else {
        RatioAssessment {
            healthy: false,
            ratio,
            level: RatioLevel::Warning,
            recommendation: "Too much sitting. Try the 20:10 sit-stand pattern.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ideal_cycle_scores_full_points() {
        let hs = health_score(20, 10);
        assert_eq!(hs.score, 100);
        assert!((hs.ratio_score - 1.0).abs() < f64::EPSILON);
        assert!((hs.duration_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(score_to_points(hs.score).points, 10);
    }

    #[test]
    fn tiny_cycle_scores_zero() {
        let hs = health_score(5, 2);
        assert_eq!(hs.score, 0);
        assert_eq!(score_to_points(hs.score).points, 0);
    }

    #[test]
    fn zero_minutes_scores_zero() {
        assert_eq!(health_score(0, 10).score, 0);
        assert_eq!(health_score(20, 0).score, 0);
    }

    #[test]
    fn skewed_ratio_loses_ratio_points() {
        // 40:10 = 4:1, ratio term bottoms out; total 50 is 20 past ideal.
        let hs = health_score(40, 10);
        assert!(hs.ratio_score < f64::EPSILON);
        assert_eq!(hs.score, 0);
    }

    #[test]
    fn near_ideal_lands_in_a_paying_tier() {
        let hs = health_score(25, 10);
        assert!(hs.score >= 50, "score was {}", hs.score);
        assert!(score_to_points(hs.score).points > 0);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(score_to_points(100).points, 10);
        assert_eq!(score_to_points(90).points, 10);
        assert_eq!(score_to_points(89).points, 7);
        assert_eq!(score_to_points(70).points, 7);
        assert_eq!(score_to_points(69).points, 4);
        assert_eq!(score_to_points(50).points, 4);
        assert_eq!(score_to_points(49).points, 0);
        assert_eq!(score_to_points(0).points, 0);
    }

    #[test]
    fn ratio_assessment_bands() {
        assert!(assess_ratio(20, 10).healthy);
        assert!(assess_ratio(10, 10).healthy);
        let warned = assess_ratio(35, 10);
        assert!(!warned.healthy);
        assert_eq!(warned.level, RatioLevel::Warning);
        assert!(!assess_ratio(60, 10).healthy);
    }

    proptest! {
        #[test]
        fn score_is_always_bounded(sit in 0u32..=600, stand in 0u32..=600) {
            let hs = health_score(sit, stand);
            prop_assert!(hs.score <= 100);
            prop_assert!((0.0..=1.0).contains(&hs.ratio_score));
            prop_assert!((0.0..=1.0).contains(&hs.duration_score));
        }

        #[test]
        fn short_cycles_never_pay(sit in 1u32..=7, stand in 1u32..=7) {
            let hs = health_score(sit, stand);
            prop_assert_eq!(hs.score, 0);
            prop_assert_eq!(score_to_points(hs.score).points, 0);
        }

        #[test]
        fn points_never_exceed_tier_maximum(score in 0u8..=100) {
            prop_assert!(score_to_points(score).points <= 10);
        }
    }
}
