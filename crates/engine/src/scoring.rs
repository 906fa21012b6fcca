//! Pure scoring arithmetic: aggregation, risk classification, confidence,
//! and the enforcement decision map.

use trustgate_types::{EnforcementDecision, RiskLevel, TrustLevel};

/// Weighted aggregate over evaluated rules. `contributions` pairs each
/// rule's score with its weight. An empty set or a zero total weight
/// aggregates to 0.0: absence of evidence is absence of trust.
pub fn aggregate_score(contributions: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = contributions.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = contributions.iter().map(|(s, w)| s * w).sum();
    (weighted / total_weight).clamp(0.0, 1.0)
}

/// Step function from `(score, anomaly_count)` to a risk bucket.
///
/// Monotone in both arguments: a higher score never raises risk and more
/// anomalies never lower it.
pub fn classify_risk(score: f64, anomaly_count: usize) -> RiskLevel {
    if score >= 0.9 && anomaly_count == 0 {
        RiskLevel::Minimal
    } else if score >= 0.7 && anomaly_count <= 1 {
        RiskLevel::Low
    } else if score >= 0.5 && anomaly_count <= 2 {
        RiskLevel::Medium
    } else if score >= 0.3 && anomaly_count <= 3 {
        RiskLevel::High
    } else if score >= 0.1 {
        RiskLevel::Critical
    } else {
        RiskLevel::Extreme
    }
}

/// Confidence in an assessment: grows with the number of verification
/// methods consulted, shrinks with each anomaly, clamped to [0, 1].
pub fn confidence_score(methods_used: usize, anomaly_count: usize) -> f64 {
    (0.2 * methods_used as f64 - 0.1 * anomaly_count as f64).clamp(0.0, 1.0)
}

/// Map risk, required trust, and anomaly presence to an enforcement
/// decision.
pub fn decide(
    risk: RiskLevel,
    required: TrustLevel,
    has_anomalies: bool,
) -> EnforcementDecision {
    match risk {
        RiskLevel::Extreme => EnforcementDecision::Deny,
        RiskLevel::Critical => EnforcementDecision::Quarantine,
        RiskLevel::High => EnforcementDecision::Challenge,
        RiskLevel::Medium => {
            if has_anomalies || required > TrustLevel::Medium {
                EnforcementDecision::Challenge
            } else {
                EnforcementDecision::Allow
            }
        }
        RiskLevel::Low | RiskLevel::Minimal => EnforcementDecision::Allow,
    }
}

/// Lift a decision to at least `floor`, without ever weakening it.
/// Deny outranks Quarantine outranks Challenge outranks Log outranks Allow.
pub fn lift_decision(
    decision: EnforcementDecision,
    floor: EnforcementDecision,
) -> EnforcementDecision {
    fn rank(d: EnforcementDecision) -> u8 {
        match d {
            EnforcementDecision::Allow => 0,
            EnforcementDecision::Log => 1,
            EnforcementDecision::Challenge => 2,
            EnforcementDecision::Quarantine => 3,
            EnforcementDecision::Deny => 4,
        }
    }
    if rank(floor) > rank(decision) {
        floor
    } else {
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_is_weight_normalized() {
        let score = aggregate_score(&[(1.0, 0.6), (0.5, 0.2)]);
        assert!((score - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty_fails_closed() {
        assert_eq!(aggregate_score(&[]), 0.0);
        assert_eq!(aggregate_score(&[(1.0, 0.0)]), 0.0);
    }

    #[test]
    fn test_risk_table() {
        assert_eq!(classify_risk(0.95, 0), RiskLevel::Minimal);
        assert_eq!(classify_risk(0.95, 1), RiskLevel::Low);
        assert_eq!(classify_risk(0.75, 1), RiskLevel::Low);
        assert_eq!(classify_risk(0.6, 2), RiskLevel::Medium);
        assert_eq!(classify_risk(0.4, 3), RiskLevel::High);
        assert_eq!(classify_risk(0.2, 5), RiskLevel::Critical);
        assert_eq!(classify_risk(0.05, 0), RiskLevel::Extreme);
    }

    #[test]
    fn test_risk_is_monotone_in_score() {
        for anomalies in 0..5 {
            let mut previous = RiskLevel::Extreme;
            for step in 0..=20 {
                let score = step as f64 / 20.0;
                let risk = classify_risk(score, anomalies);
                assert!(risk <= previous, "risk rose with score at {}", score);
                previous = risk;
            }
        }
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence_score(0, 0), 0.0);
        assert!((confidence_score(3, 1) - 0.5).abs() < 1e-9);
        assert_eq!(confidence_score(10, 0), 1.0);
        assert_eq!(confidence_score(0, 5), 0.0);
    }

    #[test]
    fn test_decision_map() {
        let required = TrustLevel::Medium;
        assert_eq!(
            decide(RiskLevel::Extreme, required, false),
            EnforcementDecision::Deny
        );
        assert_eq!(
            decide(RiskLevel::Critical, required, false),
            EnforcementDecision::Quarantine
        );
        assert_eq!(
            decide(RiskLevel::High, required, false),
            EnforcementDecision::Challenge
        );
        assert_eq!(
            decide(RiskLevel::Medium, required, true),
            EnforcementDecision::Challenge
        );
        assert_eq!(
            decide(RiskLevel::Medium, required, false),
            EnforcementDecision::Allow
        );
        assert_eq!(
            decide(RiskLevel::Medium, TrustLevel::High, false),
            EnforcementDecision::Challenge
        );
        assert_eq!(
            decide(RiskLevel::Low, TrustLevel::VeryHigh, false),
            EnforcementDecision::Allow
        );
        assert_eq!(
            decide(RiskLevel::Minimal, required, false),
            EnforcementDecision::Allow
        );
    }

    #[test]
    fn test_lift_never_weakens() {
        assert_eq!(
            lift_decision(EnforcementDecision::Allow, EnforcementDecision::Quarantine),
            EnforcementDecision::Quarantine
        );
        assert_eq!(
            lift_decision(EnforcementDecision::Deny, EnforcementDecision::Challenge),
            EnforcementDecision::Deny
        );
        assert_eq!(
            lift_decision(EnforcementDecision::Challenge, EnforcementDecision::Challenge),
            EnforcementDecision::Challenge
        );
    }
}
