//! Traditional-method time model.
//!
//! Estimates how long the same question would have taken through
//! traditional research, split into four factors, and derives the time
//! saved by the AI consultation.
//!
//! Each factor is rounded on its own, half-up, and the traditional total is
//! the sum of the rounded factors. Rounding the unrounded sum instead would
//! break `factors.total() == traditional_duration_minutes`.
//!
//! The multiplier is carried in hundredths so that exact .5 products such
//! as `15 × 2.1` round up instead of landing just below the tie.

use crate::types::{Complexity, TimeFactors, TimeSavingsBreakdown};

/// Base minutes for legal research.
pub const BASE_LEGAL_RESEARCH: u32 = 30;
/// Base minutes for document review.
pub const BASE_DOCUMENT_REVIEW: u32 = 20;
/// Base minutes for preparation.
pub const BASE_PREPARATION: u32 = 15;
/// Base minutes for follow-up communication.
pub const BASE_FOLLOW_UP: u32 = 10;

/// Tenths added per topic beyond the first (0.2).
const TENTHS_PER_EXTRA_TOPIC: i64 = 2;
/// Tenths added per question beyond the first (0.1).
const TENTHS_PER_EXTRA_FAQ: i64 = 1;

/// Scale for the declared complexity tier, in tenths (1.0, 1.2, 1.5).
pub fn complexity_scale_tenths(complexity: Complexity) -> i64 {
    match complexity {
        Complexity::Low => 10,
        Complexity::Medium => 12,
        Complexity::High => 15,
    }
}

/// Multiplier applied to every base factor, in hundredths.
///
/// `(10 + 2 * (topics - 1) + (faqs - 1)) * scale_tenths(complexity)`.
/// Zero counts are taken literally and lower the multiplier; the floor is
/// 70 (0.7), so factors never go negative.
pub fn multiplier_hundredths(topic_count: usize, faq_count: usize, complexity: Complexity) -> i64 {
    let tenths = 10
        + TENTHS_PER_EXTRA_TOPIC * (topic_count as i64 - 1)
        + TENTHS_PER_EXTRA_FAQ * (faq_count as i64 - 1);
    tenths * complexity_scale_tenths(complexity)
}

/// [`multiplier_hundredths`] as a float, for display.
pub fn complexity_multiplier(topic_count: usize, faq_count: usize, complexity: Complexity) -> f64 {
    multiplier_hundredths(topic_count, faq_count, complexity) as f64 / 100.0
}

fn scaled(base: u32, hundredths: i64) -> u32 {
    let minutes = (i64::from(base) * hundredths + 50).div_euclid(100);
    u32::try_from(minutes.max(0)).unwrap_or(u32::MAX)
}

/// Compute the traditional-method breakdown for one conversation.
///
/// `time_saved_minutes` is not clamped: a long AI session yields a
/// negative value.
pub fn compute<T: AsRef<str>>(
    chat_duration_minutes: u32,
    topics: &[T],
    faqs: &[T],
    complexity: Complexity,
) -> TimeSavingsBreakdown {
    let multiplier = multiplier_hundredths(topics.len(), faqs.len(), complexity);

    let factors = TimeFactors {
        legal_research: scaled(BASE_LEGAL_RESEARCH, multiplier),
        document_review: scaled(BASE_DOCUMENT_REVIEW, multiplier),
        preparation: scaled(BASE_PREPARATION, multiplier),
        follow_up: scaled(BASE_FOLLOW_UP, multiplier),
    };
    let traditional = factors.total();

    TimeSavingsBreakdown {
        traditional_duration_minutes: traditional,
        time_saved_minutes: i64::from(traditional) - i64::from(chat_duration_minutes),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    fn strings(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item {}", i)).collect()
    }

    #[test]
    fn medium_two_topics_one_faq() {
        let breakdown = compute(10, &["a", "b"], &["x"], Complexity::Medium);
        assert_eq!(
            breakdown.factors,
            TimeFactors {
                legal_research: 43,
                document_review: 29,
                preparation: 22,
                follow_up: 14,
            }
        );
        assert_eq!(breakdown.traditional_duration_minutes, 108);
        assert_eq!(breakdown.time_saved_minutes, 98);
    }

    #[test]
    fn single_topic_low_complexity_uses_base_times() {
        let breakdown = compute(5, &["a"], &["x"], Complexity::Low);
        assert_eq!(breakdown.traditional_duration_minutes, 75);
        assert_eq!(breakdown.factors.legal_research, 30);
        assert_eq!(breakdown.time_saved_minutes, 70);
    }

    #[test]
    fn factors_always_reconcile_with_total() {
        for topics in 0..8 {
            for faqs in 0..8 {
                for tier in TIERS {
                    let b = compute(17, &strings(topics), &strings(faqs), tier);
                    assert_eq!(b.factors.total(), b.traditional_duration_minutes);
                    assert_eq!(
                        b.time_saved_minutes,
                        i64::from(b.traditional_duration_minutes) - 17
                    );
                }
            }
        }
    }

    #[test]
    fn long_sessions_produce_negative_savings() {
        let breakdown = compute(500, &["a"], &["x"], Complexity::Low);
        assert_eq!(breakdown.time_saved_minutes, 75 - 500);
    }

    #[test]
    fn multiplier_is_monotonic_in_each_input() {
        for n in 0..10 {
            for tier in TIERS {
                assert!(
                    complexity_multiplier(n + 1, 2, tier) >= complexity_multiplier(n, 2, tier)
                );
                assert!(
                    complexity_multiplier(2, n + 1, tier) >= complexity_multiplier(2, n, tier)
                );
            }
            assert!(
                complexity_multiplier(n, n, Complexity::Medium)
                    >= complexity_multiplier(n, n, Complexity::Low)
            );
            assert!(
                complexity_multiplier(n, n, Complexity::High)
                    >= complexity_multiplier(n, n, Complexity::Medium)
            );
        }
    }

    #[test]
    fn zero_counts_stay_positive() {
        let multiplier = complexity_multiplier(0, 0, Complexity::Low);
        assert!((multiplier - 0.7).abs() < 1e-9);

        let breakdown = compute::<&str>(0, &[], &[], Complexity::Low);
        assert_eq!(breakdown.factors.legal_research, 21);
        assert_eq!(breakdown.factors.document_review, 14);
        assert_eq!(breakdown.factors.preparation, 11);
        assert_eq!(breakdown.factors.follow_up, 7);
        assert_eq!(breakdown.traditional_duration_minutes, 53);
    }

    #[test]
    fn exact_half_minutes_round_up() {
        // 15 × 2.1 = 31.5
        let b = compute(0, &["a".to_string()], &strings(5), Complexity::High);
        assert_eq!(b.factors.preparation, 32);
        // 15 × 1.1 = 16.5
        let b = compute::<&str>(0, &["a", "b"], &[], Complexity::Low);
        assert_eq!(b.factors.preparation, 17);
        // 15 × 0.7 = 10.5
        let b = compute::<&str>(0, &[], &[], Complexity::Low);
        assert_eq!(b.factors.preparation, 11);
    }

    #[test]
    fn factors_match_exact_half_up_over_count_grid() {
        for topics in 0..30 {
            for faqs in 0..30 {
                for tier in TIERS {
                    let hundredths = multiplier_hundredths(topics, faqs, tier);
                    let b = compute(0, &strings(topics), &strings(faqs), tier);
                    let got = [
                        (BASE_LEGAL_RESEARCH, b.factors.legal_research),
                        (BASE_DOCUMENT_REVIEW, b.factors.document_review),
                        (BASE_PREPARATION, b.factors.preparation),
                        (BASE_FOLLOW_UP, b.factors.follow_up),
                    ];
                    for (base, factor) in got {
                        // half-up: base × multiplier lies in [factor - 0.5, factor + 0.5)
                        let x = i64::from(base) * hundredths;
                        let f = i64::from(factor) * 100;
                        assert!(f - 50 <= x && x < f + 50, "base {base} × {hundredths}/100 -> {factor}");
                    }
                }
            }
        }
    }
}
