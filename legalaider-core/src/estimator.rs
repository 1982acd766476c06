//! Conversation duration estimation.
//!
//! Converts a sequence of turns into the minutes a person would have spent
//! in the consultation: reading every turn, plus composing each of their
//! own replies. The total is rounded up so an AI session is never
//! under-reported.

use crate::types::{ConversationTurn, Role};

/// Average adult reading speed.
pub const WORDS_PER_MINUTE: f64 = 200.0;
/// Legal text is read more slowly than prose.
pub const COMPREHENSION_MULTIPLIER: f64 = 1.5;
/// Time for the user to compose a reply (minutes).
pub const RESPONSE_FORMULATION_MINUTES: f64 = 2.0;

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes attributed to a single turn, before rounding.
pub fn turn_minutes(turn: &ConversationTurn) -> f64 {
    let reading = (word_count(&turn.text) as f64 / WORDS_PER_MINUTE) * COMPREHENSION_MULTIPLIER;
    match turn.role {
        Role::User => reading + RESPONSE_FORMULATION_MINUTES,
        Role::Assistant => reading,
    }
}

/// Estimate the consultation length in whole minutes (ceiling).
pub fn estimate(turns: &[ConversationTurn]) -> u32 {
    let total: f64 = turns.iter().map(turn_minutes).sum();
    total.ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnKind;
    use chrono::Utc;

    fn turn(role: Role, text: &str) -> ConversationTurn {
        ConversationTurn {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
            kind: match role {
                Role::User => TurnKind::Question,
                Role::Assistant => TurnKind::Answer,
            },
        }
    }

    #[test]
    fn five_word_question_rounds_up_to_three_minutes() {
        // (5 / 200) * 1.5 + 2 = 2.0375
        let turns = vec![turn(Role::User, "a b c d e")];
        assert_eq!(estimate(&turns), 3);
    }

    #[test]
    fn empty_conversation_is_zero() {
        assert_eq!(estimate(&[]), 0);
    }

    #[test]
    fn empty_user_text_costs_only_formulation() {
        assert_eq!(estimate(&[turn(Role::User, "")]), 2);
        assert_eq!(estimate(&[turn(Role::Assistant, "   ")]), 0);
    }

    #[test]
    fn assistant_turns_are_reading_time_only() {
        // 400 words -> 2 * 1.5 = 3.0 exactly, no ceiling bump
        let text = vec!["word"; 400].join(" ");
        assert_eq!(estimate(&[turn(Role::Assistant, &text)]), 3);
    }

    #[test]
    fn word_count_collapses_whitespace_runs() {
        assert_eq!(word_count("  indemnity\tcap \n\n  clause "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn estimate_is_deterministic_and_sums_across_turns() {
        let answer = vec!["term"; 250].join(" ");
        let turns = vec![
            turn(Role::User, "What is a limitation of liability clause?"),
            turn(Role::Assistant, &answer),
            turn(Role::User, "Thanks"),
        ];
        let first = estimate(&turns);
        assert_eq!(first, estimate(&turns));
        // 2.0525 + 1.875 + 2.0075 = 5.935
        assert_eq!(first, 6);
    }
}
