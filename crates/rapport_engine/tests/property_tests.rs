//! Property-based tests for the prompt renderer and session bookkeeping.

use proptest::prelude::*;
use rapport_core::{RelationshipState, ResponsePolicy};
use rapport_engine::prompt::{policy_to_prompt, temperature};
use rapport_engine::Session;

fn arb_policy() -> impl Strategy<Value = ResponsePolicy> {
    (
        (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0),
        (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0),
    )
        .prop_map(
            |((tone, humor, self_disclosure, question_depth), (nickname_use, playfulness, warmth, memory_recall))| {
                ResponsePolicy {
                    tone,
                    humor,
                    self_disclosure,
                    question_depth,
                    nickname_use,
                    playfulness,
                    warmth,
                    memory_recall,
                }
            },
        )
}

fn arb_state() -> impl Strategy<Value = RelationshipState> {
    prop::sample::select(RelationshipState::ALL.to_vec())
}

proptest! {
    /// Every rendering has exactly one band per mandatory section.
    #[test]
    fn prompt_has_every_mandatory_section(policy in arb_policy(), state in arb_state()) {
        let text = policy_to_prompt(&policy, state);
        prop_assert!(text.starts_with("**Relationship**: "));
        for section in ["**Tone**", "**Length**", "**Self-disclosure**", "**Forms of address**",
                        "**Warmth and empathy**", "**Sentence style**", "**Special expressions**"] {
            prop_assert_eq!(text.matches(section).count(), 1, "{}", section);
        }
        prop_assert_eq!(text.contains("**Questions**"), policy.question_depth > 0.1);
        prop_assert_eq!(text.contains("**Memory**"), policy.memory_recall > 0.4);
    }

    #[test]
    fn temperature_stays_in_sampling_range(policy in arb_policy()) {
        let t = temperature(&policy);
        prop_assert!((0.7..=1.0).contains(&t));
    }

    #[test]
    fn dialogue_never_exceeds_window(turns in 0usize..20, window in 0usize..10) {
        let mut session = Session::new("u");
        for i in 0..turns {
            session.turns.push(rapport_engine::Turn {
                turn_number: i as u64 + 1,
                user_message: format!("u{}", i),
                bot_response: format!("b{}", i),
                analysis: rapport_engine::Analysis::fallback("x"),
                policy: ResponsePolicy::base(RelationshipState::Stranger),
                snapshot: session.state.clone(),
                timestamp: 0,
            });
        }
        let lines = session.recent_dialogue(window);
        prop_assert_eq!(lines.len(), 2 * turns.min(window));
    }
}
