//! Property-based tests for rapport_core.
//!
//! Invariants that must hold for every input sequence: value ranges,
//! penalty dominance, transition gating and determinism.

use proptest::prelude::*;
use rapport_core::config::{RelationshipParams, TransitionTable};
use rapport_core::emotion::{update_bot_emotion, EmotionVector};
use rapport_core::metrics::{
    update_affection, update_comfort, update_relationship_metrics, update_trust, FixedSimilarity,
    RelationshipMetrics,
};
use rapport_core::relationship::{evaluate_transition, RelationshipTrack, TransitionKind};
use rapport_core::{
    ChatbotState, InteractionFeatures, NoNoise, Observation, RapportConfig, RelationshipEngine,
    RelationshipState, SeededNoise,
};

// ============================================================================
// Strategies
// ============================================================================

/// Emotion vector inside its documented bounds.
fn arb_emotion() -> impl Strategy<Value = EmotionVector> {
    (-1.0f32..=1.0, -1.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0)
        .prop_map(|(v, a, t, at)| EmotionVector::new(v, a, t, at))
}

/// Raw emotion sample, possibly out of range (analysis output is not trusted).
fn arb_raw_emotion() -> impl Strategy<Value = EmotionVector> {
    (-3.0f32..=3.0, -3.0f32..=3.0, -3.0f32..=3.0, -3.0f32..=3.0).prop_map(
        |(valence, arousal, trust, attraction)| EmotionVector {
            valence,
            arousal,
            trust,
            attraction,
        },
    )
}

fn arb_features_in(lo: f32, hi: f32) -> impl Strategy<Value = InteractionFeatures> {
    (
        (lo..=hi, lo..=hi, lo..=hi, lo..=hi, lo..=hi),
        (lo..=hi, lo..=hi, lo..=hi, lo..=hi),
    )
        .prop_map(|((qd, emp, sd, humor, pos), (conflict, disrespect, pressure, harassment))| {
            InteractionFeatures {
                question_depth: qd,
                empathy_expression: emp,
                self_disclosure: sd,
                humor,
                positivity: pos,
                conflict,
                disrespect,
                pressure,
                harassment,
            }
        })
}

fn arb_features() -> impl Strategy<Value = InteractionFeatures> {
    arb_features_in(0.0, 1.0)
}

fn arb_observation() -> impl Strategy<Value = Observation> {
    (arb_raw_emotion(), arb_features_in(-0.5, 1.5)).prop_map(|(e, f)| Observation::new(e, f))
}

fn arb_metrics() -> impl Strategy<Value = RelationshipMetrics> {
    (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(trust, comfort, affection, score)| {
        RelationshipMetrics {
            trust,
            comfort,
            affection,
            score,
        }
    })
}

fn arb_state() -> impl Strategy<Value = RelationshipState> {
    prop::sample::select(RelationshipState::ALL.to_vec())
}

fn assert_emotion_in_range(e: &EmotionVector) {
    assert!((-1.0..=1.0).contains(&e.valence), "valence {}", e.valence);
    assert!((-1.0..=1.0).contains(&e.arousal), "arousal {}", e.arousal);
    assert!((0.0..=1.0).contains(&e.trust), "trust {}", e.trust);
    assert!((0.0..=1.0).contains(&e.attraction), "attraction {}", e.attraction);
}

fn assert_metrics_in_range(m: &RelationshipMetrics) {
    for (name, v) in [("T", m.trust), ("K", m.comfort), ("A", m.affection), ("C", m.score)] {
        assert!((0.0..=1.0).contains(&v), "{} = {}", name, v);
    }
}

// ============================================================================
// Range invariants
// ============================================================================

proptest! {
    /// Any sequence of (possibly out-of-range) observations keeps every
    /// affect and metric field within bounds, and bot arousal at most 0.3.
    #[test]
    fn engine_keeps_values_in_range(
        observations in prop::collection::vec(arb_observation(), 1..40),
        seed in any::<u64>(),
    ) {
        let engine = RelationshipEngine::new(RapportConfig::default())
            .with_noise(Box::new(SeededNoise::new(seed)));
        let mut state = ChatbotState::initial();
        for obs in &observations {
            let out = engine.step(&state, obs).unwrap();
            assert_emotion_in_range(&out.state.user_emotion);
            assert_emotion_in_range(&out.state.bot_emotion);
            assert_metrics_in_range(&out.state.metrics);
            prop_assert!(out.state.bot_emotion.arousal <= 0.3);
            for (name, v) in out.policy.fields() {
                prop_assert!((0.0..=1.0).contains(&v), "{} = {}", name, v);
            }
            state = out.state;
        }
        prop_assert_eq!(state.interaction_count, observations.len() as u64);
    }

    /// The bot update alone stays in range from any valid starting point.
    #[test]
    fn bot_emotion_update_stays_in_range(
        bot in arb_emotion(),
        user in arb_emotion(),
        f in arb_features(),
        memory in 0.0f32..=1.0,
        c in 0.0f32..=1.0,
    ) {
        let params = RapportConfig::default().emotion;
        let next = update_bot_emotion(&bot, &user, &f, memory, c, &params, &SeededNoise::new(7));
        assert_emotion_in_range(&next);
        prop_assert!(next.arousal <= params.arousal_cap);
    }
}

// ============================================================================
// Penalty dominance
// ============================================================================

proptest! {
    /// Harassment 0 → 1 (other features zero) strictly lowers T, K and A
    /// and never raises C.
    #[test]
    fn harassment_strictly_lowers_metrics(
        trust in 0.0f32..=1.0,
        comfort in 0.0f32..=1.0,
        affection in 0.01f32..=1.0,
        score in 0.0f32..=1.0,
        user in arb_emotion(),
        bot in arb_emotion(),
    ) {
        let params = RelationshipParams::default();
        let calm = InteractionFeatures::default();
        let harassed = InteractionFeatures { harassment: 1.0, ..Default::default() };

        prop_assert!(update_trust(trust, &harassed, &params) < update_trust(trust, &calm, &params));
        prop_assert!(update_comfort(comfort, &harassed, &params) < update_comfort(comfort, &calm, &params));
        prop_assert!(update_affection(affection, &harassed, &params) < update_affection(affection, &calm, &params));

        let m = RelationshipMetrics { trust, comfort, affection, score };
        let sim = FixedSimilarity::default();
        let c_calm = update_relationship_metrics(&m, &user, &bot, &calm, &params, &sim).score;
        let c_harassed = update_relationship_metrics(&m, &user, &bot, &harassed, &params, &sim).score;
        prop_assert!(c_harassed <= c_calm, "C rose: {} > {}", c_harassed, c_calm);
    }

    /// More harassment never helps, whatever else the user does.
    #[test]
    fn harassment_is_monotone(
        f in arb_features(),
        low in 0.0f32..=1.0,
        extra in 0.0f32..=1.0,
        current in 0.0f32..=1.0,
    ) {
        let params = RelationshipParams::default();
        let high = (low + extra).min(1.0);
        let a = InteractionFeatures { harassment: low, ..f };
        let b = InteractionFeatures { harassment: high, ..f };
        prop_assert!(update_affection(current, &b, &params) <= update_affection(current, &a, &params) + 1e-6);
    }
}

// ============================================================================
// State machine
// ============================================================================

proptest! {
    /// T or K below the reset floor sends any non-stranger state home,
    /// regardless of dwell.
    #[test]
    fn floor_breach_resets_any_state(
        state in arb_state(),
        m in arb_metrics(),
        low in 0.0f32..0.05,
        breach_trust in any::<bool>(),
        dwell in 0u32..100,
    ) {
        let mut m = m;
        if breach_trust { m.trust = low } else { m.comfort = low }
        let table = TransitionTable::default();
        let t = evaluate_transition(state, &m, dwell, &table);
        if state == RelationshipState::Stranger {
            prop_assert!(t.is_none());
        } else {
            let t = t.unwrap();
            prop_assert_eq!(t.to, RelationshipState::Stranger);
            prop_assert_eq!(t.kind, TransitionKind::Reset);
        }
    }

    /// Meeting every forward threshold, the track advances on exactly the
    /// turn its dwell reaches the minimum.
    #[test]
    fn forward_transition_waits_for_dwell(
        state in prop::sample::select(vec![
            RelationshipState::Stranger,
            RelationshipState::Friend,
            RelationshipState::Interest,
            RelationshipState::Flirting,
        ]),
        margin in 0.0f32..=1.0,
    ) {
        let table = TransitionTable::default();
        let rule = *table.forward(state).unwrap();
        let lerp = |floor: f32| floor + 0.001 + (1.0 - floor - 0.001) * margin;
        let m = RelationshipMetrics {
            trust: lerp(rule.min_trust),
            comfort: lerp(rule.min_comfort),
            affection: lerp(rule.min_affection.unwrap_or(0.0)),
            score: rule.up + (1.0 - rule.up) * margin,
        };

        let mut track = RelationshipTrack { state, state_duration: 0, state_history: vec![state] };
        for _ in 0..rule.min_dwell {
            prop_assert!(track.advance(&m, &table).is_none());
        }
        let t = track.advance(&m, &table).unwrap();
        prop_assert_eq!(t.kind, TransitionKind::Advance);
        prop_assert_eq!(Some(t.to), state.next());
        prop_assert_eq!(track.state_duration, 0);
    }

    /// A score one tick below the up threshold but above the down threshold
    /// of the state just entered never flips back.
    #[test]
    fn no_oscillation_in_hysteresis_band(
        state in prop::sample::select(vec![
            RelationshipState::Friend,
            RelationshipState::Interest,
            RelationshipState::Flirting,
            RelationshipState::Dating,
        ]),
        frac in 0.0f32..1.0,
    ) {
        let table = TransitionTable::default();
        let below = match state {
            RelationshipState::Friend => &table.stranger_to_friend,
            RelationshipState::Interest => &table.friend_to_interest,
            RelationshipState::Flirting => &table.interest_to_flirting,
            _ => &table.flirting_to_dating,
        };
        let m = RelationshipMetrics {
            trust: 0.75,
            comfort: 0.65,
            affection: 0.5,
            score: below.down + (below.up - below.down) * frac,
        };
        let t = evaluate_transition(state, &m, 0, &table);
        prop_assert!(t.is_none(), "{} flipped to {:?}", state, t);
    }
}

// ============================================================================
// Determinism
// ============================================================================

proptest! {
    #[test]
    fn noiseless_engine_is_pure(observations in prop::collection::vec(arb_observation(), 1..20)) {
        let a = RelationshipEngine::deterministic(RapportConfig::default());
        let b = RelationshipEngine::new(RapportConfig::default()).with_noise(Box::new(NoNoise));
        let (mut sa, mut sb) = (ChatbotState::initial(), ChatbotState::initial());
        for obs in &observations {
            let oa = a.step(&sa, obs).unwrap();
            let ob = b.step(&sb, obs).unwrap();
            prop_assert_eq!(&oa, &ob);
            sa = oa.state;
            sb = ob.state;
        }
    }

    #[test]
    fn same_seed_same_trajectory(
        observations in prop::collection::vec(arb_observation(), 1..20),
        seed in any::<u64>(),
    ) {
        let mut config = RapportConfig::default();
        config.session.noise_seed = Some(seed);
        let a = RelationshipEngine::new(config.clone());
        let b = RelationshipEngine::new(config);
        let (mut sa, mut sb) = (ChatbotState::initial(), ChatbotState::initial());
        for obs in &observations {
            sa = a.step(&sa, obs).unwrap().state;
            sb = b.step(&sb, obs).unwrap().state;
        }
        prop_assert_eq!(sa, sb);
    }
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn mildly_positive_conversation_waits_before_friendship() {
    let engine = RelationshipEngine::deterministic(RapportConfig::default());
    let obs = Observation::new(
        EmotionVector::new(0.3, 0.1, 0.3, 0.1),
        InteractionFeatures {
            positivity: 0.5,
            empathy_expression: 0.4,
            ..Default::default()
        },
    );

    let mut state = ChatbotState::initial();
    assert_eq!(state.metrics, RelationshipMetrics::initial());

    let mut first = None;
    for turn in 1..=30u32 {
        let out = engine.step(&state, &obs).unwrap();
        if let Some(t) = out.transition {
            first = Some((turn, t, state.state_duration(), out.state.metrics));
            break;
        }
        assert_eq!(out.state.relationship(), RelationshipState::Stranger, "turn {}", turn);
        state = out.state;
    }

    let (turn, t, dwell, m) = first.expect("never left stranger");
    assert_eq!(t.from, RelationshipState::Stranger);
    assert_eq!(t.to, RelationshipState::Friend);
    assert!(turn >= 6, "advanced on turn {}", turn);
    assert!(dwell >= 5, "dwell {} at evaluation", dwell);
    assert!(m.score >= 0.35, "C = {}", m.score);
    assert!(m.trust > 0.15, "T = {}", m.trust);
    assert!(m.comfort > 0.25, "K = {}", m.comfort);
}
