//! Relationship state machine with hysteresis and minimum dwell times.
//!
//! Upgrades are gated (score threshold, metric floors, dwell time, all
//! conjunctive). Downgrades use lower thresholds than the matching upgrade,
//! and a trust/comfort floor breach resets any state to `Stranger` at once.
//!
//! Per-turn evaluation order:
//! 1. forward transition out of the current state
//! 2. global reset when T or K is below the reset floor
//! 3. state-specific downward transitions

use crate::config::{TransitionRule, TransitionTable};
use crate::metrics::RelationshipMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relationship stage, ordered by closeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipState {
    Stranger,
    Friend,
    Interest,
    Flirting,
    Dating,
}

impl RelationshipState {
    pub const ALL: [RelationshipState; 5] = [
        RelationshipState::Stranger,
        RelationshipState::Friend,
        RelationshipState::Interest,
        RelationshipState::Flirting,
        RelationshipState::Dating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipState::Stranger => "stranger",
            RelationshipState::Friend => "friend",
            RelationshipState::Interest => "interest",
            RelationshipState::Flirting => "flirting",
            RelationshipState::Dating => "dating",
        }
    }

    /// Next closer state, if any.
    pub fn next(&self) -> Option<RelationshipState> {
        match self {
            RelationshipState::Stranger => Some(RelationshipState::Friend),
            RelationshipState::Friend => Some(RelationshipState::Interest),
            RelationshipState::Interest => Some(RelationshipState::Flirting),
            RelationshipState::Flirting => Some(RelationshipState::Dating),
            RelationshipState::Dating => None,
        }
    }
}

impl Default for RelationshipState {
    fn default() -> Self {
        RelationshipState::Stranger
    }
}

impl fmt::Display for RelationshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown relationship state: {}", s))
    }
}

impl TransitionTable {
    /// Rule for leaving `state` toward the next closer state.
    pub fn forward(&self, state: RelationshipState) -> Option<&TransitionRule> {
        match state {
            RelationshipState::Stranger => Some(&self.stranger_to_friend),
            RelationshipState::Friend => Some(&self.friend_to_interest),
            RelationshipState::Interest => Some(&self.interest_to_flirting),
            RelationshipState::Flirting => Some(&self.flirting_to_dating),
            RelationshipState::Dating => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Gated upgrade to the next state.
    Advance,
    /// Trust/comfort floor breach; straight back to stranger.
    Reset,
    /// Hysteresis or collapse downgrade.
    Regress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: RelationshipState,
    pub to: RelationshipState,
    pub kind: TransitionKind,
}

fn can_advance(rule: &TransitionRule, m: &RelationshipMetrics, dwell: u32) -> bool {
    m.score >= rule.up
        && m.trust > rule.min_trust
        && m.comfort > rule.min_comfort
        && rule.min_affection.map_or(true, |floor| m.affection > floor)
        && dwell >= rule.min_dwell
}

fn regression(
    state: RelationshipState,
    m: &RelationshipMetrics,
    table: &TransitionTable,
) -> Option<RelationshipState> {
    use RelationshipState::*;

    match state {
        Friend if m.score < table.stranger_to_friend.down || m.trust < table.stranger_trust_floor => {
            Some(Stranger)
        }
        Interest if m.trust < table.stranger_trust_floor => Some(Stranger),
        Interest
            if m.score < table.friend_to_interest.down
                || m.affection < table.affection_floors.interest =>
        {
            Some(Friend)
        }
        Flirting
            if m.score < table.interest_to_flirting.down
                || m.affection < table.affection_floors.flirting =>
        {
            Some(Interest)
        }
        Dating
            if m.score < table.flirting_to_dating.down
                || m.affection < table.affection_floors.dating =>
        {
            Some(Flirting)
        }
        _ => None,
    }
}

/// Decide this turn's transition, if any. Pure: does not touch dwell/history.
pub fn evaluate_transition(
    state: RelationshipState,
    metrics: &RelationshipMetrics,
    dwell: u32,
    table: &TransitionTable,
) -> Option<Transition> {
    if let (Some(rule), Some(next)) = (table.forward(state), state.next()) {
        if can_advance(rule, metrics, dwell) {
            return Some(Transition {
                from: state,
                to: next,
                kind: TransitionKind::Advance,
            });
        }
    }

    if metrics.trust < table.reset_floor || metrics.comfort < table.reset_floor {
        return (state != RelationshipState::Stranger).then_some(Transition {
            from: state,
            to: RelationshipState::Stranger,
            kind: TransitionKind::Reset,
        });
    }

    regression(state, metrics, table).map(|to| Transition {
        from: state,
        to,
        kind: TransitionKind::Regress,
    })
}

/// Current state plus dwell counter and the history of visited states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTrack {
    pub state: RelationshipState,
    /// Turns spent in `state` since entering it.
    pub state_duration: u32,
    pub state_history: Vec<RelationshipState>,
}

impl Default for RelationshipTrack {
    fn default() -> Self {
        Self {
            state: RelationshipState::Stranger,
            state_duration: 0,
            state_history: vec![RelationshipState::Stranger],
        }
    }
}

impl RelationshipTrack {
    /// Evaluate and apply one turn: a realized transition resets the dwell
    /// counter and is appended to history, otherwise dwell increments.
    pub fn advance(&mut self, metrics: &RelationshipMetrics, table: &TransitionTable) -> Option<Transition> {
        let transition = evaluate_transition(self.state, metrics, self.state_duration, table);
        match transition {
            Some(t) => {
                self.state = t.to;
                self.state_duration = 0;
                self.state_history.push(t.to);
            }
            None => self.state_duration += 1,
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelationshipState::*;

    fn table() -> TransitionTable {
        TransitionTable::default()
    }

    fn metrics(trust: f32, comfort: f32, affection: f32, score: f32) -> RelationshipMetrics {
        RelationshipMetrics {
            trust,
            comfort,
            affection,
            score,
        }
    }

    #[test]
    fn test_state_ordering_and_names() {
        assert!(Stranger < Friend && Flirting < Dating);
        assert_eq!(Interest.to_string(), "interest");
        assert_eq!("Flirting".parse::<RelationshipState>().unwrap(), Flirting);
        assert!("enemies".parse::<RelationshipState>().is_err());
        assert_eq!(Dating.next(), None);
    }

    #[test]
    fn test_stranger_to_friend_requires_dwell() {
        let m = metrics(0.2, 0.3, 0.0, 0.4);
        assert!(evaluate_transition(Stranger, &m, 4, &table()).is_none());
        let t = evaluate_transition(Stranger, &m, 5, &table()).unwrap();
        assert_eq!(t.to, Friend);
        assert_eq!(t.kind, TransitionKind::Advance);
    }

    #[test]
    fn test_advance_exactly_at_up_threshold() {
        let m = metrics(0.2, 0.3, 0.0, 0.35);
        let t = evaluate_transition(Stranger, &m, 5, &table()).unwrap();
        assert_eq!(t.to, Friend);
    }

    #[test]
    fn test_metric_floors_are_strict() {
        // T exactly at the floor does not pass
        let m = metrics(0.15, 0.3, 0.0, 0.5);
        assert!(evaluate_transition(Stranger, &m, 10, &table()).is_none());
    }

    #[test]
    fn test_friend_to_interest_requires_affection() {
        let cold = metrics(0.4, 0.4, 0.2, 0.6);
        assert!(evaluate_transition(Friend, &cold, 5, &table()).is_none());
        let warm = metrics(0.4, 0.4, 0.21, 0.6);
        assert_eq!(evaluate_transition(Friend, &warm, 5, &table()).unwrap().to, Interest);
    }

    #[test]
    fn test_no_oscillation_inside_hysteresis_band() {
        // Just entered friend; C dips below the up threshold but stays above down
        let m = metrics(0.2, 0.3, 0.0, 0.34);
        assert!(evaluate_transition(Friend, &m, 0, &table()).is_none());
        let m = metrics(0.2, 0.3, 0.0, 0.25);
        assert!(evaluate_transition(Friend, &m, 0, &table()).is_none());
        let m = metrics(0.2, 0.3, 0.0, 0.249);
        assert_eq!(evaluate_transition(Friend, &m, 0, &table()).unwrap().to, Stranger);
    }

    #[test]
    fn test_global_reset_from_any_state() {
        let broken_trust = metrics(0.04, 0.9, 0.9, 0.9);
        let broken_comfort = metrics(0.9, 0.04, 0.9, 0.9);
        for state in [Friend, Interest, Flirting] {
            for m in [broken_trust, broken_comfort] {
                let t = evaluate_transition(state, &m, 0, &table()).unwrap();
                assert_eq!(t.to, Stranger);
                assert_eq!(t.kind, TransitionKind::Reset);
            }
        }
        let t = evaluate_transition(Dating, &broken_trust, 100, &table()).unwrap();
        assert_eq!(t.to, Stranger);
    }

    #[test]
    fn test_reset_in_stranger_is_not_a_transition() {
        let m = metrics(0.01, 0.01, 0.0, 0.1);
        assert!(evaluate_transition(Stranger, &m, 3, &table()).is_none());
    }

    #[test]
    fn test_interest_collapses_on_low_affection() {
        let m = metrics(0.5, 0.5, 0.09, 0.6);
        let t = evaluate_transition(Interest, &m, 0, &table()).unwrap();
        assert_eq!(t.to, Friend);
        assert_eq!(t.kind, TransitionKind::Regress);
    }

    #[test]
    fn test_interest_to_stranger_on_low_trust() {
        let m = metrics(0.08, 0.5, 0.5, 0.6);
        assert_eq!(evaluate_transition(Interest, &m, 0, &table()).unwrap().to, Stranger);
    }

    #[test]
    fn test_flirting_and_dating_regress_one_step() {
        let m = metrics(0.8, 0.8, 0.2, 0.75);
        assert_eq!(evaluate_transition(Flirting, &m, 0, &table()).unwrap().to, Interest);
        let m = metrics(0.8, 0.8, 0.8, 0.76);
        assert_eq!(evaluate_transition(Dating, &m, 0, &table()).unwrap().to, Flirting);
        let m = metrics(0.8, 0.8, 0.44, 0.9);
        assert_eq!(evaluate_transition(Dating, &m, 0, &table()).unwrap().to, Flirting);
    }

    #[test]
    fn test_dating_is_terminal_upward() {
        let m = metrics(1.0, 1.0, 1.0, 1.0);
        assert!(evaluate_transition(Dating, &m, 1000, &table()).is_none());
    }

    #[test]
    fn test_upward_checked_before_reset() {
        // Forward conditions hold, so the forward rule wins even though the
        // evaluation would otherwise consider downward rules.
        let m = metrics(0.6, 0.5, 0.5, 0.75);
        let t = evaluate_transition(Interest, &m, 8, &table()).unwrap();
        assert_eq!(t.to, Flirting);
    }

    #[test]
    fn test_track_dwell_and_history() {
        let mut track = RelationshipTrack::default();
        let table = table();
        let m = metrics(0.2, 0.3, 0.0, 0.4);
        for turn in 0..5 {
            assert!(track.advance(&m, &table).is_none(), "turn {}", turn);
        }
        assert_eq!(track.state_duration, 5);
        let t = track.advance(&m, &table).unwrap();
        assert_eq!(t.to, Friend);
        assert_eq!(track.state_duration, 0);
        assert_eq!(track.state_history, vec![Stranger, Friend]);

        let broken = metrics(0.01, 0.3, 0.0, 0.4);
        track.advance(&broken, &table);
        assert_eq!(track.state, Stranger);
        assert_eq!(track.state_history, vec![Stranger, Friend, Stranger]);
    }

    #[test]
    fn test_track_json_field_names() {
        let json = serde_json::to_string(&RelationshipTrack::default()).unwrap();
        assert!(json.contains("\"stateDuration\":0"));
        assert!(json.contains("\"stateHistory\":[\"stranger\"]"));
    }
}
