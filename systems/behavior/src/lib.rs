#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick decision ladder for autonomous agents.
//!
//! The system inspects an immutable snapshot of one agent and its neighbours
//! and answers with a [`Decision`]. It never moves anything itself: the world
//! turns each decision into resolver calls, path requests, or waypoint
//! bookkeeping.

use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};
use tileworld_core::{EntityId, EntityKind};

/// Tunable behaviour parameters shared by every entity of one kind.
///
/// Deserialising a profile requires every field. Partial tables go through
/// [`ProfileOverrides`] so that missing fields come from the right kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BehaviorProfile {
    /// Whether the entity runs the decision ladder on every tick.
    pub autonomous: bool,
    /// Maximum displacement per tick in world pixels.
    pub speed: f32,
    /// Distance the entity keeps from players.
    pub comfort_radius: f32,
    /// Distance the entity keeps from other pedestrians.
    pub personal_space: f32,
    /// Distance at which a waypoint counts as reached.
    pub arrival_threshold: f32,
    /// Whether the entity invents random goals when none is assigned.
    pub wanders: bool,
}

impl BehaviorProfile {
    /// Profile of the user-controlled player.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            autonomous: false,
            speed: 4.0,
            comfort_radius: 0.0,
            personal_space: 0.0,
            arrival_threshold: 2.0,
            wanders: false,
        }
    }

    /// Profile of a wandering pedestrian.
    #[must_use]
    pub const fn pedestrian() -> Self {
        Self {
            autonomous: true,
            speed: 2.0,
            comfort_radius: 48.0,
            personal_space: 16.0,
            arrival_threshold: 2.0,
            wanders: true,
        }
    }

    /// Profile of an inert prop.
    #[must_use]
    pub const fn prop() -> Self {
        Self {
            autonomous: false,
            speed: 0.0,
            comfort_radius: 0.0,
            personal_space: 0.0,
            arrival_threshold: 0.0,
            wanders: false,
        }
    }

    /// Default profile for the provided kind.
    #[must_use]
    pub const fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Self::player(),
            EntityKind::Pedestrian => Self::pedestrian(),
            EntityKind::Prop => Self::prop(),
        }
    }

    /// Name of the first parameter that is negative or not finite.
    #[must_use]
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("speed", self.speed),
            ("comfort_radius", self.comfort_radius),
            ("personal_space", self.personal_space),
            ("arrival_threshold", self.arrival_threshold),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
        .map(|(name, _)| name)
    }
}

/// Partial profile as written in a configuration table.
///
/// Fields left out keep the value of the base profile passed to
/// [`ProfileOverrides::apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    /// Replacement for [`BehaviorProfile::autonomous`].
    pub autonomous: Option<bool>,
    /// Replacement for [`BehaviorProfile::speed`].
    pub speed: Option<f32>,
    /// Replacement for [`BehaviorProfile::comfort_radius`].
    pub comfort_radius: Option<f32>,
    /// Replacement for [`BehaviorProfile::personal_space`].
    pub personal_space: Option<f32>,
    /// Replacement for [`BehaviorProfile::arrival_threshold`].
    pub arrival_threshold: Option<f32>,
    /// Replacement for [`BehaviorProfile::wanders`].
    pub wanders: Option<bool>,
}

impl ProfileOverrides {
    /// Returns `base` with every overridden field replaced.
    #[must_use]
    pub fn apply(self, base: BehaviorProfile) -> BehaviorProfile {
        BehaviorProfile {
            autonomous: self.autonomous.unwrap_or(base.autonomous),
            speed: self.speed.unwrap_or(base.speed),
            comfort_radius: self.comfort_radius.unwrap_or(base.comfort_radius),
            personal_space: self.personal_space.unwrap_or(base.personal_space),
            arrival_threshold: self.arrival_threshold.unwrap_or(base.arrival_threshold),
            wanders: self.wanders.unwrap_or(base.wanders),
        }
    }
}

/// Snapshot of the agent that is about to act.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    /// Identifier of the agent.
    pub id: EntityId,
    /// Current world-space position.
    pub position: Vec2,
    /// Waypoint the agent is currently walking toward.
    pub goal: Option<Vec2>,
}

/// Snapshot of another entity visible to the agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Behavioural category of the entity.
    pub kind: EntityKind,
    /// Current world-space position.
    pub position: Vec2,
}

/// Outcome of one pass through the decision ladder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// The agent does nothing this tick.
    Idle,
    /// A player is too close; move by `delta` to get away from it.
    Flee {
        /// Player being avoided.
        from: EntityId,
        /// Displacement to request from the movement resolver.
        delta: Vec2,
    },
    /// Another pedestrian is too close; move by `delta` to make room.
    Disperse {
        /// Pedestrian being avoided.
        from: EntityId,
        /// Displacement to request from the movement resolver.
        delta: Vec2,
    },
    /// The agent holds no waypoint and needs the next one from its path.
    AcquireWaypoint,
    /// The agent arrived at its waypoint and should advance along the path.
    ReachedWaypoint,
    /// Walk toward the current waypoint.
    Step {
        /// Displacement to request from the movement resolver.
        delta: Vec2,
    },
}

impl Decision {
    /// Displacement the decision asks the movement resolver to apply.
    #[must_use]
    pub const fn delta(&self) -> Option<Vec2> {
        match self {
            Self::Flee { delta, .. } | Self::Disperse { delta, .. } | Self::Step { delta } => {
                Some(*delta)
            }
            Self::Idle | Self::AcquireWaypoint | Self::ReachedWaypoint => None,
        }
    }
}

/// Evaluates the decision ladder for one agent.
///
/// Rules are checked in priority order and the first match wins: flee from
/// the nearest player inside the comfort radius, step away from the nearest
/// pedestrian inside personal space, then follow the current waypoint.
/// Entries in `neighbors` carrying the agent's own identifier are skipped.
#[must_use]
pub fn decide(agent: &Agent, profile: &BehaviorProfile, neighbors: &[Neighbor]) -> Decision {
    if !profile.autonomous {
        return Decision::Idle;
    }

    if let Some(player) = nearest_within(agent, neighbors, EntityKind::Player, profile.comfort_radius)
    {
        let delta = away_from(agent.position, player.position) * profile.speed;
        trace!("{:?} flees from {:?}", agent.id, player.id);
        return Decision::Flee {
            from: player.id,
            delta,
        };
    }

    if let Some(crowd) = nearest_within(
        agent,
        neighbors,
        EntityKind::Pedestrian,
        profile.personal_space,
    ) {
        let delta = away_from(agent.position, crowd.position) * profile.speed;
        return Decision::Disperse {
            from: crowd.id,
            delta,
        };
    }

    let Some(goal) = agent.goal else {
        return Decision::AcquireWaypoint;
    };

    let offset = goal - agent.position;
    let distance = offset.length();
    if distance <= profile.arrival_threshold {
        return Decision::ReachedWaypoint;
    }

    let delta = offset / distance * profile.speed.min(distance);
    Decision::Step { delta }
}

fn nearest_within<'a>(
    agent: &Agent,
    neighbors: &'a [Neighbor],
    kind: EntityKind,
    radius: f32,
) -> Option<&'a Neighbor> {
    neighbors
        .iter()
        .filter(|neighbor| neighbor.id != agent.id && neighbor.kind == kind)
        .map(|neighbor| (neighbor, agent.position.distance(neighbor.position)))
        .filter(|(_, distance)| *distance < radius)
        .fold(None, |best: Option<(&Neighbor, f32)>, candidate| match best {
            Some((_, best_distance)) if best_distance <= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(neighbor, _)| neighbor)
}

/// Unit vector pointing from `threat` toward `position`.
///
/// Coincident positions resolve to the positive x axis so the agent still
/// moves.
fn away_from(position: Vec2, threat: Vec2) -> Vec2 {
    let direction = (position - threat).normalize_or_zero();
    if direction == Vec2::ZERO {
        Vec2::X
    } else {
        direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn agent_at(x: f32, y: f32) -> Agent {
        Agent {
            id: EntityId::new(0),
            position: Vec2::new(x, y),
            goal: None,
        }
    }

    fn neighbor(id: u32, kind: EntityKind, x: f32, y: f32) -> Neighbor {
        Neighbor {
            id: EntityId::new(id),
            kind,
            position: Vec2::new(x, y),
        }
    }

    #[rstest]
    #[case::player(EntityKind::Player)]
    #[case::prop(EntityKind::Prop)]
    fn non_autonomous_kinds_stay_idle(#[case] kind: EntityKind) {
        let mut agent = agent_at(0.0, 0.0);
        agent.goal = Some(Vec2::new(100.0, 0.0));

        let decision = decide(&agent, &BehaviorProfile::for_kind(kind), &[]);

        assert_eq!(decision, Decision::Idle);
    }

    #[test]
    fn nearby_player_takes_priority() {
        let agent = agent_at(0.0, 0.0);
        let neighbors = [
            neighbor(1, EntityKind::Pedestrian, 4.0, 0.0),
            neighbor(2, EntityKind::Player, 0.0, 10.0),
        ];

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &neighbors);

        let Decision::Flee { from, delta } = decision else {
            panic!("expected flee, got {decision:?}");
        };
        assert_eq!(from, EntityId::new(2));
        assert_relative_eq!(delta.x, 0.0);
        assert_relative_eq!(delta.y, -BehaviorProfile::pedestrian().speed);
    }

    #[test]
    fn nearest_pedestrian_is_avoided() {
        let agent = agent_at(10.0, 10.0);
        let neighbors = [
            neighbor(1, EntityKind::Pedestrian, 20.0, 10.0),
            neighbor(2, EntityKind::Pedestrian, 10.0, 4.0),
        ];

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &neighbors);

        assert!(matches!(
            decision,
            Decision::Disperse { from, .. } if from == EntityId::new(2)
        ));
    }

    #[test]
    fn props_and_distant_entities_are_ignored() {
        let mut agent = agent_at(0.0, 0.0);
        agent.goal = Some(Vec2::new(10.0, 0.0));
        let neighbors = [
            neighbor(1, EntityKind::Prop, 1.0, 0.0),
            neighbor(2, EntityKind::Player, 500.0, 0.0),
        ];

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &neighbors);

        assert_eq!(
            decision,
            Decision::Step {
                delta: Vec2::new(2.0, 0.0)
            }
        );
    }

    #[test]
    fn own_snapshot_is_skipped() {
        let agent = agent_at(0.0, 0.0);
        let neighbors = [neighbor(0, EntityKind::Pedestrian, 0.0, 0.0)];

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &neighbors);

        assert_eq!(decision, Decision::AcquireWaypoint);
    }

    #[test]
    fn coincident_threat_still_moves_agent() {
        let agent = agent_at(5.0, 5.0);
        let neighbors = [neighbor(3, EntityKind::Pedestrian, 5.0, 5.0)];

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &neighbors);

        assert_eq!(decision.delta(), Some(Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn arrival_threshold_marks_waypoint_reached() {
        let mut agent = agent_at(0.0, 0.0);
        agent.goal = Some(Vec2::new(1.5, 0.0));

        let decision = decide(&agent, &BehaviorProfile::pedestrian(), &[]);

        assert_eq!(decision, Decision::ReachedWaypoint);
    }

    #[test]
    fn final_step_does_not_overshoot() {
        let mut profile = BehaviorProfile::pedestrian();
        profile.speed = 10.0;
        let mut agent = agent_at(0.0, 0.0);
        agent.goal = Some(Vec2::new(0.0, 6.0));

        let decision = decide(&agent, &profile, &[]);

        assert_eq!(decision.delta(), Some(Vec2::new(0.0, 6.0)));
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let mut profile = BehaviorProfile::pedestrian();
        assert_eq!(profile.invalid_field(), None);

        profile.personal_space = f32::NAN;
        assert_eq!(profile.invalid_field(), Some("personal_space"));

        profile.speed = -1.0;
        assert_eq!(profile.invalid_field(), Some("speed"));
    }

    #[rstest]
    #[case::player(BehaviorProfile::player())]
    #[case::pedestrian(BehaviorProfile::pedestrian())]
    #[case::prop(BehaviorProfile::prop())]
    fn overrides_keep_the_base_profile_for_missing_fields(#[case] base: BehaviorProfile) {
        let overrides: ProfileOverrides =
            toml::from_str("speed = 3.5").expect("valid overrides");

        let profile = overrides.apply(base);

        assert_relative_eq!(profile.speed, 3.5);
        assert_eq!(profile.autonomous, base.autonomous);
        assert_eq!(profile.wanders, base.wanders);
        assert_relative_eq!(profile.comfort_radius, base.comfort_radius);
        assert_relative_eq!(profile.personal_space, base.personal_space);
        assert_relative_eq!(profile.arrival_threshold, base.arrival_threshold);
    }

    #[test]
    fn misspelled_overrides_are_rejected() {
        assert!(toml::from_str::<ProfileOverrides>("sped = 1.0").is_err());
    }

    #[test]
    fn complete_profiles_require_every_field() {
        assert!(toml::from_str::<BehaviorProfile>("speed = 3.5").is_err());
    }
}
