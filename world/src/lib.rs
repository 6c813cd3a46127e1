#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the tile-world simulation.
//!
//! The world owns the loaded level geometry and every entity. It is mutated
//! exclusively through [`apply`], which executes a [`Command`] and reports the
//! resulting [`Event`] values. Read access goes through the [`query`] module.

mod collision;
mod config;
mod level;
mod navigation;
mod walls;

use std::collections::VecDeque;

use glam::Vec2;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tileworld_core::{Command, EntityId, EntityKind, Event, Rect, TileCoord};
use tileworld_system_behavior::{decide, Agent, BehaviorProfile, Decision, Neighbor};
use tileworld_system_movement::resolve;
use tileworld_system_pathfinding::Planner;

use crate::{collision::Obstacles, level::Level};

pub use config::{ConfigError, SimulationConfig};

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    planner: Planner,
    level: Level,
    entities: Vec<Entity>,
    next_entity_id: u32,
    tick_index: u64,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an empty world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(SimulationConfig::default())
    }

    /// Creates an empty world after validating the provided configuration.
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        Self {
            planner: Planner::new(config.adjacency),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            level: Level::empty(),
            entities: Vec::new(),
            next_entity_id: 0,
            tick_index: 0,
        }
    }

    fn entity_index(&self, entity: EntityId) -> Option<usize> {
        self.entities.iter().position(|candidate| candidate.id == entity)
    }

    fn obstacles(&self) -> Obstacles<'_> {
        Obstacles::new(self.level.walls(), self.level.bounds(), &self.entities)
    }

    fn update_entity(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let entity = &self.entities[index];
        let profile = *self.config.profile(entity.kind);
        if !profile.autonomous {
            return;
        }

        let agent = Agent {
            id: entity.id,
            position: entity.position,
            goal: entity.waypoint,
        };
        let neighbors: Vec<Neighbor> = self
            .entities
            .iter()
            .filter(|other| other.id != entity.id)
            .map(|other| Neighbor {
                id: other.id,
                kind: other.kind,
                position: other.position,
            })
            .collect();

        match decide(&agent, &profile, &neighbors) {
            Decision::Idle => {}
            Decision::Flee { delta, .. } | Decision::Disperse { delta, .. } => {
                let _ = self.move_entity(index, delta, out_events);
            }
            Decision::AcquireWaypoint => self.acquire_path(index, &profile, out_events),
            Decision::ReachedWaypoint => self.advance_waypoint(index, out_events),
            Decision::Step { delta } => {
                if self.move_entity(index, delta, out_events) {
                    self.entities[index].stalled_for = 0;
                } else {
                    self.record_stall(index, out_events);
                }
            }
        }
    }

    /// Resolves `delta` for the entity at `index` and commits the result.
    /// Returns whether the entity moved.
    fn move_entity(&mut self, index: usize, delta: Vec2, out_events: &mut Vec<Event>) -> bool {
        let entity = &self.entities[index];
        let obstacles = self.obstacles();
        let resolved = resolve(delta, |candidate| {
            obstacles.valid_position(entity, entity.position + candidate)
        });
        if resolved.is_blocked() {
            return false;
        }

        let entity = &mut self.entities[index];
        let from = entity.position;
        entity.position += resolved.applied();
        out_events.push(Event::EntityMoved {
            entity: entity.id,
            from,
            to: entity.position,
            resolution: resolved.resolution(),
        });
        true
    }

    fn acquire_path(
        &mut self,
        index: usize,
        profile: &BehaviorProfile,
        out_events: &mut Vec<Event>,
    ) {
        let Some(start) = self.level.tile_of(self.entities[index].position) else {
            return;
        };

        let assigned = self.entities[index].long_term_goal;
        let goal = match assigned {
            Some(goal) => goal,
            None if profile.wanders => {
                let Some(goal) = self.wander_goal(start) else {
                    return;
                };
                let entity = &mut self.entities[index];
                entity.long_term_goal = Some(goal);
                debug!("{:?} wanders toward {goal:?}", entity.id);
                goal
            }
            None => return,
        };

        let entity_id = self.entities[index].id;
        if start == goal {
            self.entities[index].long_term_goal = None;
            out_events.push(Event::GoalReached {
                entity: entity_id,
                goal,
            });
            return;
        }

        let path = self.planner.plan(
            start,
            goal,
            self.level.grid(),
            self.level.mesh(),
            self.level.tile_size(),
        );
        let tile_size = self.level.tile_size();
        let entity = &mut self.entities[index];
        if path.is_empty() {
            entity.long_term_goal = None;
            out_events.push(Event::PathUnavailable {
                entity: entity_id,
                goal,
            });
            return;
        }

        out_events.push(Event::PathPlanned {
            entity: entity_id,
            goal,
            waypoints: path.len(),
        });
        entity.path = path.into_vec().into();
        entity.waypoint = entity
            .path
            .pop_front()
            .map(|tile| tile_size.tile_center(tile));
        entity.stalled_for = 0;
    }

    fn advance_waypoint(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let tile_size = self.level.tile_size();
        let entity = &mut self.entities[index];
        entity.stalled_for = 0;
        if let Some(next) = entity.path.pop_front() {
            entity.waypoint = Some(tile_size.tile_center(next));
            return;
        }

        entity.waypoint = None;
        if let Some(goal) = entity.long_term_goal.take() {
            debug!("{:?} reached {goal:?}", entity.id);
            out_events.push(Event::GoalReached {
                entity: entity.id,
                goal,
            });
        }
    }

    fn record_stall(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let stall_limit = self.config.stall_limit;
        let entity = &mut self.entities[index];
        entity.stalled_for = entity.stalled_for.saturating_add(1);
        if entity.stalled_for < stall_limit {
            return;
        }

        debug!(
            "{:?} blocked for {} ticks, abandoning its path",
            entity.id, entity.stalled_for
        );
        entity.clear_route();
        out_events.push(Event::PathAbandoned { entity: entity.id });
    }

    fn wander_goal(&mut self, start: TileCoord) -> Option<TileCoord> {
        let candidates: Vec<TileCoord> = self
            .level
            .grid()
            .walkable_tiles()
            .filter(|tile| *tile != start)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let choice = self.rng.gen_range(0..candidates.len());
        candidates.get(choice).copied()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated entity. Its collision bounds are always derived from the
/// current position and the fixed footprint.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) position: Vec2,
    footprint: Rect,
    long_term_goal: Option<TileCoord>,
    waypoint: Option<Vec2>,
    path: VecDeque<TileCoord>,
    stalled_for: u32,
}

impl Entity {
    pub(crate) fn new(id: EntityId, kind: EntityKind, position: Vec2, footprint: Rect) -> Self {
        Self {
            id,
            kind,
            position,
            footprint,
            long_term_goal: None,
            waypoint: None,
            path: VecDeque::new(),
            stalled_for: 0,
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.bounds_at(self.position)
    }

    pub(crate) fn bounds_at(&self, position: Vec2) -> Rect {
        self.footprint.translated(position)
    }

    fn clear_route(&mut self) {
        self.waypoint = None;
        self.path.clear();
        self.stalled_for = 0;
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => {
            world.level = Level::load(&layout, world.config.corner_margin);
            world.entities.clear();
            out_events.push(Event::LevelLoaded {
                columns: layout.columns(),
                rows: layout.rows(),
                walls: world.level.walls().len(),
                mesh_nodes: world.level.mesh().node_count(),
                mesh_edges: world.level.mesh().edge_count(),
            });
        }
        Command::SpawnEntity {
            kind,
            position,
            footprint,
        } => {
            let entity = EntityId::new(world.next_entity_id);
            world.next_entity_id = world.next_entity_id.saturating_add(1);
            world
                .entities
                .push(Entity::new(entity, kind, position, footprint));
            out_events.push(Event::EntitySpawned {
                entity,
                kind,
                position,
            });
        }
        Command::RemoveEntity { entity } => {
            if let Some(index) = world.entity_index(entity) {
                let _ = world.entities.remove(index);
                out_events.push(Event::EntityRemoved { entity });
            }
        }
        Command::AssignGoal { entity, goal } => {
            if let Some(index) = world.entity_index(entity) {
                let target = &mut world.entities[index];
                target.long_term_goal = goal;
                target.clear_route();
                debug!("{entity:?} assigned goal {goal:?}");
                out_events.push(Event::GoalAssigned { entity, goal });
            }
        }
        Command::MoveEntity { entity, delta } => {
            if let Some(index) = world.entity_index(entity) {
                let _ = world.move_entity(index, delta, out_events);
            }
        }
        Command::Tick => update_all_entities(world, out_events),
    }
}

/// Advances the clock and updates every entity once, in spawn order.
///
/// Each entity's update completes before the next one starts, so later
/// entities observe the positions committed earlier in the same tick.
pub fn update_all_entities(world: &mut World, out_events: &mut Vec<Event>) {
    world.tick_index = world.tick_index.saturating_add(1);
    out_events.push(Event::TimeAdvanced {
        tick: world.tick_index,
    });

    for index in 0..world.entities.len() {
        world.update_entity(index, out_events);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use tileworld_core::{
        EntityId, EntityKind, NavMesh, Path, Rect, TileCoord, TileSize, WalkabilityGrid,
    };

    use super::{Entity, SimulationConfig, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Pixel dimensions of a tile on the loaded level.
    #[must_use]
    pub fn tile_size(world: &World) -> TileSize {
        world.level.tile_size()
    }

    /// World-space rectangle spanned by the loaded level.
    #[must_use]
    pub fn bounds(world: &World) -> Rect {
        world.level.bounds()
    }

    /// Merged, pairwise disjoint wall rectangles.
    #[must_use]
    pub fn walls(world: &World) -> &[Rect] {
        world.level.walls()
    }

    /// Per-tile walkability of the loaded level.
    #[must_use]
    pub fn walkability(world: &World) -> &WalkabilityGrid {
        world.level.grid()
    }

    /// Navigation mesh of the loaded level, for planning and debug overlays.
    #[must_use]
    pub fn nav_mesh(world: &World) -> &NavMesh {
        world.level.mesh()
    }

    /// Plans a route between two tiles of the loaded level.
    #[must_use]
    pub fn plan_path(world: &World, start: TileCoord, goal: TileCoord) -> Path {
        world.planner.plan(
            start,
            goal,
            world.level.grid(),
            world.level.mesh(),
            world.level.tile_size(),
        )
    }

    /// Reports whether the entity stands on the map without colliding.
    ///
    /// Unknown entities are never in a valid position.
    #[must_use]
    pub fn valid_position(world: &World, entity: EntityId) -> bool {
        world
            .entity_index(entity)
            .map(|index| &world.entities[index])
            .map_or(false, |subject| {
                world.obstacles().valid_position(subject, subject.position)
            })
    }

    /// Reports whether the entity overlaps a wall or another entity.
    ///
    /// The entity's own bounds are excluded. Unknown entities never collide.
    #[must_use]
    pub fn collides(world: &World, entity: EntityId) -> bool {
        world
            .entity_index(entity)
            .map(|index| &world.entities[index])
            .map_or(false, |subject| {
                world.obstacles().collides(subject.id, subject.bounds())
            })
    }

    /// Snapshots of every entity in update order.
    #[must_use]
    pub fn entities(world: &World) -> Vec<EntitySnapshot> {
        world.entities.iter().map(snapshot).collect()
    }

    /// Snapshot of a single entity, if it exists.
    #[must_use]
    pub fn entity(world: &World, entity: EntityId) -> Option<EntitySnapshot> {
        world
            .entity_index(entity)
            .map(|index| snapshot(&world.entities[index]))
    }

    /// Immutable representation of a single entity's state.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Identifier of the entity.
        pub id: EntityId,
        /// Behavioural category of the entity.
        pub kind: EntityKind,
        /// Current world-space reference point.
        pub position: Vec2,
        /// Collision bounds derived from the position.
        pub bounds: Rect,
        /// Long-term goal tile, if any.
        pub goal: Option<TileCoord>,
        /// Waypoint currently being walked toward.
        pub waypoint: Option<Vec2>,
        /// Waypoints left after the current one.
        pub remaining_waypoints: usize,
    }

    fn snapshot(entity: &Entity) -> EntitySnapshot {
        EntitySnapshot {
            id: entity.id,
            kind: entity.kind,
            position: entity.position,
            bounds: entity.bounds(),
            goal: entity.long_term_goal,
            waypoint: entity.waypoint,
            remaining_waypoints: entity.path.len(),
        }
    }
}
