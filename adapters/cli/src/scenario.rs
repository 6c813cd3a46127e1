use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use tileworld_core::{Command, EntityId, EntityKind, Event, LevelLayout, Rect, TileCoord, TileSize};
use tileworld_world::{self as world, SimulationConfig, World};

/// Scenario used when no file is supplied on the command line.
pub(crate) const DEMO_SCENARIO: &str = r#"
[config]
seed = 1024
stall_limit = 6

[level]
columns = 20
rows = 14
tile_width = 32.0
tile_height = 16.0
blocked = [
    { column = 0, row = 0, width = 20, height = 1 },
    { column = 0, row = 13, width = 20, height = 1 },
    { column = 0, row = 1, width = 1, height = 12 },
    { column = 19, row = 1, width = 1, height = 12 },
    { column = 4, row = 3, width = 6, height = 2 },
    { column = 8, row = 3, width = 2, height = 6 },
    { column = 13, row = 7, width = 4, height = 3 },
]

[[entities]]
kind = "player"
tile = { column = 2, row = 11 }

[[entities]]
kind = "pedestrian"
tile = { column = 2, row = 2 }
goal = { column = 17, row = 11 }

[[entities]]
kind = "pedestrian"
tile = { column = 11, row = 5 }

[[entities]]
kind = "pedestrian"
tile = { column = 15, row = 3 }

[[entities]]
kind = "prop"
tile = { column = 6, row = 9 }
footprint = [8.0, 4.0]
"#;

const DEFAULT_FOOTPRINT: [f32; 2] = [12.0, 6.0];

/// Complete description of a simulation run: configuration, level, and the
/// entities present when it starts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Simulation parameters.
    #[serde(default)]
    pub(crate) config: SimulationConfig,
    /// Level geometry.
    pub(crate) level: LevelSpec,
    /// Entities spawned in declaration order.
    #[serde(default)]
    pub(crate) entities: Vec<EntitySpec>,
}

/// Tile grid dimensions and blocking regions.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelSpec {
    /// Number of tile columns.
    pub(crate) columns: u32,
    /// Number of tile rows.
    pub(crate) rows: u32,
    /// Width of a tile in world pixels.
    pub(crate) tile_width: f32,
    /// Height of a tile in world pixels.
    pub(crate) tile_height: f32,
    /// Rectangular blocks of blocking tiles.
    #[serde(default)]
    pub(crate) blocked: Vec<TileBlock>,
}

/// Rectangle of blocking tiles anchored at its upper-left tile.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TileBlock {
    /// Leftmost column of the block.
    pub(crate) column: u32,
    /// Topmost row of the block.
    pub(crate) row: u32,
    /// Number of columns covered.
    #[serde(default = "one")]
    pub(crate) width: u32,
    /// Number of rows covered.
    #[serde(default = "one")]
    pub(crate) height: u32,
}

/// Entity placed on the level at start-up.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntitySpec {
    /// Behavioural category.
    pub(crate) kind: EntityKind,
    /// Tile whose centre becomes the entity's position.
    pub(crate) tile: TileCoord,
    /// Long-term goal assigned right after spawning.
    #[serde(default)]
    pub(crate) goal: Option<TileCoord>,
    /// Width and height of the collision footprint, centred on the position.
    #[serde(default)]
    pub(crate) footprint: Option<[f32; 2]>,
}

const fn one() -> u32 {
    1
}

impl Scenario {
    /// Decodes a scenario from its TOML representation.
    pub(crate) fn from_toml_str(source: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(source).context("failed to decode scenario")?;
        scenario
            .config
            .validate()
            .context("scenario configuration is invalid")?;
        Ok(scenario)
    }

    /// Built-in demonstration scenario.
    pub(crate) fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_SCENARIO)
    }

    /// Builds the level layout, deriving walls from the blocking tiles.
    pub(crate) fn layout(&self) -> Result<LevelLayout> {
        let level = &self.level;
        let tile_size = TileSize::new(level.tile_width, level.tile_height);
        let count = usize::try_from(u64::from(level.columns) * u64::from(level.rows))
            .context("level is too large")?;
        let mut blocking = vec![false; count];

        for block in &level.blocked {
            let columns = block.column..block.column.saturating_add(block.width);
            let rows = block.row..block.row.saturating_add(block.height);
            if columns.end > level.columns || rows.end > level.rows {
                bail!(
                    "blocked region at ({}, {}) extends past the {}x{} level",
                    block.column,
                    block.row,
                    level.columns,
                    level.rows
                );
            }
            for row in rows {
                for column in columns.clone() {
                    let index = row as usize * level.columns as usize + column as usize;
                    blocking[index] = true;
                }
            }
        }

        LevelLayout::from_blocking(level.columns, level.rows, tile_size, blocking)
            .context("level layout is invalid")
    }

    /// Creates a world, loads the level, and spawns every entity.
    pub(crate) fn instantiate(&self) -> Result<World> {
        let layout = self.layout()?;
        let tile_size = layout.tile_size();
        let mut world =
            World::with_config(self.config.clone()).context("scenario configuration is invalid")?;
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadLevel { layout }, &mut events);

        for spec in &self.entities {
            events.clear();
            let [width, height] = spec.footprint.unwrap_or(DEFAULT_FOOTPRINT);
            world::apply(
                &mut world,
                Command::SpawnEntity {
                    kind: spec.kind,
                    position: tile_size.tile_center(spec.tile),
                    footprint: Rect::new(
                        Vec2::new(-width / 2.0, -height / 2.0),
                        Vec2::new(width, height),
                    ),
                },
                &mut events,
            );
            let entity = spawned_entity(&events)
                .with_context(|| format!("spawning {:?} at {:?}", spec.kind, spec.tile))?;

            if spec.goal.is_some() {
                world::apply(
                    &mut world,
                    Command::AssignGoal {
                        entity,
                        goal: spec.goal,
                    },
                    &mut events,
                );
            }
        }

        Ok(world)
    }
}

fn spawned_entity(events: &[Event]) -> Result<EntityId> {
    events
        .iter()
        .find_map(|event| match event {
            Event::EntitySpawned { entity, .. } => Some(*entity),
            _ => None,
        })
        .context("world did not confirm the spawn")
}
