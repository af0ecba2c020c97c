// World state and the tick function.
//
// `WorldState` is the single source of truth for a running sandbox: the
// voxel grid, the avatar, the block selection, the run state, the tick
// counter and the next checkpoint tick. Nothing is ambient; every driver
// (session, test, benchmark) owns a `WorldState` and calls `tick()` with
// one polled `InputSnapshot` at a time. `tick()` is deterministic:
// `(state, input) -> (new state, events)`.
//
// ## Tick sequence
//
//   1. Pause edge: toggle `RunState` and report `RunStateChanged`. If the
//      world is now paused, stop here. The tick counter does not advance,
//      so paused time never counts toward checkpoints.
//   2. Advance the tick counter.
//   3. Block selection hotkey (1–5). Re-selecting the current type is not a
//      change.
//   4. Mine, then build, against the block under the crosshair as seen from
//      the avatar's pose at the start of the tick.
//   5. Avatar controller step (`avatar::step`): look, jump, walk, gravity,
//      collision, respawn.
//   6. Fire the periodic checkpoint if it is due, and schedule the next one
//      `checkpoint_interval_ticks` later.
//
// ## Build and mine
//
// Both actions pick with `VoxelGrid::raycast` from the avatar centre along
// the view direction, limited to `InteractionConfig::reach`. Mining removes
// the picked block unless it is indestructible. Building targets the empty
// cell on the near side of the face the ray entered through, and is
// rejected if that cell is occupied or its centre is within
// `build_clearance` of the avatar centre (which would embed the avatar in
// the new block). A rejected action changes nothing and is reported as
// `ActionRejected`.
//
// See also: `avatar.rs`, `collision.rs`, `event.rs`, `persist.rs` for the
// snapshot form, `session.rs` for the driver that owns a `WorldState`.

use crate::avatar::{self, AvatarState};
use crate::config::GameConfig;
use crate::error::ActionError;
use crate::event::{ActionKind, SimEvent, SimEventKind};
use crate::grid::{RayHit, VoxelGrid};
use crate::input::InputSnapshot;
use crate::persist::Snapshot;
use crate::terrain;
use crate::types::{Block, BlockType, CellKey, RunState};

/// The entire mutable state of one world.
#[derive(Clone, Debug)]
pub struct WorldState {
    /// Ticks simulated while running.
    pub tick: u64,

    /// Immutable after construction.
    pub config: GameConfig,

    pub run_state: RunState,

    pub grid: VoxelGrid,

    pub avatar: AvatarState,

    /// Block type placed by build actions.
    pub selection: BlockType,

    /// Tick of the next periodic checkpoint. `None` when checkpoints are
    /// disabled.
    pub next_checkpoint: Option<u64>,
}

/// Output of one `tick()`.
#[derive(Clone, Debug, Default)]
pub struct TickResult {
    /// Narrative events, in the order they happened.
    pub events: Vec<SimEvent>,
    /// False when the world was paused and the tick was skipped.
    pub advanced: bool,
}

impl TickResult {
    /// Whether any event in this tick calls for a save.
    pub fn wants_save(&self) -> bool {
        self.events.iter().any(|e| e.kind.triggers_save())
    }
}

impl WorldState {
    /// A world with generated terrain and the avatar at spawn.
    pub fn new(config: GameConfig) -> Self {
        let mut state = Self::empty(config);
        terrain::fill_grid(&mut state.grid, &state.config.terrain);
        state
    }

    /// A world with no blocks. Used by tests and before a bulk load.
    pub fn empty(config: GameConfig) -> Self {
        let avatar = AvatarState::at(config.physics.spawn_point);
        let mut state = Self {
            tick: 0,
            config,
            run_state: RunState::Running,
            grid: VoxelGrid::new(),
            avatar,
            selection: BlockType::default(),
            next_checkpoint: None,
        };
        state.schedule_checkpoint();
        state
    }

    fn schedule_checkpoint(&mut self) {
        let interval = self.config.persistence.checkpoint_interval_ticks;
        self.next_checkpoint = (interval > 0).then_some(self.tick + interval);
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    /// Advance one tick with the given input.
    pub fn tick(&mut self, input: &InputSnapshot) -> TickResult {
        let mut events = Vec::new();

        if input.pause {
            self.run_state = self.run_state.toggled();
            log::info!("run state -> {:?} at tick {}", self.run_state, self.tick);
            events.push(SimEvent {
                tick: self.tick,
                kind: SimEventKind::RunStateChanged {
                    state: self.run_state,
                },
            });
        }
        if self.is_paused() {
            return TickResult {
                events,
                advanced: false,
            };
        }

        self.tick += 1;

        if let Some(key) = input.select {
            match BlockType::from_hotkey(key) {
                Some(block_type) => {
                    if self.select(block_type) {
                        self.emit(&mut events, SimEventKind::SelectionChanged { block_type });
                    }
                }
                None => log::debug!("ignoring unmapped selection hotkey {key}"),
            }
        }

        if input.mine {
            let kind = match self.mine() {
                Ok(block) => SimEventKind::BlockRemoved {
                    key: block.key,
                    block_type: block.block_type,
                },
                Err(reason) => SimEventKind::ActionRejected {
                    action: ActionKind::Mine,
                    reason,
                },
            };
            self.emit(&mut events, kind);
        }
        if input.build {
            let kind = match self.build() {
                Ok(block) => SimEventKind::BlockPlaced {
                    key: block.key,
                    block_type: block.block_type,
                },
                Err(reason) => SimEventKind::ActionRejected {
                    action: ActionKind::Build,
                    reason,
                },
            };
            self.emit(&mut events, kind);
        }

        let outcome = avatar::step(&mut self.avatar, input, &self.grid, &self.config.physics);
        if outcome.jumped {
            self.emit(&mut events, SimEventKind::Jumped);
        }
        if outcome.respawned {
            self.emit(&mut events, SimEventKind::Respawned);
        }

        if self.next_checkpoint.is_some_and(|t| t <= self.tick) {
            self.emit(&mut events, SimEventKind::Checkpoint);
            self.schedule_checkpoint();
        }

        TickResult {
            events,
            advanced: true,
        }
    }

    fn emit(&self, events: &mut Vec<SimEvent>, kind: SimEventKind) {
        events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Change the build selection. Returns whether it changed.
    pub fn select(&mut self, block_type: BlockType) -> bool {
        if self.selection == block_type {
            return false;
        }
        log::debug!("selected {block_type}");
        self.selection = block_type;
        true
    }

    /// First block along the avatar's line of sight, within reach.
    pub fn pick(&self) -> Option<RayHit> {
        self.grid.raycast(
            self.avatar.position,
            self.avatar.view_direction(),
            self.config.interaction.reach,
        )
    }

    /// Mine the block under the crosshair.
    pub fn mine(&mut self) -> Result<Block, ActionError> {
        let hit = self.pick().ok_or(ActionError::NoTarget)?;
        self.mine_at(hit.key)
    }

    /// Remove the block at `key`.
    pub fn mine_at(&mut self, key: CellKey) -> Result<Block, ActionError> {
        let target = self.grid.get_cell(key).ok_or(ActionError::NoTarget)?;
        if target.indestructible {
            return Err(ActionError::ProtectedBlock(key));
        }
        let block = self.grid.remove_cell(key).ok_or(ActionError::NoTarget)?;
        log::debug!("mined {} at {key}", block.block_type);
        Ok(block)
    }

    /// Place the selected block against the face under the crosshair.
    pub fn build(&mut self) -> Result<Block, ActionError> {
        let hit = self.pick().ok_or(ActionError::NoTarget)?;
        let normal = hit.normal.ok_or(ActionError::NoFace(hit.key))?;
        let target = hit
            .key
            .offset(normal.x, normal.y, normal.z)
            .ok_or(ActionError::NoTarget)?;
        self.build_at(target)
    }

    /// Place the selected block at `target`.
    pub fn build_at(&mut self, target: CellKey) -> Result<Block, ActionError> {
        if self.grid.contains_cell(target) {
            return Err(ActionError::OccupiedCell(target));
        }
        let clearance = self.config.interaction.build_clearance;
        if target.center().distance(self.avatar.position) < clearance {
            return Err(ActionError::OutOfRange(target));
        }
        self.grid.insert_cell(target, self.selection, false);
        log::debug!("placed {} at {target}", self.selection);
        Ok(Block {
            key: target,
            block_type: self.selection,
            indestructible: false,
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.grid, &self.avatar, self.selection)
    }

    /// Replace the grid, avatar pose and selection with a loaded snapshot.
    /// Tick counter, run state and the checkpoint schedule are kept.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let count = self.grid.replace_all(snapshot.blocks());
        self.avatar.set_pose(snapshot.pose());
        self.selection = snapshot.selected_block;
        log::info!(
            "restored {count} blocks, avatar at {}",
            self.avatar.position
        );
    }
}
