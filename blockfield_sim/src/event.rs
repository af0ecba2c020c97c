// Narrative events a tick reports to its caller.
//
// `SimEvent`s are the output of `WorldState::tick()`, in the order things
// happened within the tick. Renderers use them to add and remove cube
// meshes; the session uses them as save triggers.
//
// See also: `sim.rs` for the tick loop that emits them, `session.rs` for
// the consumer side.

use crate::error::ActionError;
use crate::types::{BlockType, CellKey, RunState};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tick output events
// ---------------------------------------------------------------------------

/// Which player action an `ActionRejected` event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Build,
    Mine,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// A block was created by a build action. Renderers add a cube.
    BlockPlaced { key: CellKey, block_type: BlockType },
    /// A block was destroyed by a mine action. Renderers drop the cube.
    BlockRemoved { key: CellKey, block_type: BlockType },
    /// A build or mine action changed nothing.
    ActionRejected { action: ActionKind, reason: ActionError },
    SelectionChanged { block_type: BlockType },
    Jumped,
    /// The avatar fell below the floor and was returned to spawn.
    Respawned,
    RunStateChanged { state: RunState },
    /// Periodic checkpoint fired.
    Checkpoint,
}

impl SimEventKind {
    /// Whether this event should cause the session to persist state.
    pub fn triggers_save(&self) -> bool {
        matches!(
            self,
            SimEventKind::BlockPlaced { .. }
                | SimEventKind::BlockRemoved { .. }
                | SimEventKind::SelectionChanged { .. }
                | SimEventKind::Checkpoint
        )
    }
}
