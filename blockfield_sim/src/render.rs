// Renderer collaborator contract.
//
// The simulation never draws. Once per tick the session hands a renderer a
// `RenderFrame` borrowing the grid and the avatar pose, plus every
// `SimEvent` the tick produced (so a retained-mode surface can add or drop
// a cube mesh instead of rebuilding its scene).
//
// See also: `session.rs` for the call order, the headless binary's
// `LogRenderer` for a concrete implementation.

use crate::avatar::AvatarPose;
use crate::event::SimEvent;
use crate::grid::VoxelGrid;
use crate::types::{Block, RunState};
use glam::Quat;

/// Everything needed to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    pub tick: u64,
    pub run_state: RunState,
    pub grid: &'a VoxelGrid,
    pub pose: AvatarPose,
    pub orientation: Quat,
}

impl<'a> RenderFrame<'a> {
    /// Blocks to draw. Order is unspecified.
    pub fn blocks(&self) -> impl Iterator<Item = &'a Block> + 'a {
        self.grid.all()
    }
}

pub trait Renderer {
    /// Called for each event before `draw()` in the same tick.
    fn on_event(&mut self, _event: &SimEvent) {}

    fn draw(&mut self, frame: &RenderFrame<'_>);
}

/// Draws nothing. For tests and benchmarks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &RenderFrame<'_>) {}
}

/// Counts calls; used by session tests.
#[derive(Clone, Debug, Default)]
pub struct CountingRenderer {
    pub frames: u64,
    pub events: Vec<SimEvent>,
    pub last_block_count: usize,
}

impl Renderer for CountingRenderer {
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }

    fn draw(&mut self, frame: &RenderFrame<'_>) {
        self.frames += 1;
        self.last_block_count = frame.blocks().count();
    }
}
