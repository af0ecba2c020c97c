// Session driver: wires a `WorldState` to its three collaborators.
//
// A `Session` owns the world plus an `InputSource`, a `Renderer` and a
// `Store` (through `Persistence`). It replaces a display-refresh callback
// with two explicit entry points any host can call:
//
// - `run_frame()`: exactly one tick. Poll input once, tick the world, hand
//   each event and then one frame to the renderer, and save if any event
//   asked for it.
// - `advance(dt)`: fixed-step pacing for real-time hosts. Wall time is
//   accumulated and converted into whole ticks at `tick_rate_hz`, at most
//   `MAX_TICKS_PER_ADVANCE` per call. Time beyond the cap is dropped so a
//   long stall does not turn into a burst of catch-up ticks.
//
// Save failures are logged and otherwise ignored: the next trigger (at the
// latest the next checkpoint) retries with fresh state.
//
// See also: `sim.rs` for the tick itself, `persist.rs` and `store.rs` for
// save/load, `render.rs` and `input.rs` for the collaborator traits.

use crate::config::GameConfig;
use crate::error::PersistError;
use crate::input::InputSource;
use crate::persist::Persistence;
use crate::render::{RenderFrame, Renderer};
use crate::sim::{TickResult, WorldState};
use crate::store::Store;
use std::time::Duration;

/// Upper bound on ticks run by a single `advance()` call.
pub const MAX_TICKS_PER_ADVANCE: u32 = 5;

// ---------------------------------------------------------------------------
// Fixed-step clock
// ---------------------------------------------------------------------------

/// Converts variable frame times into a whole number of fixed ticks.
#[derive(Clone, Debug)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_steps: u32,
}

impl FixedStep {
    pub fn new(tick_rate_hz: u32, max_steps: u32) -> Self {
        let hz = tick_rate_hz.max(1);
        Self {
            step: Duration::from_secs(1) / hz,
            accumulator: Duration::ZERO,
            max_steps,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add `dt` and return how many ticks are now due.
    pub fn accumulate(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut due = 0;
        while self.accumulator >= self.step && due < self.max_steps {
            self.accumulator -= self.step;
            due += 1;
        }
        if due == self.max_steps && self.accumulator >= self.step {
            log::debug!(
                "fixed step: dropping {:?} of backlog",
                self.accumulator
            );
            self.accumulator = Duration::ZERO;
        }
        due
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session<I, R, S> {
    world: WorldState,
    input: I,
    renderer: R,
    persistence: Persistence<S>,
    clock: FixedStep,
    frames: u64,
    saves: u64,
}

impl<I, R, S> Session<I, R, S>
where
    I: InputSource,
    R: Renderer,
    S: Store,
{
    /// Generate terrain, then replace it with the saved world if the store
    /// holds a valid one.
    pub fn start(config: GameConfig, input: I, renderer: R, store: S) -> Self {
        let mut session = Self::fresh(config, input, renderer, store);
        if let Some(snapshot) = session.persistence.load() {
            session.world.restore(&snapshot);
        }
        session
    }

    /// Generate terrain and ignore any saved world. The first save trigger
    /// overwrites it.
    pub fn fresh(config: GameConfig, input: I, renderer: R, store: S) -> Self {
        Self::with_world(WorldState::new(config), input, renderer, store)
    }

    /// Drive an existing world.
    pub fn with_world(world: WorldState, input: I, renderer: R, store: S) -> Self {
        let persistence = Persistence::new(store, world.config.persistence.store_key.clone());
        let clock = FixedStep::new(world.config.tick_rate_hz, MAX_TICKS_PER_ADVANCE);
        Self {
            world,
            input,
            renderer,
            persistence,
            clock,
            frames: 0,
            saves: 0,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    /// Frames run so far, paused ones included.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Successful saves so far.
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// One complete frame: input, tick, render, save.
    pub fn run_frame(&mut self) -> TickResult {
        let input = self.input.poll();
        let result = self.world.tick(&input);
        self.frames += 1;

        for event in &result.events {
            self.renderer.on_event(event);
        }
        let frame = RenderFrame {
            tick: self.world.tick,
            run_state: self.world.run_state,
            grid: &self.world.grid,
            pose: self.world.avatar.pose(),
            orientation: self.world.avatar.orientation(),
        };
        self.renderer.draw(&frame);

        if result.wants_save()
            && let Err(e) = self.save_now()
        {
            log::warn!("save failed at tick {}: {e}", self.world.tick);
        }
        result
    }

    /// Run as many frames as `dt` of wall time calls for. Returns the number
    /// of frames run.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let due = self.clock.accumulate(dt);
        for _ in 0..due {
            self.run_frame();
        }
        due
    }

    /// Write the current world to the store.
    pub fn save_now(&mut self) -> Result<(), PersistError> {
        let snapshot = self.world.snapshot();
        self.persistence.save(&snapshot)?;
        self.saves += 1;
        Ok(())
    }

    /// Tear down, returning the world and the store.
    pub fn into_parts(self) -> (WorldState, S) {
        (self.world, self.persistence.into_store())
    }
}
